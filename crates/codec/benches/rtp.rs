use bytes::Bytes;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rtsp_client_codec::{Extension, Header, Packet};

fn criterion_benchmark(c: &mut Criterion) {
    #[rustfmt::skip]
    let mut samples = [
        [
            0x80, 0x60, 0x23, 0xcc, 0x64, 0x3c, 0xa6, 0x79, 0x6b, 0x8b, 0x45, 0x67,
            0x01, 0x02, 0x03,
        ].as_slice(),
        [
            0xa0, 0x60, 0x23, 0xcc, 0x64, 0x3c, 0xa6, 0x79, 0x6b, 0x8b, 0x45, 0x67,
            0x01, 0x02, 0x03, 0x00, 0x00, 0x03,
        ].as_slice(),
        [
            0x90, 0x60, 0x07, 0xb7, 0x2c, 0x7f, 0x54, 0x5f, 0xec, 0x17, 0x7d, 0xc8,
            0xab, 0xac, 0x00, 0x03, 0xe5, 0xd3, 0x03, 0x75, 0x50, 0x1f, 0x38, 0x00,
            0x00, 0x05, 0x00, 0x00, 0x01, 0x02, 0x03,
        ].as_slice(),
    ]
    .into_iter()
    .cycle();

    let packet = Packet {
        header: Header {
            marker: true,
            payload_type: 96,
            sequence_number: 9164,
            timestamp: 1681696377,
            ssrc: 0x6b8b4567,
            csrc: vec![0x01020304, 0x05060708],
            extension: Some(Extension {
                profile: 0xabac,
                content: Bytes::from_static(&[0xe5, 0xd3, 0x03, 0x75]),
            }),
            ..Default::default()
        },
        payload: Bytes::from_static(&[0x01, 0x02, 0x03]),
        padding_bytes: 0,
    };

    let mut buffer = [0u8; 128];
    let mut rtp_criterion = c.benchmark_group("rtp");

    rtp_criterion.throughput(Throughput::Elements(1));
    rtp_criterion.bench_function("decode_all_samples", |bencher| {
        bencher.iter(|| {
            Packet::decode(samples.next().unwrap()).unwrap();
        })
    });

    rtp_criterion.bench_function("encode_packet", |bencher| {
        bencher.iter(|| {
            packet.encode_to(&mut buffer).unwrap();
        })
    });

    rtp_criterion.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
