use std::sync::{Arc, OnceLock};

use ahash::{HashMap, HashMapExt};
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt, WriteHalf, split},
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};

use crate::{
    Error,
    interleaved::{INTERLEAVED_MAGIC, InterleavedHeader},
    message::{Request, Response},
    reader::MessageReader,
};

/// Session tuning knobs.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Capacity of the queue between the connection reader and the
    /// event loop.  The reader stalls once the queue is full.
    pub inbound_capacity: usize,
    /// Capacity of the delivery channel towards the application.  An
    /// application that does not drain [`IncomingItems`] will
    /// eventually stall the reader.
    pub incoming_capacity: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            inbound_capacity: 32,
            incoming_capacity: 32,
        }
    }
}

/// An unsolicited item pushed by the server.
///
/// The stream of items ends with exactly one [`Incoming::Error`]; after
/// it nothing more is delivered.
#[derive(Debug)]
pub enum Incoming {
    /// An interleaved RTP packet (even channel).
    Rtp { channel: u8, packet: Bytes },
    /// An interleaved RTCP packet (odd channel).
    Rtcp { channel: u8, packet: Bytes },
    /// A server-initiated RTSP request.
    Request(Request),
    /// The error that terminated the session.
    Error(Error),
}

/// The application side of the delivery channel.
pub struct IncomingItems {
    receiver: mpsc::Receiver<Incoming>,
}

impl IncomingItems {
    /// The next unsolicited item, or `None` once the terminating error
    /// has been consumed.
    pub async fn recv(&mut self) -> Option<Incoming> {
        self.receiver.recv().await
    }
}

/// One frame decoded off the connection.
enum Frame {
    Response(Response),
    Rtp { channel: u8, packet: Bytes },
    Rtcp { channel: u8, packet: Bytes },
    Request(Request),
    Error(Error),
}

struct Submission {
    request: Request,
    reply: oneshot::Sender<Result<Response, Error>>,
}

struct SessionState {
    submissions: mpsc::Sender<Submission>,
    cancel: Arc<watch::Sender<bool>>,
    terminal: Arc<OnceLock<Error>>,
    workers: Mutex<Option<(JoinHandle<()>, JoinHandle<()>)>>,
}

/// A low-level RTSP session over one control connection.
///
/// The session owns the connection and runs two workers: a reader that
/// classifies and decodes inbound frames, and an event loop that stamps
/// outbound requests with monotonic `Cseq` numbers and correlates
/// responses back to their callers.  Unsolicited traffic (interleaved
/// packets and server-initiated requests) is handed to the application
/// through [`IncomingItems`].
///
/// Cloning the session is cheap and lets any number of tasks submit
/// requests concurrently; each caller gets its own response.
#[derive(Clone)]
pub struct Session {
    state: Arc<SessionState>,
}

impl Session {
    pub fn new<S>(stream: S) -> (Self, IncomingItems)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::with_options(stream, SessionOptions::default())
    }

    pub fn with_options<S>(stream: S, options: SessionOptions) -> (Self, IncomingItems)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = split(stream);
        let (frame_tx, frame_rx) = mpsc::channel(options.inbound_capacity);
        let (incoming_tx, incoming_rx) = mpsc::channel(options.incoming_capacity);
        let (submit_tx, submit_rx) = mpsc::channel(1);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let cancel = Arc::new(cancel_tx);
        let terminal = Arc::new(OnceLock::new());

        // The reader needs nothing but the read half, its queue and the
        // cancellation signal.
        let reader = tokio::spawn(read_frames(
            MessageReader::new(read_half),
            frame_tx,
            cancel.subscribe(),
        ));

        let events = tokio::spawn(process_events(EventWorker {
            writer: write_half,
            frames: frame_rx,
            submissions: submit_rx,
            cancelled: cancel_rx,
            incoming: incoming_tx,
            cancel: cancel.clone(),
            terminal: terminal.clone(),
            pending: HashMap::new(),
            seq: 0,
        }));

        (
            Self {
                state: Arc::new(SessionState {
                    submissions: submit_tx,
                    cancel,
                    terminal,
                    workers: Mutex::new(Some((reader, events))),
                }),
            },
            IncomingItems {
                receiver: incoming_rx,
            },
        )
    }

    /// Performs a request and waits for the matching response.
    ///
    /// The engine stamps the `Cseq` header, serializes the request and
    /// parks the caller until the correlated response arrives, the
    /// session terminates, or it is closed.
    pub async fn request(&self, request: Request) -> Result<Response, Error> {
        let (reply, response) = oneshot::channel();
        if self
            .state
            .submissions
            .send(Submission { request, reply })
            .await
            .is_err()
        {
            return Err(self.terminal_error());
        }

        match response.await {
            Ok(result) => result,
            Err(_) => Err(self.terminal_error()),
        }
    }

    /// Cancels the session and waits for both workers to finish.  Safe
    /// to call more than once.
    pub async fn close(&self) {
        let _ = self.state.cancel.send(true);

        let workers = self.state.workers.lock().take();
        if let Some((reader, events)) = workers {
            let _ = events.await;
            let _ = reader.await;
        }
    }

    fn terminal_error(&self) -> Error {
        self.state
            .terminal
            .get()
            .cloned()
            .unwrap_or(Error::Cancelled)
    }
}

/// Reads frames until the first error, pushing each onto the inbound
/// queue.  The queue is bounded, so a busy event loop exerts
/// back-pressure right down to the socket.
async fn read_frames<R>(
    mut reader: MessageReader<R>,
    frames: mpsc::Sender<Frame>,
    mut cancelled: watch::Receiver<bool>,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let frame = tokio::select! {
            frame = read_frame(&mut reader) => frame,
            _ = cancelled.changed() => return,
        };

        match frame {
            Ok(frame) => {
                if frames.send(frame).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                let _ = frames.send(Frame::Error(err)).await;
                return;
            }
        }
    }
}

/// Classifies the next frame by its first bytes: the interleaved magic
/// opens a binary frame, `RTSP` opens a response, any other uppercase
/// letter opens a server-initiated request.  Everything else means the
/// stream is beyond recovery.
async fn read_frame<R>(reader: &mut MessageReader<R>) -> Result<Frame, Error>
where
    R: AsyncRead + Unpin,
{
    let peeked = reader.peek(4).await?;
    let head = [peeked[0], peeked[1], peeked[2], peeked[3]];

    match head {
        [INTERLEAVED_MAGIC, ..] => {
            let header = InterleavedHeader::read(reader).await?;
            let packet = reader.read_exact(header.length as usize).await?;
            log::trace!(
                "interleaved frame: channel={}, size={}",
                header.channel,
                packet.len()
            );

            Ok(if header.is_rtp() {
                Frame::Rtp {
                    channel: header.channel,
                    packet,
                }
            } else {
                Frame::Rtcp {
                    channel: header.channel,
                    packet,
                }
            })
        }
        [b'R', b'T', b'S', b'P'] => Ok(Frame::Response(Response::read(reader).await?)),
        [b'A'..=b'Z', ..] => Ok(Frame::Request(Request::read(reader).await?)),
        [byte, ..] => Err(Error::UnrecognizedFrame(byte)),
    }
}

struct EventWorker<S> {
    writer: WriteHalf<S>,
    frames: mpsc::Receiver<Frame>,
    submissions: mpsc::Receiver<Submission>,
    cancelled: watch::Receiver<bool>,
    incoming: mpsc::Sender<Incoming>,
    cancel: Arc<watch::Sender<bool>>,
    terminal: Arc<OnceLock<Error>>,
    pending: HashMap<u64, oneshot::Sender<Result<Response, Error>>>,
    seq: u64,
}

async fn process_events<S>(mut worker: EventWorker<S>)
where
    S: AsyncWrite,
{
    let error = worker.run().await;
    worker.shutdown(error).await;
}

impl<S> EventWorker<S>
where
    S: AsyncWrite,
{
    async fn run(&mut self) -> Error {
        loop {
            tokio::select! {
                frame = self.frames.recv() => {
                    let Some(frame) = frame else {
                        break Error::Cancelled;
                    };

                    if let Err(err) = self.dispatch(frame).await {
                        break err;
                    }
                }
                submission = self.submissions.recv() => {
                    // All session handles are gone, nobody can submit
                    // or close anymore.
                    let Some(submission) = submission else {
                        break Error::Cancelled;
                    };

                    if let Err(err) = self.submit(submission).await {
                        break err;
                    }
                }
                _ = self.cancelled.changed() => break Error::Cancelled,
            }
        }
    }

    async fn submit(&mut self, submission: Submission) -> Result<(), Error> {
        self.seq += 1;

        let Submission { mut request, reply } = submission;
        request.headers.set("Cseq", self.seq.to_string());

        // A request that cannot be serialized concerns only its
        // submitter, the connection is still in a known state.
        let bytes = match request.encode() {
            Ok(bytes) => bytes,
            Err(err) => {
                let _ = reply.send(Err(err));
                return Ok(());
            }
        };

        log::trace!("request sent: cseq={}, method={}", self.seq, request.method);
        if let Err(err) = self.writer.write_all(&bytes).await {
            let err = Error::write(err);
            let _ = reply.send(Err(err.clone()));
            return Err(err);
        }

        self.pending.insert(self.seq, reply);
        Ok(())
    }

    async fn dispatch(&mut self, frame: Frame) -> Result<(), Error> {
        match frame {
            Frame::Response(response) => {
                let seq = response.cseq()?;
                let Some(reply) = self.pending.remove(&seq) else {
                    return Err(Error::UnknownCseq(seq));
                };

                log::trace!("response received: cseq={}", seq);
                let _ = reply.send(Ok(response));
                Ok(())
            }
            Frame::Rtp { channel, packet } => {
                self.deliver(Incoming::Rtp { channel, packet }).await
            }
            Frame::Rtcp { channel, packet } => {
                self.deliver(Incoming::Rtcp { channel, packet }).await
            }
            Frame::Request(request) => self.deliver(Incoming::Request(request)).await,
            Frame::Error(err) => Err(err),
        }
    }

    async fn deliver(&mut self, item: Incoming) -> Result<(), Error> {
        // A dropped receiver only means the application stopped
        // listening; the session itself stays healthy.
        let _ = self.incoming.send(item).await;
        Ok(())
    }

    async fn shutdown(mut self, error: Error) {
        log::debug!("session terminated: {}", error);

        let _ = self.terminal.set(error.clone());

        // Unblock the reader, whatever it is waiting on.
        let _ = self.cancel.send(true);

        let _ = self.incoming.send(Incoming::Error(error.clone())).await;
        let _ = self.writer.shutdown().await;

        // Submissions that raced with the shutdown still get an answer.
        self.submissions.close();
        while let Ok(submission) = self.submissions.try_recv() {
            let _ = submission.reply.send(Err(error.clone()));
        }

        for (_, reply) in self.pending.drain() {
            let _ = reply.send(Err(error.clone()));
        }
    }
}
