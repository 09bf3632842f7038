use std::io::{BufReader, BufWriter, Read, Write};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::{select, sync::mpsc, task::JoinSet};

pub type Error = Box<dyn std::error::Error + Send + Sync>;

pub const CONTENT_TYPE: &str = "text/plain";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub id: String,
    pub payload: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum InvocationResponse {
    Success { body: String, content_type: String },
    Failure { message: String },
}

impl InvocationResponse {
    pub fn success(body: String) -> Self {
        Self::Success {
            body,
            content_type: CONTENT_TYPE.to_owned(),
        }
    }

    pub fn failure(message: String) -> Self {
        Self::Failure { message }
    }
}

/// Computes one Fibonacci number per invocation, ignoring the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handler {
    n: i64,
}

impl Handler {
    pub const fn new(n: i64) -> Self {
        Self { n }
    }

    pub const fn canonical() -> Self {
        Self::new(kernel::CANONICAL_N)
    }

    pub fn n(&self) -> i64 {
        self.n
    }

    pub fn handle(&self, req: &InvocationRequest) -> InvocationResponse {
        match kernel::fib(self.n) {
            Ok(value) => InvocationResponse::success(format!("fibonacci({})={value}", self.n)),
            Err(e) => {
                log::warn!("Request {} failed: {e}", req.id);
                InvocationResponse::failure(e.to_string())
            }
        }
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Reads one bincode frame. A clean end of stream yields `None`.
pub fn read_frame<T: DeserializeOwned, R: Read>(reader: &mut R) -> Result<Option<T>, Error> {
    let e = match bincode::deserialize_from(reader) {
        Ok(frame) => return Ok(Some(frame)),
        Err(e) => e,
    };
    if let bincode::ErrorKind::Io(io) = &*e {
        if io.kind() == std::io::ErrorKind::UnexpectedEof {
            return Ok(None);
        }
    }
    Err(e.into())
}

pub fn write_frame<T: Serialize, W: Write>(writer: &mut W, frame: &T) -> Result<(), Error> {
    bincode::serialize_into(&mut *writer, frame)?;
    writer.flush()?;
    Ok(())
}

/// Pulls requests one at a time and pushes exactly one response for each
/// before pulling the next. Returns once the source is closed.
pub async fn serve<F>(
    mut in_rx: mpsc::Receiver<InvocationRequest>,
    out_tx: mpsc::Sender<InvocationResponse>,
    mut handler: F,
) -> Result<(), Error>
where
    F: FnMut(InvocationRequest) -> InvocationResponse,
{
    while let Some(req) = in_rx.recv().await {
        log::debug!("Computing request {}", req.id);
        let res = handler(req);
        out_tx.send(res).await?;
        log::trace!("Responded");
    }

    Ok(())
}

/// Serves framed requests from `input` and writes framed responses to
/// `output` until `input` reaches end of stream.
pub async fn run<R, W, F>(input: R, output: W, handler: F) -> Result<(), Error>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
    F: FnMut(InvocationRequest) -> InvocationResponse + Send + 'static,
{
    let (in_tx, in_rx) = mpsc::channel(4);
    let (out_tx, mut out_rx) = mpsc::channel(4);

    let mut server = tokio::spawn(serve(in_rx, out_tx, handler));

    let mut io = JoinSet::<Result<(), Error>>::new();

    io.spawn_blocking(move || {
        let mut input = BufReader::new(input);
        while let Some(req) = read_frame(&mut input)? {
            in_tx.blocking_send(req)?;
        }
        Ok(())
    });

    io.spawn_blocking(move || {
        let mut output = BufWriter::new(output);
        while let Some(res) = out_rx.blocking_recv() {
            write_frame(&mut output, &res)?;
        }
        Ok(())
    });

    // The first failure wins: a reader blocked on open input must not keep
    // a broken output from being reported.
    let mut served = false;
    loop {
        select! {
            Some(task) = io.join_next() => task??,
            handler = &mut server, if !served => {
                served = true;
                handler??;
            }
            else => break,
        }
    }
    Ok(())
}
