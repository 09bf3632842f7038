use std::process::Stdio;

use tokio::{
    io::{AsyncRead, AsyncWrite, BufReader},
    process::Command,
    sync::oneshot,
    task::JoinSet,
};
use tokio_util::io::SyncIoBridge;
use worker::{InvocationRequest, InvocationResponse, read_frame, write_frame};

use crate::Error;

pub async fn invoke_process(
    worker_path: &str,
    requests: Vec<InvocationRequest>,
) -> Result<Vec<InvocationResponse>, Error> {
    let mut child = Command::new(worker_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()?;

    let stdin = child.stdin.take().ok_or("worker stdin unavailable")?;
    let stdout = child.stdout.take().ok_or("worker stdout unavailable")?;

    let responses = invoke(stdin, stdout, requests).await?;

    let status = child.wait().await?;
    if !status.success() {
        return Err(format!("worker exited with {status}").into());
    }
    Ok(responses)
}

/// Delivers `requests` over `input` and collects one response per request
/// from `output`. `input` is shut down once every request is written.
pub async fn invoke<W, R>(
    input: W,
    output: R,
    requests: Vec<InvocationRequest>,
) -> Result<Vec<InvocationResponse>, Error>
where
    W: AsyncWrite + Unpin + Send + 'static,
    R: AsyncRead + Unpin + Send + 'static,
{
    let expected = requests.len();

    let mut io = JoinSet::<Result<(), Error>>::new();
    let (tx, rx) = oneshot::channel();

    io.spawn_blocking(move || {
        let mut input = SyncIoBridge::new(input);
        for req in &requests {
            log::debug!("Sending request {}", req.id);
            write_frame(&mut input, req)?;
        }
        input.shutdown()?;
        Ok(())
    });
    io.spawn_blocking(move || {
        let mut output = SyncIoBridge::new(BufReader::new(output));
        let mut responses: Vec<InvocationResponse> = Vec::with_capacity(expected);
        while responses.len() < expected {
            match read_frame(&mut output)? {
                Some(res) => responses.push(res),
                None => break,
            }
        }
        tx.send(responses)
            .map_err(|_| "response receiver dropped")?;
        Ok(())
    });

    while let Some(task) = io.join_next().await {
        task??;
    }

    let responses = rx.await?;
    if responses.len() != expected {
        return Err(format!(
            "worker answered {} of {expected} requests",
            responses.len()
        )
        .into());
    }
    Ok(responses)
}
