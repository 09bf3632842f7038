use std::env;

use worker::{InvocationRequest, InvocationResponse};

mod invoker;

type Error = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_WORKER_PATH: &str = "worker";
const DEFAULT_INVOCATIONS: usize = 1;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let worker_path = env::var("WORKER_PATH").unwrap_or_else(|_| DEFAULT_WORKER_PATH.into());
    let invocations = match env::var("INVOCATIONS") {
        Ok(count) => count
            .parse::<usize>()
            .map_err(|e| format!("invalid INVOCATIONS {count:?}: {e}"))?,
        Err(_) => DEFAULT_INVOCATIONS,
    };

    let requests = (0..invocations)
        .map(|i| InvocationRequest {
            id: format!("invocation-{i}"),
            payload: Vec::new(),
        })
        .collect();

    log::info!("Invoking {worker_path} {invocations} time(s)...");

    let responses = invoker::invoke_process(&worker_path, requests).await?;

    for (i, res) in responses.into_iter().enumerate() {
        match res {
            InvocationResponse::Success { body, content_type } => {
                log::debug!("invocation-{i}: {content_type}");
                println!("{body}");
            }
            InvocationResponse::Failure { message } => {
                log::warn!("invocation-{i} failed: {message}");
            }
        }
    }

    log::info!("Worker stopped");

    Ok(())
}
