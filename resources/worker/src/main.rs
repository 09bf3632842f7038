use std::env;

use worker::{Error, Handler};

const DEFAULT_N: i64 = kernel::CANONICAL_N;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    env_logger::init();

    let n = match env::var("BENCHMARK_N") {
        Ok(n) => n
            .parse::<i64>()
            .map_err(|e| format!("invalid BENCHMARK_N {n:?}: {e}"))?,
        Err(_) => DEFAULT_N,
    };
    let handler = Handler::new(n);

    log::info!("Serving fibonacci({n})...");

    let served = worker::run(std::io::stdin(), std::io::stdout(), move |req| {
        handler.handle(&req)
    })
    .await;
    if let Err(e) = served {
        // The stdin reader may still be blocked; exit without waiting on it.
        log::error!("Worker failed: {e}");
        std::process::exit(1);
    }

    log::info!("Input closed, stopping");

    Ok(())
}
