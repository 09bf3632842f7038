use std::{hint::black_box, process::ExitCode};

fn main() -> ExitCode {
    env_logger::init();

    // Computed and discarded; timing is taken around the whole process.
    match kernel::fib(black_box(kernel::CANONICAL_N)) {
        Ok(result) => {
            black_box(result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("fibonacci({}) failed: {e}", kernel::CANONICAL_N);
            ExitCode::FAILURE
        }
    }
}
