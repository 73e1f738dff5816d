use std::process::ExitCode;

use chirp_common::observability::{LogConfig, init_logging};
use clap::Parser;
use cli::Args;

mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(LogConfig::for_cli(args.verbose, args.log_json)) {
        eprintln!("warning: logging disabled: {e:#}");
    }

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            cli::report(&e, &mut std::io::stdout(), &mut std::io::stderr());
            tracing::error!(error = %format!("{e:#}"), "chirp.failed");
            ExitCode::FAILURE
        }
    }
}
