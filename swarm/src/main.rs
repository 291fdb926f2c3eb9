mod cli;
mod config_file;
mod exit_codes;
mod logging;
mod output;
mod run;
mod run_error;

use clap::Parser;
use indicatif::{MultiProgress, ProgressDrawTarget};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(v) => v,
        Err(err) => {
            use clap::error::ErrorKind;
            let _ = err.print();
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    exit_codes::ExitCode::Success.as_i32()
                }
                _ => exit_codes::ExitCode::InvalidInput.as_i32(),
            };
            std::process::exit(code);
        }
    };

    // Shared by the log writer and the progress bars so log lines never tear a bar.
    let bars = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(5));

    let result = match cli.command {
        cli::Command::Run(args) => {
            logging::init(args.verbose, bars.clone());
            run::run(args, bars).await
        }
        cli::Command::Check(args) => {
            logging::init(args.verbose, bars);
            run::check(args).await
        }
    };

    let code = match result {
        Ok(code) => code.as_i32(),
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code().as_i32()
        }
    };

    std::process::exit(code);
}
