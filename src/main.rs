use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use iniweave::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let action = cli.command.into_action();
    match iniweave::handle(&action) {
        Ok(result) => {
            println!("{result}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            if let iniweave::WeaveError::UnknownConfigKeys(keys) = &e {
                for key in keys {
                    eprintln!("  {key}");
                }
            }
            ExitCode::FAILURE
        }
    }
}
