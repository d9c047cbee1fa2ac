use std::process::ExitCode;

use rwinstall::prelude::*;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // A running install unwinds through its temp dirs and reports `Cancelled` itself
    if let Err(e) = ctrlc::set_handler(|| {
        if !INTERRUPT.request() {
            eprintln!("\n\nInstallation cancelled by user.");
            std::process::exit(1);
        }
    }) {
        error!("Unable to install Ctrl+C handler: {}", e);
    }

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    let api = GithubApi::new(&settings.github_api, settings.github_token.clone());
    let mut console = Stdio::default();

    match run(&settings, &api, &HttpDownloader, &mut console, &INTERRUPT) {
        Ok(()) => ExitCode::SUCCESS,
        Err(InstallerError::Cancelled) => {
            eprintln!("\n\nInstallation cancelled by user.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("\nError: {e}");

            let mut source = std::error::Error::source(&e);
            while let Some(s) = source {
                eprintln!("  Caused by: {s}");
                source = std::error::Error::source(s);
            }

            ExitCode::FAILURE
        }
    }
}
