use std::process::ExitCode;

use colored::Colorize;
use json_bindgen::cli::CommandLineInterface;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "JSON_BINDGEN_LOG";

/// `JSON_BINDGEN_LOG` wins; otherwise the `-v` / `-q` level.
fn init_tracing(fallback: &str) {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| fallback.to_string());
    let filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();
}

fn main() -> ExitCode {
    let command_line_interface = CommandLineInterface::load();
    init_tracing(command_line_interface.log_filter());
    match command_line_interface.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
