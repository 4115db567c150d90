//! Thin binary entrypoint: parse arguments, stand up logging, dispatch to
//! the matching `commands::*` handler, and print any error as the
//! `{kind, message, suggestions}` envelope every caller of this tool can
//! rely on.

use std::process::ExitCode;

use astdb::commands;
use astdb::Cli;
use astdb_infrastructure::{init_logging, LogFormat, LoggingConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_format = if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    };
    let _guard = init_logging(&LoggingConfig {
        default_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        format: log_format,
        log_dir: None,
    });

    match commands::dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!(
                "{}",
                serde_json::json!({
                    "kind": err.kind.as_str(),
                    "message": err.message,
                    "suggestions": err.suggestions,
                })
            );
            ExitCode::FAILURE
        }
    }
}
