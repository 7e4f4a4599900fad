//! mimir-provision - bootstrap secrets and config for a self-hosted stack.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mimir_provision::cli::output;
use mimir_provision::cli::{execute, Cli};
use mimir_provision::error::{EnvError, Error, TemplateError};

/// `DEBUG` counts as set unless empty or an explicit "off" value.
fn debug_env_enabled() -> bool {
    match std::env::var("DEBUG") {
        Ok(v) => !matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false" | "no" | "off"
        ),
        Err(_) => false,
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("MIMIR_LOG").unwrap_or_else(|_| {
        if cli.verbose || debug_env_enabled() {
            EnvFilter::new("mimir_provision=debug")
        } else {
            EnvFilter::new("mimir_provision=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli.command, cli.config) {
        let suggestion = match &e {
            Error::Template(TemplateError::NotFound(_)) => {
                Some("pass --templates DIR or --root DIR to point at your templates")
            }
            Error::Template(TemplateError::Missing { .. }) => {
                Some("restore the listed lines in the env template, or pass --allow-unresolved")
            }
            Error::Template(TemplateError::Unresolved { .. }) => {
                Some("fix the template, or pass --allow-unresolved to leave them in place")
            }
            Error::Env(EnvError::PlaceholderValues(_)) => {
                Some("run: mimir-provision generate, or export real values for those variables")
            }
            Error::Env(EnvError::MissingVariables(_)) => {
                Some("run: mimir-provision generate, or export the missing variables")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
