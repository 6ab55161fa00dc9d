mod cli;
mod core;

use crate::cli::{CommandLineInterface, Context};
use crate::core::client::{self, Client};
use crate::core::config::Settings;
use crate::core::reconciler::Reconciler;
use clap::Parser;
use std::process;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn logger_setup() {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    // disable all events from the HTTP stack
    for directive in ["h2=off", "hyper=off"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Diagnostic printed when an operation fails.
///
/// Only the outermost message is rendered: client errors already carry
/// their cause in their own text.
fn failure_report(operation: &str, error: &anyhow::Error) -> String {
    let mut report = format!("Error during {}: {}", operation, error);
    if let Some(error) = error.downcast_ref::<client::Error>() {
        debug!(status = ?error.status(), "Operation failed");
        if let Some(body) = error.response_body() {
            report.push_str(&format!("\nResponse Error: {}", body));
        }
    }
    report
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logger_setup();
    let cli = CommandLineInterface::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    // No request can succeed without the certificate
    if !settings.credentials.certificate_exists() {
        eprintln!(
            "Error: Certificate file not found at {}",
            settings.credentials.certificate.display()
        );
        process::exit(1);
    }

    let operation = cli.command.name();
    debug!(operation, workload = %settings.workload.name, "Running operation");

    let result = match Client::init(&settings.credentials) {
        Ok(client) => {
            let context = Context {
                settings,
                reconciler: Reconciler::new(client),
            };
            cli.command.as_handler().handler(&context).await
        }
        Err(e) => Err(e.into()),
    };

    if let Err(error) = result {
        eprintln!("{}", failure_report(operation, &error));
        process::exit(1);
    }
}
