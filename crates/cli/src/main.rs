//! `hyres` entry point.
//!
//! This binary is the composition root:
//!
//! 1. **Parse configuration**: `clap` arguments with `HYRES_*` env fallbacks.
//! 2. **Wire observability**: `tracing-subscriber` with an `EnvFilter`, a
//!    human or JSON formatter, and an OpenTelemetry OTLP layer when
//!    `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//! 3. **Construct infrastructure**: the reqwest [`HttpTransport`] and the
//!    built-in format registry, injected into a [`hypermedia::Client`].
//! 4. **Traverse**: fetch the root, follow each `--follow` step, and print
//!    the final resource as JSON on stdout.

mod args;
mod telemetry;
mod traverse;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing::error;

use http_transport::HttpTransport;
use hypermedia::Client;

use crate::args::Args;
use crate::telemetry::TelemetryConfig;
use crate::traverse::{exit_code, traverse, Summary};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    if let Err(e) = telemetry::init(&TelemetryConfig::from_env(args.log_format)) {
        eprintln!("hyres: OpenTelemetry export disabled: {e:#}");
    }

    let code = run(&args).await;
    telemetry::shutdown();
    code
}

async fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let formats = args
        .format_config()
        .context("invalid --accept-extra mapping")?;
    let transport =
        HttpTransport::new(args.transport_config()).context("failed to build HTTP transport")?;
    let client = Client::new(Arc::new(transport), formats.extensions());

    match traverse(&client, &args.url, &args.follow, &args.template_params()).await {
        Ok(resource) => {
            let summary = Summary::of(&resource);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "traversal failed");
            eprintln!("hyres: {e}");
            Ok(ExitCode::from(exit_code(&e)))
        }
    }
}
