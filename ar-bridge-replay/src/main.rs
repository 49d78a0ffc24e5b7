//! # AR Bridge Replay
//!
//! Replays a recorded AR session and prints what the adaptation layer did.

use ar_bridge_replay::{run_replay, CliArgs, ReplayOptions, Trace};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ar_bridge_replay=debug,ar_bridge_core=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    // JSON logs for CI pipelines (RUST_LOG_FORMAT=json)
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    tracing::info!("Replaying {}", args.trace.display());

    let trace = Trace::load(&args.trace)?;
    let options = ReplayOptions::from(&args);
    let report = run_replay(trace, &options).await?;

    match &args.report {
        Some(path) => report.write_to(path)?,
        None => println!("{}", report.to_json()?),
    }

    if let Some(kind) = report.init_error {
        tracing::warn!("Session did not start: {}", kind);
    }
    Ok(())
}
