//! ShopLens CLI entry point.

use clap::Parser;
use shoplens_cli::{run, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "shoplens=info,tower_http=info",
        1 => "shoplens=debug,tower_http=debug",
        _ => "shoplens=trace,tower_http=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(cli.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.log_json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    run(cli).await
}
