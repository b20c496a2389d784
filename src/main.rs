//! `cert-forge` binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cert_forge::cli::parse_cli();

    // RUST_LOG wins over --log-level. Logs go to stderr so `analyze` output stays pipeable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    cert_forge::cli::run_with_cli(cli).await
}
