use clap::Parser;
use skysearch_cli::{run, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skysearch_cli=debug,skysearch_session=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = skysearch_client::Config::load()?;
    tracing::info!("Backend {} (timeout {} ms)", config.backend.base_url, config.backend.request_timeout_ms);

    run(cli, config).await
}
