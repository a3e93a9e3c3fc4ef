use clap::Parser;
use sketchwire::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), SketchError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchwire=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from(ServerArgs::parse());
    tracing::info!(
        bind = %config.bind_addr,
        round_secs = config.room.round_duration_secs,
        default_rounds = config.room.default_total_rounds,
        admin = config.admin_token.is_some(),
        "starting"
    );

    let server = SketchServerBuilder::from_config(config)
        .build(
            FallbackWordSource::new(StaticWordList::seeded()),
            InMemoryResultStore::new(),
            InMemoryUserDirectory::new(),
        )
        .await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            tracing::info!("received Ctrl+C");
        })
        .await
}
