use std::sync::Arc;

use linkdeck::{
    ClientConfig, EndpointMemory, HttpLinkRepository, LinkListState, NotificationCenter,
    SystemClipboard,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the variables may come from the environment.
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linkdeck=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ClientConfig::from_env()?;
    tracing::info!("API base URL: {}", config.api_base_url);
    if let Some(base) = &config.short_base_url {
        tracing::info!("Short link base: {}", base);
    }

    // One endpoint memory per process; nothing outlives it.
    let repository = HttpLinkRepository::new(&config, EndpointMemory::new())?;
    let state = LinkListState::new(
        Arc::new(repository),
        Arc::new(SystemClipboard::new()),
        NotificationCenter::new(),
    );

    state.refresh().await?;

    let view = state.snapshot();
    tracing::info!("{} short link(s)", view.links.len());
    for link in view.links.iter() {
        match link.clicks {
            Some(clicks) => tracing::info!(
                "{} -> {} ({} clicks)",
                link.short_url,
                link.original_url,
                clicks
            ),
            None => tracing::info!("{} -> {}", link.short_url, link.original_url),
        }
    }

    Ok(())
}
