use anyhow::{Context, Result};
use phrase_admin::api::ApiClient;
use phrase_admin::cache::QueryCache;
use phrase_admin::config::Config;
use phrase_admin::format::language_label;
use phrase_admin::queries;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("list_languages=info".parse()?),
        )
        .init();

    info!("Fetching language catalog");

    let config = Config::from_env()?;
    let client = ApiClient::new(&config)?;
    let cache = Arc::new(QueryCache::new());

    let languages = queries::languages(&client, &cache)
        .load()
        .await
        .context("Failed to fetch languages")?
        .unwrap_or_default();

    for language in languages.iter() {
        println!("{}", language_label(language));
    }

    info!("✓ {} languages available", languages.len());
    Ok(())
}
