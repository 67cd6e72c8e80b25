//! Rewrites every stored quiz through the question normalizer so older
//! records pick up the current option and answer formatting.

use anyhow::Context;
use wikiquiz_api::{config::Config, services::article_service::ArticleService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wikiquiz_api=info".into()),
        )
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    let client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let articles = ArticleService::new(&client.database(&config.mongo_database));

    let (checked, modified) = articles
        .normalize_stored_quizzes()
        .await
        .context("Normalization failed")?;

    println!(
        "Normalization complete. Articles checked: {}. Modified: {}",
        checked, modified
    );
    Ok(())
}
