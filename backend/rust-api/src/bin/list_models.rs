//! Prints the Gemini models visible to the configured API key.

use anyhow::{bail, Context};
use wikiquiz_api::{config::Config, services::llm::GeminiProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wikiquiz_api=warn".into()),
        )
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    if config.llm.api_key.is_none() {
        bail!("GOOGLE_API_KEY is not set");
    }

    let provider = GeminiProvider::new(&config.llm)?;
    let models = provider
        .list_models()
        .await
        .context("Failed to list models")?;

    println!("Available models:");
    for model in models {
        println!("- {}", model.name);
    }
    Ok(())
}
