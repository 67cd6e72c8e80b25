use std::sync::Arc;

use crate::config::Config;
use mongodb::{Client as MongoClient, Database};

pub mod article_service;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod quiz_cache;
pub mod quiz_generator;
pub mod quiz_service;
pub mod scraper;

use article_service::ArticleService;
use llm::{GeminiProvider, LlmProvider};
use quiz_cache::QuizCache;
use quiz_generator::QuizGenerator;
use scraper::WikiScraper;

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
    pub articles: ArticleService,
    pub cache: QuizCache,
    pub generator: QuizGenerator,
    pub scraper: WikiScraper,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        tracing::info!("Attempting to connect to Redis...");
        let cache = QuizCache::connect(config.redis_uri.as_deref(), config.cache_ttl_secs).await;

        let provider = GeminiProvider::new(&config.llm)?;
        tracing::info!("Using model {} for quiz generation", provider.model());

        Self::with_parts(config, mongo_client, cache, Arc::new(provider))
    }

    /// Wires the state from already-built dependencies. Tests use this with
    /// a disabled cache and a scripted provider.
    pub fn with_parts(
        config: Config,
        mongo_client: MongoClient,
        cache: QuizCache,
        provider: Arc<dyn LlmProvider>,
    ) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);
        let articles = ArticleService::new(&mongo);
        let generator = QuizGenerator::new(provider, config.quiz_num_questions);
        let scraper = WikiScraper::new(config.scraper_timeout_secs)?;

        Ok(Self {
            config,
            mongo,
            articles,
            cache,
            generator,
            scraper,
        })
    }
}
