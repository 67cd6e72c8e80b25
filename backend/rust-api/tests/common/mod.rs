use axum::Router;
use std::sync::Arc;
use wikiquiz_api::{
    config::Config,
    create_router,
    services::{llm::MockProvider, quiz_cache::QuizCache, AppState},
};

/// Router backed by a lazily connecting Mongo client, no Redis and a
/// scripted model. Only routes that fail before touching storage are
/// exercised against it.
pub async fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config::default();

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to build test MongoDB client");

    let provider = Arc::new(MockProvider::with_fixed_response("{}"));
    let app_state = Arc::new(
        AppState::with_parts(config, mongo_client, QuizCache::disabled(), provider)
            .expect("Failed to initialize test app state"),
    );

    create_router(app_state)
}
