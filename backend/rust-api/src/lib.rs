use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod evaluation;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let metrics_route = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .route_layer(middleware::from_fn(handlers::metrics_auth_middleware));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .merge(metrics_route)
        .nest("/api/quiz", quiz_routes())
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn quiz_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate", post(handlers::quiz::generate_quiz))
        .route("/evaluate", post(handlers::quiz::evaluate))
        .route("/history", get(handlers::quiz::get_history))
        .route(
            "/history/{id}",
            get(handlers::quiz::get_quiz).delete(handlers::quiz::delete_quiz),
        )
        .route(
            "/history/{id}/evaluate",
            post(handlers::quiz::evaluate_stored),
        )
}
