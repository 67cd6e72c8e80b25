use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    extractors::AppJson,
    models::{
        article::{GenerateQuery, HistoryQuery},
        quiz::{EvaluateQuizRequest, EvaluateSelectionsRequest},
    },
    services::{
        error::QuizResult,
        quiz_service::{evaluate_quiz, QuizService},
        AppState,
    },
};

/// POST /api/quiz/generate?url=...
pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GenerateQuery>,
) -> QuizResult<impl IntoResponse> {
    let response = QuizService::new(&state).generate(&query.url).await?;
    Ok(Json(response))
}

/// GET /api/quiz/history
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> QuizResult<impl IntoResponse> {
    let history = QuizService::new(&state).history(query).await?;
    Ok(Json(history))
}

/// GET /api/quiz/history/{id}
pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> QuizResult<impl IntoResponse> {
    let quiz = QuizService::new(&state).get(&id).await?;
    Ok(Json(quiz))
}

/// DELETE /api/quiz/history/{id}
pub async fn delete_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> QuizResult<impl IntoResponse> {
    QuizService::new(&state).delete(&id).await?;
    Ok(Json(json!({ "message": "Quiz deleted successfully" })))
}

/// POST /api/quiz/evaluate
pub async fn evaluate(AppJson(req): AppJson<EvaluateQuizRequest>) -> impl IntoResponse {
    Json(evaluate_quiz(req.quiz, &req.selections, "inline"))
}

/// POST /api/quiz/history/{id}/evaluate
pub async fn evaluate_stored(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<EvaluateSelectionsRequest>,
) -> QuizResult<impl IntoResponse> {
    let result = QuizService::new(&state)
        .evaluate_stored(&id, &req.selections)
        .await?;
    Ok(Json(result))
}
