use std::time::Instant;

use chrono::Utc;
use validator::Validate;

use crate::evaluation::{self, QuizSession};
use crate::metrics;
use crate::models::article::{HistoryQuery, QuizGenerationResponse, WikiArticle};
use crate::models::quiz::{EvaluationResponse, Quiz, Selections};
use crate::services::error::{QuizError, QuizResult};
use crate::services::scraper::validate_url;
use crate::services::AppState;

pub struct QuizService<'a> {
    state: &'a AppState,
}

impl<'a> QuizService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Serves a quiz for `url`: from the cache, from a stored article, or
    /// by scraping and generating a new one.
    pub async fn generate(&self, url: &str) -> QuizResult<QuizGenerationResponse> {
        let url = url.trim();
        if !validate_url(url) {
            return Err(QuizError::InvalidUrl);
        }

        if let Some(mut cached) = self.state.cache.get(url).await {
            tracing::info!("Serving cached quiz for {}", url);
            cached.is_cached = 1;
            metrics::record_quiz_generated("cache");
            return Ok(cached);
        }

        let existing = self.state.articles.get_by_url(url).await?;
        if let Some(article) = existing.as_ref().filter(|a| a.has_questions()) {
            tracing::info!("Serving stored quiz for {}", url);
            let mut response = QuizGenerationResponse::from(article.clone());
            response.is_cached = 1;
            self.state.cache.put(url, &response).await;
            metrics::record_quiz_generated("stored");
            return Ok(response);
        }

        let start = Instant::now();
        let content = self.state.scraper.fetch_article(url).await?;
        let generation_text = content.generation_text();

        let generated = self
            .state
            .generator
            .generate_quiz(
                &content.title,
                &content.summary,
                &content.sections,
                &generation_text,
            )
            .await;
        let related_topics = self
            .state
            .generator
            .generate_related_topics(&content.title, &content.summary, &content.sections)
            .await;
        let generation_time = start.elapsed().as_secs_f64();

        let quiz_questions = serde_json::to_value(&generated.questions)
            .map_err(|e| QuizError::Internal(e.into()))?;

        let now = Utc::now();
        let article = WikiArticle {
            id: None,
            url: url.to_string(),
            title: content.title,
            summary: Some(content.summary),
            raw_html: Some(content.raw_html),
            key_entities: Some(content.key_entities),
            sections: Some(content.sections),
            quiz_questions: Some(quiz_questions),
            related_topics: Some(related_topics),
            created_at: now,
            updated_at: now,
            generation_time: Some(generation_time),
            is_cached: 0,
        };

        let saved = match existing.and_then(|a| a.id) {
            Some(id) => self
                .state
                .articles
                .update_generated(id, &article)
                .await?
                .ok_or(QuizError::NotFound)?,
            None => self.state.articles.create(article).await?,
        };

        tracing::info!(
            "Generated quiz for {} in {:.2}s (source: {})",
            url,
            generation_time,
            generated.source.as_str()
        );
        metrics::record_quiz_generated(generated.source.as_str());

        let response = QuizGenerationResponse::from(saved);
        self.state.cache.put(url, &response).await;
        Ok(response)
    }

    pub async fn history(&self, query: HistoryQuery) -> QuizResult<Vec<QuizGenerationResponse>> {
        query
            .validate()
            .map_err(|e| QuizError::Validation(format!("Validation error: {}", e)))?;

        let articles = self.state.articles.list(query.skip, query.limit).await?;
        Ok(articles.into_iter().map(QuizGenerationResponse::from).collect())
    }

    pub async fn get(&self, id: &str) -> QuizResult<QuizGenerationResponse> {
        self.state
            .articles
            .get_by_id(id)
            .await?
            .map(QuizGenerationResponse::from)
            .ok_or(QuizError::NotFound)
    }

    pub async fn delete(&self, id: &str) -> QuizResult<()> {
        let article = self
            .state
            .articles
            .get_by_id(id)
            .await?
            .ok_or(QuizError::NotFound)?;

        if !self.state.articles.delete(id).await? {
            return Err(QuizError::NotFound);
        }

        self.state.cache.invalidate(&article.url).await;
        tracing::info!("Deleted quiz {} ({})", id, article.url);
        Ok(())
    }

    /// Scores selections against a stored quiz.
    pub async fn evaluate_stored(
        &self,
        id: &str,
        selections: &Selections,
    ) -> QuizResult<EvaluationResponse> {
        let stored = self.get(id).await?;
        Ok(evaluate_quiz(stored.to_quiz(), selections, "stored"))
    }
}

/// Runs one submission through a fresh [`QuizSession`]. Selections that do
/// not address a question and option slot are dropped.
pub fn evaluate_quiz(quiz: Quiz, selections: &Selections, kind: &str) -> EvaluationResponse {
    let mut session = QuizSession::new(quiz);
    for (question_index, option_index) in selections.iter() {
        if !session.select(question_index, option_index) {
            tracing::debug!(
                question_index,
                option_index,
                "Ignoring out-of-range selection"
            );
        }
    }

    let score = session.submit();
    let questions = evaluation::review(session.quiz(), session.selections());
    metrics::record_quiz_evaluation(kind, score.percentage());

    let quiz = session.quiz();
    EvaluationResponse {
        title: quiz.title.clone(),
        correct: score.correct,
        total: score.total,
        percentage: score.percentage(),
        questions,
        related_topics: quiz.related_topics.clone(),
    }
}
