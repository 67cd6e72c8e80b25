use anyhow::anyhow;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use serde_json::Value;

use crate::metrics::track_db_operation;
use crate::models::article::{normalize_stored_questions, WikiArticle};
use crate::services::error::{QuizError, QuizResult};

pub const COLLECTION: &str = "wiki_articles";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Storage for scraped articles and their generated quizzes.
#[derive(Clone)]
pub struct ArticleService {
    collection: Collection<WikiArticle>,
}

impl ArticleService {
    pub fn new(mongo: &Database) -> Self {
        Self {
            collection: mongo.collection::<WikiArticle>(COLLECTION),
        }
    }

    pub async fn ensure_indexes(&self) -> QuizResult<()> {
        let url_index = IndexModel::builder()
            .keys(doc! { "url": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let history_index = IndexModel::builder()
            .keys(doc! { "createdAt": -1 })
            .build();

        track_db_operation(
            "create_indexes",
            COLLECTION,
            async { self.collection.create_indexes([url_index, history_index]).await },
        )
        .await?;

        tracing::info!("Indexes ensured for {}", COLLECTION);
        Ok(())
    }

    pub async fn create(&self, mut article: WikiArticle) -> QuizResult<WikiArticle> {
        let result = track_db_operation(
            "insert_one",
            COLLECTION,
            async { self.collection.insert_one(&article).await },
        )
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                QuizError::Conflict("Article URL already exists".to_string())
            } else {
                QuizError::Database(e)
            }
        })?;

        article.id = result.inserted_id.as_object_id();
        tracing::info!("Stored article {} ({:?})", article.url, article.id);
        Ok(article)
    }

    pub async fn get_by_url(&self, url: &str) -> QuizResult<Option<WikiArticle>> {
        let article = track_db_operation(
            "find_one",
            COLLECTION,
            async { self.collection.find_one(doc! { "url": url }).await },
        )
        .await?;
        Ok(article)
    }

    pub async fn get_by_id(&self, id: &str) -> QuizResult<Option<WikiArticle>> {
        let object_id = parse_id(id)?;
        let article = track_db_operation(
            "find_one",
            COLLECTION,
            async { self.collection.find_one(doc! { "_id": object_id }).await },
        )
        .await?;
        Ok(article)
    }

    /// Newest first.
    pub async fn list(&self, skip: u64, limit: i64) -> QuizResult<Vec<WikiArticle>> {
        track_db_operation("find", COLLECTION, async {
            self.collection
                .find(doc! {})
                .sort(doc! { "createdAt": -1 })
                .skip(skip)
                .limit(limit)
                .await?
                .try_collect::<Vec<_>>()
                .await
        })
        .await
        .map_err(QuizError::Database)
    }

    /// Overwrites the scraped and generated fields of an existing article.
    pub async fn update_generated(
        &self,
        id: ObjectId,
        article: &WikiArticle,
    ) -> QuizResult<Option<WikiArticle>> {
        let fields = generated_fields(article)?;
        let updated = track_db_operation(
            "find_one_and_update",
            COLLECTION,
            async {
                self.collection
                    .find_one_and_update(doc! { "_id": id }, doc! { "$set": fields })
                    .return_document(ReturnDocument::After)
                    .await
            },
        )
        .await?;
        Ok(updated)
    }

    /// Returns false when nothing matched.
    pub async fn delete(&self, id: &str) -> QuizResult<bool> {
        let object_id = parse_id(id)?;
        let result = track_db_operation(
            "delete_one",
            COLLECTION,
            async { self.collection.delete_one(doc! { "_id": object_id }).await },
        )
        .await?;
        Ok(result.deleted_count > 0)
    }

    /// Rewrites every stored `quiz_questions` value into a plain list.
    /// Returns (articles checked, articles modified).
    pub async fn normalize_stored_quizzes(&self) -> QuizResult<(u64, u64)> {
        let mut cursor = track_db_operation("find", COLLECTION, async {
            self.collection.find(doc! {}).await
        })
        .await?;

        let mut checked = 0u64;
        let mut modified = 0u64;

        while let Some(article) = cursor.try_next().await? {
            checked += 1;

            let normalized =
                Value::Array(normalize_stored_questions(article.quiz_questions.as_ref()));
            if article.quiz_questions.as_ref() == Some(&normalized) {
                continue;
            }

            let Some(id) = article.id else {
                tracing::warn!("Skipping article without _id: {}", article.url);
                continue;
            };

            let questions = bson::to_bson(&normalized)
                .map_err(|e| QuizError::Internal(anyhow!("Failed to encode questions: {}", e)))?;
            track_db_operation(
                "update_one",
                COLLECTION,
                async {
                    self.collection
                        .update_one(
                            doc! { "_id": id },
                            doc! { "$set": { "quiz_questions": questions } },
                        )
                        .await
                },
            )
            .await?;

            tracing::debug!("Normalized quiz_questions for {}", article.url);
            modified += 1;
        }

        Ok((checked, modified))
    }
}

pub fn parse_id(id: &str) -> QuizResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| QuizError::InvalidId(id.to_string()))
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

fn generated_fields(article: &WikiArticle) -> QuizResult<Document> {
    let encode = |value: Result<Bson, bson::ser::Error>| {
        value.map_err(|e| QuizError::Internal(anyhow!("Failed to encode article: {}", e)))
    };

    Ok(doc! {
        "title": article.title.clone(),
        "summary": article.summary.clone(),
        "raw_html": article.raw_html.clone(),
        "key_entities": encode(bson::to_bson(&article.key_entities))?,
        "sections": article.sections.clone(),
        "quiz_questions": encode(bson::to_bson(&article.quiz_questions))?,
        "related_topics": article.related_topics.clone(),
        "generation_time": article.generation_time,
        "is_cached": article.is_cached,
        "updatedAt": bson::DateTime::from_millis(Utc::now().timestamp_millis()),
    })
}
