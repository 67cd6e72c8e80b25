use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::quiz::{Question, Quiz};
use crate::utils::time::bson_datetime_as_chrono;

/// Article document stored in the "wiki_articles" collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiArticle {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub url: String,
    pub title: String,

    #[serde(default)]
    pub summary: Option<String>,

    /// Raw page HTML as fetched from Wikipedia
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_html: Option<String>,

    #[serde(default)]
    pub key_entities: Option<KeyEntities>,

    #[serde(default)]
    pub sections: Option<Vec<String>>,

    /// Free-form on purpose: older documents hold wrapped or stringified
    /// question lists. See [`normalize_stored_questions`].
    #[serde(default)]
    pub quiz_questions: Option<Value>,

    #[serde(default)]
    pub related_topics: Option<Vec<String>>,

    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,

    /// Seconds spent scraping and generating
    #[serde(default)]
    pub generation_time: Option<f64>,

    /// 0 = fresh generation, 1 = served from a stored/cached result
    #[serde(default)]
    pub is_cached: i32,
}

impl WikiArticle {
    pub fn has_questions(&self) -> bool {
        !normalize_stored_questions(self.quiz_questions.as_ref()).is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyEntities {
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Response body for generation and history endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizGenerationResponse {
    pub id: String,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub key_entities: KeyEntities,
    pub sections: Vec<String>,
    pub quiz_questions: Vec<Value>,
    pub related_topics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub generation_time: Option<f64>,
    pub is_cached: i32,
}

impl From<WikiArticle> for QuizGenerationResponse {
    fn from(article: WikiArticle) -> Self {
        let quiz_questions = normalize_stored_questions(article.quiz_questions.as_ref());

        tracing::debug!(
            "Normalized article for response: id={:?} quiz_questions_len={}",
            article.id,
            quiz_questions.len()
        );

        Self {
            id: article.id.map(|id| id.to_hex()).unwrap_or_default(),
            url: article.url,
            title: article.title,
            summary: article.summary.unwrap_or_default(),
            key_entities: article.key_entities.unwrap_or_default(),
            sections: article.sections.unwrap_or_default(),
            quiz_questions,
            related_topics: article.related_topics.unwrap_or_default(),
            created_at: article.created_at,
            generation_time: article.generation_time,
            is_cached: article.is_cached,
        }
    }
}

impl QuizGenerationResponse {
    /// Typed view of the stored questions. Entries that are not question
    /// objects are skipped.
    pub fn to_quiz(&self) -> Quiz {
        let quiz_questions = self
            .quiz_questions
            .iter()
            .filter_map(|value| match serde_json::from_value::<Question>(value.clone()) {
                Ok(question) => Some(question),
                Err(e) => {
                    tracing::warn!("Skipping malformed stored question in {}: {}", self.id, e);
                    None
                }
            })
            .collect();

        Quiz {
            title: self.title.clone(),
            quiz_questions,
            related_topics: self.related_topics.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub url: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct HistoryQuery {
    #[serde(default)]
    pub skip: u64,

    #[serde(default = "default_history_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    10
}

/// Coerces whatever shape `quiz_questions` was stored in into a list:
/// lists pass through, wrapper objects are unwrapped, a single question
/// object is wrapped, JSON strings are parsed, `null` becomes empty.
pub fn normalize_stored_questions(raw: Option<&Value>) -> Vec<Value> {
    match raw {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => {
            for key in ["quiz_questions", "questions", "quiz"] {
                if let Some(Value::Array(items)) = map.get(key) {
                    return items.clone();
                }
            }
            if map.contains_key("question") {
                return vec![Value::Object(map.clone())];
            }
            map.values()
                .find_map(|v| v.as_array().cloned())
                .unwrap_or_else(|| vec![Value::Object(map.clone())])
        }
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(parsed) if !parsed.is_string() => normalize_stored_questions(Some(&parsed)),
            _ => vec![Value::String(text.clone())],
        },
        Some(other) => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stored_list_passes_through() {
        let raw = json!([{"question": "a"}, {"question": "b"}]);
        assert_eq!(normalize_stored_questions(Some(&raw)).len(), 2);
    }

    #[test]
    fn null_or_missing_becomes_empty() {
        assert!(normalize_stored_questions(None).is_empty());
        assert!(normalize_stored_questions(Some(&Value::Null)).is_empty());
    }

    #[test]
    fn wrapper_objects_are_unwrapped() {
        for key in ["quiz_questions", "questions", "quiz"] {
            let mut wrapper = serde_json::Map::new();
            wrapper.insert(key.to_string(), json!([{"question": "a"}]));
            let raw = Value::Object(wrapper);
            assert_eq!(
                normalize_stored_questions(Some(&raw)),
                vec![json!({"question": "a"})],
                "key {key}"
            );
        }
    }

    #[test]
    fn single_question_object_is_wrapped() {
        let raw = json!({"question": "a", "options": ["x", "y"]});
        assert_eq!(normalize_stored_questions(Some(&raw)), vec![raw.clone()]);
    }

    #[test]
    fn unknown_object_uses_first_list_value() {
        let raw = json!({"meta": 1, "items": [{"question": "a"}]});
        assert_eq!(
            normalize_stored_questions(Some(&raw)),
            vec![json!({"question": "a"})]
        );
    }

    #[test]
    fn json_strings_are_parsed() {
        let raw = json!("{\"questions\": [{\"question\": \"a\"}]}");
        assert_eq!(normalize_stored_questions(Some(&raw)).len(), 1);

        let junk = json!("not json");
        assert_eq!(normalize_stored_questions(Some(&junk)), vec![junk.clone()]);
    }

    #[test]
    fn response_converts_to_typed_quiz() {
        let response = QuizGenerationResponse {
            id: "abc".into(),
            url: "https://en.wikipedia.org/wiki/Paris".into(),
            title: "Paris".into(),
            summary: String::new(),
            key_entities: KeyEntities::default(),
            sections: vec![],
            quiz_questions: vec![
                json!({"question": "Capital?", "options": ["Paris"], "answer": "Paris"}),
                json!("stray text"),
            ],
            related_topics: vec!["France".into()],
            created_at: Utc::now(),
            generation_time: None,
            is_cached: 0,
        };

        let quiz = response.to_quiz();
        assert_eq!(quiz.title, "Paris");
        assert_eq!(quiz.quiz_questions.len(), 1);
        assert_eq!(quiz.related_topics, vec!["France"]);
    }

    #[test]
    fn history_limit_is_validated() {
        let ok: HistoryQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!(ok.skip, 0);
        assert_eq!(ok.limit, 10);
        assert!(ok.validate().is_ok());

        let too_big = HistoryQuery { skip: 0, limit: 500 };
        assert!(too_big.validate().is_err());
    }
}
