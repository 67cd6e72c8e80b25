use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_DIFFICULTY: &str = "medium";
pub const DEFAULT_SECTION: &str = "Intro";
/// Shown when a question carries no explanation of its own.
pub const MISSING_EXPLANATION: &str = "No explanation available for this question.";

/// A generated multiple-choice question as produced by the quiz source.
///
/// Upstream data is noisy: options and answers may arrive as numbers, the
/// answer may be missing, and any field may be `null`. Deserialization
/// accepts all of that and leaves cleanup to the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question", default, deserialize_with = "text_or_empty")]
    pub text: String,

    #[serde(default, deserialize_with = "text_list")]
    pub options: Vec<String>,

    #[serde(
        rename = "answer",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub answer_raw: Option<String>,

    #[serde(default = "default_difficulty", deserialize_with = "difficulty_or_default")]
    pub difficulty: String,

    #[serde(default = "default_section", deserialize_with = "section_or_default")]
    pub section: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub explanation: Option<String>,
}

impl Question {
    pub fn new(text: impl Into<String>, options: Vec<String>, answer: Option<String>) -> Self {
        Self {
            text: text.into(),
            options,
            answer_raw: answer,
            difficulty: default_difficulty(),
            section: default_section(),
            explanation: None,
        }
    }

    pub fn explanation_or_default(&self) -> &str {
        match self.explanation.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => MISSING_EXPLANATION,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default, deserialize_with = "text_or_empty")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub quiz_questions: Vec<Question>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub related_topics: Vec<String>,
}

impl Quiz {
    pub fn question_count(&self) -> usize {
        self.quiz_questions.len()
    }
}

/// Chosen option index per question index. At most one entry per question.
///
/// Serialized as a JSON object keyed by question index, e.g. `{"0": 2}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selections(BTreeMap<usize, usize>);

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets or overwrites the choice for `question_index`.
    pub fn choose(&mut self, question_index: usize, option_index: usize) {
        self.0.insert(question_index, option_index);
    }

    pub fn get(&self, question_index: usize) -> Option<usize> {
        self.0.get(&question_index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().map(|(q, o)| (*q, *o))
    }
}

impl FromIterator<(usize, usize)> for Selections {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Deserialize)]
pub struct EvaluateQuizRequest {
    pub quiz: Quiz,
    #[serde(default)]
    pub selections: Selections,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateSelectionsRequest {
    #[serde(default)]
    pub selections: Selections,
}

/// Per-question outcome returned after a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionReview {
    pub index: usize,
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub selected: Option<usize>,
    pub correct: bool,
    pub difficulty: String,
    pub section: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub title: String,
    pub correct: usize,
    pub total: usize,
    pub percentage: u32,
    pub questions: Vec<QuestionReview>,
    pub related_topics: Vec<String>,
}

/// Textual form of a loosely typed JSON scalar. `null` has no text.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn default_difficulty() -> String {
    DEFAULT_DIFFICULTY.to_string()
}

fn default_section() -> String {
    DEFAULT_SECTION.to_string()
}

fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.as_ref().and_then(text_of))
}

fn text_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(optional_text(d)?.unwrap_or_default())
}

fn text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let values = Option::<Vec<Value>>::deserialize(d)?.unwrap_or_default();
    Ok(values
        .iter()
        .map(|v| text_of(v).unwrap_or_default())
        .collect())
}

fn difficulty_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(optional_text(d)?
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(default_difficulty))
}

fn section_or_default<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(optional_text(d)?
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(default_section))
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}
