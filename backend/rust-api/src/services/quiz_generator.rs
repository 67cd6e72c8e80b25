//! Turns article text into quiz questions with the configured model.
//!
//! Model output is treated as untrusted: it is cleaned, parsed leniently and
//! every question is repaired into the stored shape (four options, a full
//! text answer, a known difficulty). When the model fails or answers with
//! placeholders, a deterministic quiz built from the summary is used instead,
//! so generation itself never fails.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use regex::Regex;
use serde_json::{Map, Value};

use crate::metrics;
use crate::models::quiz::{text_of, Question};
use crate::services::llm::{LlmProvider, ProviderError};
use crate::services::prompts;
use crate::utils::html::decode_entities;
use crate::utils::retry::{retry_if, RetryConfig};

const OPTION_COUNT: usize = 4;
const MAX_RELATED_TOPICS: usize = 5;
const DEFAULT_EXPLANATION: &str = "Based on the article content.";
const DEFAULT_SECTION: &str = "Introduction";
const DIFFICULTIES: [&str; 3] = ["easy", "medium", "hard"];
const GENERIC_TERMS: [&str; 6] = [
    "History",
    "Agriculture",
    "Technology",
    "Economy",
    "Mechanics",
    "Function",
];

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?i)```(?:json)?\s*").unwrap();
    static ref YEAR: Regex = Regex::new(r"\b(?:18|19|20)\d{2}\b").unwrap();
    static ref CAPITALIZED_PHRASE: Regex =
        Regex::new(r"\b[A-Z][a-z]{2,}(?:\s+[A-Z][a-z]{2,}){0,2}\b").unwrap();
    static ref LINE_BREAKS: Regex = Regex::new(r"\n+").unwrap();
    static ref PLACEHOLDER_OPTIONS: [Regex; 3] = [
        Regex::new(r"(?i:topic)\s+[A-Z]\b").unwrap(),
        Regex::new(r"(?i:fact)\s+[A-Z]\b").unwrap(),
        Regex::new(r"(?i:option)\s+\d+\b").unwrap(),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizSource {
    Model,
    Fallback,
}

impl QuizSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuizSource::Model => "model",
            QuizSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedQuiz {
    pub questions: Vec<Question>,
    pub source: QuizSource,
}

pub struct QuizGenerator {
    provider: Arc<dyn LlmProvider>,
    num_questions: usize,
    retry: RetryConfig,
}

impl QuizGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, num_questions: usize) -> Self {
        Self {
            provider,
            num_questions: num_questions.max(1),
            retry: RetryConfig::for_llm(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn num_questions(&self) -> usize {
        self.num_questions
    }

    pub async fn generate_quiz(
        &self,
        title: &str,
        summary: &str,
        sections: &[String],
        content: &str,
    ) -> GeneratedQuiz {
        let wanted = self.num_questions;
        let prompt = prompts::quiz_prompt(title, summary, sections, content, wanted);
        tracing::info!("Generating quiz for: {}", title);

        let parsed = match self.complete("quiz", &prompt).await {
            Ok(raw) => parse_model_questions(&raw, content),
            Err(e) => Err(anyhow!(e).context("model call failed")),
        };

        let mut questions = match parsed {
            Ok(questions) => questions,
            Err(e) => {
                tracing::warn!("Quiz generation failed for {}, using fallback: {:#}", title, e);
                return self.fallback(title, summary);
            }
        };

        if questions.is_empty() || questions.iter().any(looks_like_placeholder) {
            tracing::info!("Model returned placeholders or invalid quiz, using fallback generation");
            return self.fallback(title, summary);
        }

        if questions.len() < wanted {
            tracing::debug!(
                "Model returned {} of {} questions, padding with fallback",
                questions.len(),
                wanted
            );
            questions.extend(fallback_quiz(title, summary, wanted - questions.len()));
        }
        questions.truncate(wanted);

        GeneratedQuiz {
            questions,
            source: QuizSource::Model,
        }
    }

    /// Three to five related article titles; empty on any failure.
    pub async fn generate_related_topics(
        &self,
        title: &str,
        summary: &str,
        sections: &[String],
    ) -> Vec<String> {
        let prompt = prompts::related_topics_prompt(title, summary, sections);
        tracing::info!("Generating related topics for: {}", title);

        let result = match self.complete("related_topics", &prompt).await {
            Ok(raw) => parse_related_topics(&raw),
            Err(e) => Err(anyhow!(e)),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!("Error generating related topics for {}: {:#}", title, e);
            Vec::new()
        })
    }

    fn fallback(&self, title: &str, summary: &str) -> GeneratedQuiz {
        GeneratedQuiz {
            questions: fallback_quiz(title, summary, self.num_questions),
            source: QuizSource::Fallback,
        }
    }

    async fn complete(&self, purpose: &str, prompt: &str) -> Result<String, ProviderError> {
        let provider: &dyn LlmProvider = self.provider.as_ref();
        let start = Instant::now();

        let result = retry_if(
            self.retry.clone(),
            move || provider.complete(prompt),
            ProviderError::is_retryable,
        )
        .await;

        let status = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_llm_request(purpose, status, start.elapsed().as_secs_f64());

        result
    }
}

/// Reduces a raw model reply to the JSON text it most likely contains.
pub fn clean_json_response(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let text = decode_entities(raw);
    let text = CODE_FENCE.replace_all(&text, "");
    let text = text.trim();

    let candidate = extract_first_json(text).unwrap_or(text);

    // Python-style dicts
    if candidate.contains('\'') && !candidate.contains('"') {
        return Some(candidate.replace('\'', "\""));
    }
    Some(candidate.to_string())
}

/// The first balanced `[...]` or `{...}` block, skipping brackets that
/// appear inside JSON strings.
pub fn extract_first_json(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c == '[' || c == '{')?;
    let bytes = text.as_bytes();
    let open = bytes[start];
    let close = if open == b'[' { b']' } else { b'}' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        if byte == b'"' {
            in_string = true;
        } else if byte == open {
            depth += 1;
        } else if byte == close {
            depth -= 1;
            if depth == 0 {
                return Some(&text[start..=start + offset]);
            }
        }
    }
    None
}

fn parse_model_questions(raw: &str, content: &str) -> Result<Vec<Question>> {
    let cleaned = clean_json_response(raw).ok_or_else(|| anyhow!("empty response from model"))?;
    let parsed: Value =
        serde_json::from_str(&cleaned).context("model response is not valid JSON")?;

    let items = match parsed {
        Value::Array(items) => items,
        Value::Object(map) => {
            let wrapped = ["questions", "quiz_questions"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array).cloned());
            wrapped.unwrap_or_else(|| vec![Value::Object(map)])
        }
        other => vec![other],
    };

    Ok(items
        .iter()
        .filter_map(Value::as_object)
        .map(|question| repair_question(question, content))
        .collect())
}

fn parse_related_topics(raw: &str) -> Result<Vec<String>> {
    let cleaned = clean_json_response(raw).ok_or_else(|| anyhow!("empty response from model"))?;
    let parsed: Value =
        serde_json::from_str(&cleaned).context("related topics response is not valid JSON")?;

    let topics = match parsed {
        Value::Object(mut map) => match map.remove("related_topics") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    let mut out: Vec<String> = Vec::new();
    for topic in topics.iter().filter_map(Value::as_str) {
        let topic = topic.trim();
        if !topic.is_empty() && !out.iter().any(|t| t == topic) {
            out.push(topic.to_string());
        }
    }
    out.truncate(MAX_RELATED_TOPICS);
    Ok(out)
}

/// JSON "falsy" values are treated as absent when picking between aliases.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn first_present<'a>(question: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| question.get(*key))
        .find(|value| !is_blank(value))
}

fn first_text(question: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_present(question, keys).and_then(text_of)
}

fn raw_options(question: &Map<String, Value>) -> Vec<String> {
    match first_present(question, &["options", "choices", "answers"]) {
        Some(Value::Array(items)) => items.iter().filter_map(text_of).collect(),
        // {"A": "...", "B": "..."}
        Some(Value::Object(labelled)) => labelled.values().filter_map(text_of).collect(),
        Some(other) => text_of(other)
            .map(|text| LINE_BREAKS.split(&text).map(str::to_string).collect())
            .unwrap_or_default(),
        None => Vec::new(),
    }
}

/// Normalizes one model question into the stored shape.
pub fn repair_question(question: &Map<String, Value>, content: &str) -> Question {
    let text = first_text(question, &["question", "text"])
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| "Question".to_string());

    let options = ensure_four_options(raw_options(question), content);

    let answer = first_text(question, &["answer", "correct"]).unwrap_or_default();
    let answer = match_answer(&answer, &options);

    let difficulty = first_text(question, &["difficulty"])
        .map(|d| d.to_lowercase())
        .filter(|d| DIFFICULTIES.contains(&d.as_str()))
        .unwrap_or_else(|| "easy".to_string());

    let explanation = first_text(question, &["explanation", "explain"])
        .map(|e| e.trim().to_string())
        .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string());

    let section =
        first_text(question, &["section"]).unwrap_or_else(|| DEFAULT_SECTION.to_string());

    Question {
        text,
        options,
        answer_raw: Some(answer),
        difficulty,
        section,
        explanation: Some(explanation),
    }
}

/// Maps a letter answer (A-D) or a fragment of option text onto the full
/// option. Falls back to the first option.
fn match_answer(answer: &str, options: &[String]) -> String {
    let answer = answer.trim();
    let letter_index = match answer.to_ascii_uppercase().as_str() {
        "A" => Some(0),
        "B" => Some(1),
        "C" => Some(2),
        "D" => Some(3),
        _ => None,
    };

    let matched = match letter_index {
        Some(index) => options.get(index),
        None if !answer.is_empty() => {
            let needle = answer.to_lowercase();
            options
                .iter()
                .find(|option| option.to_lowercase().contains(&needle))
        }
        None => None,
    };

    matched.or(options.first()).cloned().unwrap_or_default()
}

fn unique_matches(regex: &Regex, text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in regex.find_iter(text) {
        if !found.iter().any(|f| f == m.as_str()) {
            found.push(m.as_str().to_string());
        }
    }
    found
}

/// Exactly four distinct, non-empty options. Short lists are padded with
/// years and capitalized phrases from the article, then generic terms, then
/// `Option N`.
pub fn ensure_four_options(options: Vec<String>, content: &str) -> Vec<String> {
    let mut opts: Vec<String> = Vec::with_capacity(OPTION_COUNT);
    for option in options {
        let option = option.trim();
        if !option.is_empty() && !opts.iter().any(|o| o == option) {
            opts.push(option.to_string());
        }
    }

    if opts.len() >= OPTION_COUNT {
        opts.truncate(OPTION_COUNT);
        return opts;
    }

    let distractors = unique_matches(&YEAR, content)
        .into_iter()
        .chain(unique_matches(&CAPITALIZED_PHRASE, content))
        .chain(GENERIC_TERMS.iter().map(|t| t.to_string()));

    for distractor in distractors {
        if opts.len() >= OPTION_COUNT {
            break;
        }
        if !opts.contains(&distractor) {
            opts.push(distractor);
        }
    }

    while opts.len() < OPTION_COUNT {
        opts.push(format!("Option {}", opts.len() + 1));
    }
    opts
}

/// Three or more options shaped like `Topic A`, `Fact B` or `Option 3`.
/// The label is case-insensitive but the letter must be a capital standing
/// alone, so prose such as "topic about trade" is not counted.
pub fn looks_like_placeholder(question: &Question) -> bool {
    if question.options.is_empty() {
        return true;
    }
    let hits = question
        .options
        .iter()
        .filter(|option| PLACEHOLDER_OPTIONS.iter().any(|p| p.is_match(option)))
        .count();
    hits >= 3
}

fn shuffled(mut options: Vec<String>) -> Vec<String> {
    options.shuffle(&mut rand::rng());
    options
}

fn fallback_question(text: String, options: Vec<String>, answer: String, explanation: String) -> Question {
    Question {
        text,
        options: shuffled(options),
        answer_raw: Some(answer),
        difficulty: "easy".to_string(),
        section: DEFAULT_SECTION.to_string(),
        explanation: Some(explanation),
    }
}

/// Builds `correct` plus three distractors, skipping duplicates.
fn with_distractors<I>(correct: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut options = vec![correct.to_string()];
    for candidate in candidates {
        if options.len() >= OPTION_COUNT {
            break;
        }
        if !candidate.is_empty() && !options.contains(&candidate) {
            options.push(candidate);
        }
    }
    options
}

/// Deterministic questions grounded in the summary text: the main topic,
/// a year, a capitalized phrase, a generic term, then numbered concept
/// questions until `num_questions` is reached. Option order is shuffled.
pub fn fallback_quiz(title: &str, summary: &str, num_questions: usize) -> Vec<Question> {
    let summary = summary.trim();
    let caps = unique_matches(&CAPITALIZED_PHRASE, summary);
    let years = unique_matches(&YEAR, summary);

    let mut questions = Vec::with_capacity(num_questions);

    let main_options = with_distractors(
        title,
        caps.iter()
            .cloned()
            .chain(["History", "Technology", "Other", "Culture"].map(String::from)),
    );
    questions.push(fallback_question(
        format!("What is the main topic of this article about {title}?"),
        main_options,
        title.to_string(),
        format!("The article is about {title}."),
    ));

    let mut seeds: Vec<(&str, String, Vec<String>)> = Vec::new();

    if let Some(year) = years.first() {
        // Nearby years that the summary does not mention
        let value: i32 = year.parse().unwrap_or(1900);
        let others = [-10, 5, 15, -25, 30]
            .iter()
            .map(|delta| (value + delta).to_string())
            .filter(|candidate| !years.contains(candidate))
            .collect();
        seeds.push((
            "Which year is mentioned in the article summary?",
            year.clone(),
            others,
        ));
    }

    if let Some(phrase) = caps.first() {
        let others = GENERIC_TERMS
            .iter()
            .chain(["Culture", "Mathematics"].iter())
            .filter(|term| !summary.contains(*term))
            .map(|term| term.to_string())
            .collect();
        seeds.push((
            "Which of these is mentioned in the article summary?",
            phrase.clone(),
            others,
        ));
    }

    seeds.push((
        "Which term relates to the article topic?",
        "Agriculture".to_string(),
        ["Technology", "Economy", "Culture"].map(String::from).to_vec(),
    ));

    for (number, (text, correct, others)) in (2..).zip(seeds) {
        if questions.len() >= num_questions {
            break;
        }
        let options = with_distractors(
            &correct,
            others
                .into_iter()
                .chain(["Fact B", "Fact C", "Fact D", "Other"].map(String::from)),
        );
        questions.push(fallback_question(
            format!("{number}. {text}"),
            options,
            correct.clone(),
            format!("Derived from article summary: {correct}"),
        ));
    }

    while questions.len() < num_questions {
        let number = questions.len() + 1;
        questions.push(fallback_question(
            format!("What is a key concept related to {title}? (fallback {number})"),
            ["Fact A", "Fact B", "Fact C", "Fact D"].map(String::from).to_vec(),
            "Fact A".to_string(),
            "Fallback question generated from summary heuristics.".to_string(),
        ));
    }

    questions.truncate(num_questions);
    questions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::MockProvider;
    use serde_json::json;

    const SUMMARY: &str = "Paris is the capital of France. The Eiffel Tower opened in 1889 \
                           and the city hosted the Olympic Games in 1900 and 2024.";

    fn generator(provider: MockProvider, num_questions: usize) -> QuizGenerator {
        QuizGenerator::new(Arc::new(provider), num_questions).with_retry(RetryConfig::none())
    }

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn model_questions(n: usize) -> String {
        let questions: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "question": format!("Question {i}?"),
                    "options": ["Paris", "Lyon", "Marseille", "Nice"],
                    "answer": "Paris",
                    "difficulty": "medium",
                    "explanation": "Paris is the capital.",
                    "section": "Geography"
                })
            })
            .collect();
        serde_json::to_string(&questions).unwrap()
    }

    #[test]
    fn cleans_fenced_reply_with_prose() {
        let raw = "Sure! Here you go:\n```json\n[{\"question\": \"Q\"}]\n```\nEnjoy.";
        assert_eq!(
            clean_json_response(raw).as_deref(),
            Some("[{\"question\": \"Q\"}]")
        );
        assert_eq!(clean_json_response("   "), None);
    }

    #[test]
    fn cleaning_unescapes_entities_and_single_quotes() {
        assert_eq!(
            clean_json_response("[{&quot;a&quot;: 1}]").as_deref(),
            Some("[{\"a\": 1}]")
        );
        assert_eq!(
            clean_json_response("{'related_topics': ['X']}").as_deref(),
            Some("{\"related_topics\": [\"X\"]}")
        );
    }

    #[test]
    fn extraction_ignores_brackets_inside_strings() {
        let text = r#"noise {"q": "a ] tricky } value", "n": [1, 2]} trailing"#;
        assert_eq!(
            extract_first_json(text),
            Some(r#"{"q": "a ] tricky } value", "n": [1, 2]}"#)
        );
        assert_eq!(extract_first_json("[1, [2, 3]"), None);
        assert_eq!(extract_first_json("no json here"), None);
    }

    #[test]
    fn repairs_letter_answers_and_labelled_options() {
        let question = as_map(json!({
            "text": "Capital of France?",
            "choices": {"A": "Lyon", "B": "Paris", "C": "Nice", "D": "Lille"},
            "correct": "b",
            "difficulty": "HARD"
        }));

        let repaired = repair_question(&question, "");
        assert_eq!(repaired.text, "Capital of France?");
        assert_eq!(repaired.options, vec!["Lyon", "Paris", "Nice", "Lille"]);
        assert_eq!(repaired.answer_raw.as_deref(), Some("Paris"));
        assert_eq!(repaired.difficulty, "hard");
        assert_eq!(repaired.explanation.as_deref(), Some(DEFAULT_EXPLANATION));
        assert_eq!(repaired.section, DEFAULT_SECTION);
    }

    #[test]
    fn repairs_partial_answer_text_and_unknown_difficulty() {
        let question = as_map(json!({
            "question": "Who designed the tower?",
            "options": "Gustave Eiffel\nLe Corbusier\n\nHaussmann\nNapoleon",
            "answer": "eiffel",
            "difficulty": "trivial"
        }));

        let repaired = repair_question(&question, "");
        assert_eq!(repaired.options.len(), 4);
        assert_eq!(repaired.answer_raw.as_deref(), Some("Gustave Eiffel"));
        assert_eq!(repaired.difficulty, "easy");
    }

    #[test]
    fn unmatched_answer_falls_back_to_first_option() {
        let question = as_map(json!({
            "question": "Q",
            "options": ["a", "b", "c", "d"],
            "answer": "zzz"
        }));
        assert_eq!(repair_question(&question, "").answer_raw.as_deref(), Some("a"));
    }

    #[test]
    fn pads_short_option_lists_from_content() {
        let options = ensure_four_options(
            vec![" Paris ".into(), "Paris".into(), "".into()],
            "Founded in 1889 near the Seine River",
        );
        assert_eq!(options, vec!["Paris", "1889", "Founded", "Seine River"]);

        let generic = ensure_four_options(vec!["x".into()], "");
        assert_eq!(generic, vec!["x", "History", "Agriculture", "Technology"]);
    }

    #[test]
    fn long_option_lists_are_cut_to_four() {
        let options = ensure_four_options(
            ["a", "b", "c", "d", "e"].map(String::from).to_vec(),
            "",
        );
        assert_eq!(options, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn detects_placeholder_options() {
        let placeholder = Question::new(
            "Q",
            ["Topic A", "Topic B", "Fact C", "Paris"].map(String::from).to_vec(),
            None,
        );
        assert!(looks_like_placeholder(&placeholder));

        let real = Question::new(
            "Q",
            ["Options trading", "Topical", "Factory", "Option 1"].map(String::from).to_vec(),
            None,
        );
        assert!(!looks_like_placeholder(&real));

        assert!(looks_like_placeholder(&Question::new("Q", vec![], None)));
    }

    #[test]
    fn placeholder_letters_must_be_standalone_capitals() {
        let shouty = Question::new(
            "Q",
            ["TOPIC A", "fact B", "option 3", "Paris"].map(String::from).to_vec(),
            None,
        );
        assert!(looks_like_placeholder(&shouty));

        let prose = Question::new(
            "Q",
            ["topic a", "topic about trade", "Fact Based reasoning", "Paris"]
                .map(String::from)
                .to_vec(),
            None,
        );
        assert!(!looks_like_placeholder(&prose));
    }

    #[test]
    fn fallback_quiz_is_well_formed() {
        for n in [1, 3, 5, 8] {
            let quiz = fallback_quiz("Paris", SUMMARY, n);
            assert_eq!(quiz.len(), n);
            for question in &quiz {
                assert_eq!(question.options.len(), 4, "{}", question.text);
                let answer = question.answer_raw.as_deref().unwrap();
                assert!(question.options.iter().any(|o| o == answer));
                let mut unique = question.options.clone();
                unique.sort();
                unique.dedup();
                assert_eq!(unique.len(), 4, "duplicate options in {:?}", question.options);
            }
        }
    }

    #[test]
    fn fallback_year_question_uses_full_years() {
        let quiz = fallback_quiz("Paris", SUMMARY, 2);
        let year_question = &quiz[1];
        assert!(year_question.text.starts_with("2. Which year"));
        assert_eq!(year_question.answer_raw.as_deref(), Some("1889"));
        assert!(!year_question.options.contains(&"1900".to_string()));
    }

    #[test]
    fn fallback_without_summary_still_fills_quota() {
        let quiz = fallback_quiz("Obscure", "", 4);
        assert_eq!(quiz.len(), 4);
        assert!(quiz[0].text.contains("Obscure"));
        assert!(quiz[3].text.contains("(fallback 4)"));
    }

    #[tokio::test]
    async fn model_quiz_is_used_and_padded() {
        let gen = generator(MockProvider::with_fixed_response(&model_questions(3)), 5);
        let quiz = gen.generate_quiz("Paris", SUMMARY, &[], SUMMARY).await;

        assert_eq!(quiz.source, QuizSource::Model);
        assert_eq!(quiz.questions.len(), 5);
        assert_eq!(quiz.questions[0].section, "Geography");
        assert_eq!(quiz.questions[0].answer_raw.as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn surplus_model_questions_are_truncated() {
        let gen = generator(MockProvider::with_fixed_response(&model_questions(9)), 5);
        let quiz = gen.generate_quiz("Paris", SUMMARY, &[], SUMMARY).await;
        assert_eq!(quiz.questions.len(), 5);
    }

    #[tokio::test]
    async fn wrapped_model_reply_is_accepted() {
        let reply = format!("{{\"questions\": {}}}", model_questions(2));
        let gen = generator(MockProvider::with_fixed_response(&reply), 2);
        let quiz = gen.generate_quiz("Paris", SUMMARY, &[], SUMMARY).await;
        assert_eq!(quiz.source, QuizSource::Model);
        assert_eq!(quiz.questions.len(), 2);
    }

    #[tokio::test]
    async fn provider_failure_uses_fallback() {
        let gen = generator(MockProvider::failing(), 5);
        let quiz = gen.generate_quiz("Paris", SUMMARY, &[], SUMMARY).await;

        assert_eq!(quiz.source, QuizSource::Fallback);
        assert_eq!(quiz.questions.len(), 5);
    }

    #[tokio::test]
    async fn placeholder_reply_uses_fallback() {
        let reply = json!([{
            "question": "Q",
            "options": ["Option 1", "Option 2", "Option 3", "Option 4"],
            "answer": "Option 1"
        }])
        .to_string();
        let gen = generator(MockProvider::with_fixed_response(&reply), 3);
        let quiz = gen.generate_quiz("Paris", SUMMARY, &[], SUMMARY).await;
        assert_eq!(quiz.source, QuizSource::Fallback);
    }

    #[tokio::test]
    async fn garbage_reply_uses_fallback() {
        let gen = generator(MockProvider::with_fixed_response("I cannot help with that."), 3);
        let quiz = gen.generate_quiz("Paris", SUMMARY, &[], SUMMARY).await;
        assert_eq!(quiz.source, QuizSource::Fallback);
        assert_eq!(quiz.questions.len(), 3);
    }

    #[tokio::test]
    async fn related_topics_are_cleaned() {
        let reply = r#"{"related_topics": [" France ", "France", 7, "Seine", "Louvre", "Eiffel Tower", "Versailles", "Lyon"]}"#;
        let gen = generator(MockProvider::with_fixed_response(reply), 5);
        let topics = gen.generate_related_topics("Paris", SUMMARY, &[]).await;
        assert_eq!(
            topics,
            vec!["France", "Seine", "Louvre", "Eiffel Tower", "Versailles"]
        );
    }

    #[tokio::test]
    async fn related_topics_failure_is_empty() {
        let gen = generator(MockProvider::failing(), 5);
        assert!(gen
            .generate_related_topics("Paris", SUMMARY, &[])
            .await
            .is_empty());

        let gen = generator(MockProvider::with_fixed_response("[\"A\", \"B\"]"), 5);
        assert_eq!(
            gen.generate_related_topics("Paris", SUMMARY, &[]).await,
            vec!["A", "B"]
        );
    }
}
