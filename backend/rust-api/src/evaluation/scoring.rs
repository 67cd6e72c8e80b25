use serde::{Deserialize, Serialize};

use super::normalize::normalize;
use crate::models::quiz::{Question, QuestionReview, Quiz, Selections};

/// Every question is presented with exactly this many option slots.
pub const OPTION_SLOTS: usize = 4;
pub const PLACEHOLDER_OPTION: &str = "N/A";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub correct: usize,
    pub total: usize,
}

impl ScoreResult {
    /// Rounded percentage; an empty quiz scores 0 rather than dividing by zero.
    pub fn percentage(&self) -> u32 {
        let denominator = self.total.max(1) as f64;
        ((self.correct as f64 / denominator) * 100.0).round() as u32
    }
}

/// The first four options, normalized, padded with "N/A". Source order is
/// kept; nothing is sorted or de-duplicated.
pub fn build_options(question: &Question) -> [String; OPTION_SLOTS] {
    let mut built: [String; OPTION_SLOTS] =
        std::array::from_fn(|_| PLACEHOLDER_OPTION.to_string());
    for (slot, raw) in built.iter_mut().zip(&question.options) {
        *slot = normalize(raw);
    }
    built
}

/// Normalized answer key. A question without an answer treats its first
/// option as correct.
pub fn resolve_answer(question: &Question, options: &[String]) -> String {
    match question.answer_raw.as_deref() {
        Some(raw) if !raw.trim().is_empty() => normalize(raw),
        _ => options.first().cloned().unwrap_or_default(),
    }
}

pub fn is_answered_correctly(question: &Question, selected: Option<usize>) -> bool {
    let options = build_options(question);
    let answer = resolve_answer(question, &options);
    selected
        .and_then(|index| options.get(index))
        .is_some_and(|text| *text == answer)
}

/// Counts questions whose selected option matches the answer key.
/// Unanswered questions count as wrong; the total is always the full
/// question count.
pub fn score(quiz: &Quiz, selections: &Selections) -> ScoreResult {
    let correct = quiz
        .quiz_questions
        .iter()
        .enumerate()
        .filter(|(index, question)| is_answered_correctly(question, selections.get(*index)))
        .count();

    ScoreResult {
        correct,
        total: quiz.question_count(),
    }
}

pub fn review(quiz: &Quiz, selections: &Selections) -> Vec<QuestionReview> {
    quiz.quiz_questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let options = build_options(question);
            let answer = resolve_answer(question, &options);
            let selected = selections.get(index);
            let correct = selected
                .and_then(|i| options.get(i))
                .is_some_and(|text| *text == answer);

            QuestionReview {
                index,
                question: question.text.clone(),
                options: options.to_vec(),
                answer,
                selected,
                correct,
                difficulty: question.difficulty.clone(),
                section: question.section.clone(),
                explanation: question.explanation_or_default().to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(options: &[&str], answer: Option<&str>) -> Question {
        Question::new(
            "Q",
            options.iter().map(|s| s.to_string()).collect(),
            answer.map(str::to_string),
        )
    }

    fn capital_quiz() -> Quiz {
        Quiz {
            title: "Capitals".to_string(),
            quiz_questions: vec![question(
                &["Paris", "Rome", "Berlin", "Madrid"],
                Some("Paris"),
            )],
            related_topics: vec![],
        }
    }

    #[test]
    fn pads_short_option_lists() {
        let built = build_options(&question(&["Paris", "Rome"], None));
        assert_eq!(built, ["Paris", "Rome", "N/A", "N/A"]);
    }

    #[test]
    fn truncates_long_option_lists() {
        let built = build_options(&question(
            &["A) One", "B) Two", "C) Three", "D) Four", "Five", "Six"],
            None,
        ));
        assert_eq!(built, ["One", "Two", "Three", "Four"]);
    }

    #[test]
    fn keeps_duplicates_and_order() {
        let built = build_options(&question(&["Rome", "Option A: Rome", "Paris"], None));
        assert_eq!(built, ["Rome", "Rome", "Paris", "N/A"]);
    }

    #[test]
    fn missing_answer_falls_back_to_first_option() {
        let q = question(&["Rome", "Paris"], None);
        let built = build_options(&q);
        assert_eq!(resolve_answer(&q, &built), "Rome");

        let blank = question(&["Rome", "Paris"], Some("   "));
        assert_eq!(resolve_answer(&blank, &built), "Rome");
    }

    #[test]
    fn answer_is_normalized_like_options() {
        let q = question(&["A) Paris", "B) Rome"], Some("Option B: Rome"));
        let built = build_options(&q);
        assert_eq!(resolve_answer(&q, &built), "Rome");
        assert!(is_answered_correctly(&q, Some(1)));
        assert!(!is_answered_correctly(&q, Some(0)));
    }

    #[test]
    fn scores_selected_answers() {
        let quiz = capital_quiz();

        let right: Selections = [(0, 0)].into_iter().collect();
        assert_eq!(score(&quiz, &right), ScoreResult { correct: 1, total: 1 });

        let wrong: Selections = [(0, 1)].into_iter().collect();
        assert_eq!(score(&quiz, &wrong), ScoreResult { correct: 0, total: 1 });

        assert_eq!(
            score(&quiz, &Selections::new()),
            ScoreResult { correct: 0, total: 1 }
        );
    }

    #[test]
    fn out_of_range_selection_is_wrong() {
        let quiz = capital_quiz();
        let selections: Selections = [(0, 7)].into_iter().collect();
        assert_eq!(score(&quiz, &selections).correct, 0);
    }

    #[test]
    fn padded_slot_can_match_missing_answer_text() {
        // Answer "N/A" against a padded slot is still an exact text match.
        let q = question(&["Paris"], Some("N/A"));
        assert!(is_answered_correctly(&q, Some(3)));
    }

    #[test]
    fn percentage_rounds_and_guards_empty_quiz() {
        assert_eq!(ScoreResult { correct: 0, total: 0 }.percentage(), 0);
        assert_eq!(ScoreResult { correct: 1, total: 3 }.percentage(), 33);
        assert_eq!(ScoreResult { correct: 2, total: 3 }.percentage(), 67);
        assert_eq!(ScoreResult { correct: 5, total: 5 }.percentage(), 100);
    }

    #[test]
    fn review_reports_each_question() {
        let quiz = capital_quiz();
        let selections: Selections = [(0, 1)].into_iter().collect();
        let reviews = review(&quiz, &selections);

        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].answer, "Paris");
        assert_eq!(reviews[0].selected, Some(1));
        assert!(!reviews[0].correct);
        assert_eq!(reviews[0].options.len(), OPTION_SLOTS);
    }
}
