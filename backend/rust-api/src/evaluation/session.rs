use super::scoring::{build_options, resolve_answer, score, ScoreResult, OPTION_SLOTS};
use crate::models::quiz::{Quiz, Selections};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unanswered { selections: Selections },
    Submitted { selections: Selections, score: ScoreResult },
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Unanswered {
            selections: Selections::new(),
        }
    }
}

/// How a single option row should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Plain,
    Selected,
    SelectedCorrect,
    SelectedWrong,
    MissedCorrect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptionMarks {
    pub is_selected: bool,
    pub is_correct: bool,
    pub is_wrong_selected: bool,
}

impl OptionMarks {
    pub fn highlight(&self) -> Highlight {
        match (self.is_selected, self.is_correct, self.is_wrong_selected) {
            (true, true, _) => Highlight::SelectedCorrect,
            (_, _, true) => Highlight::SelectedWrong,
            (false, true, _) => Highlight::MissedCorrect,
            (true, false, false) => Highlight::Selected,
            _ => Highlight::Plain,
        }
    }
}

/// One viewing of a quiz: selections while unanswered, a frozen score once
/// submitted.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: Quiz,
    state: SessionState,
}

impl QuizSession {
    pub fn new(quiz: Quiz) -> Self {
        Self {
            quiz,
            state: SessionState::default(),
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn selections(&self) -> &Selections {
        match &self.state {
            SessionState::Unanswered { selections } => selections,
            SessionState::Submitted { selections, .. } => selections,
        }
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.state, SessionState::Submitted { .. })
    }

    pub fn score(&self) -> Option<ScoreResult> {
        match &self.state {
            SessionState::Submitted { score, .. } => Some(*score),
            SessionState::Unanswered { .. } => None,
        }
    }

    /// Records a choice. Returns `false` when the session is already
    /// submitted or the indices do not address an option slot.
    pub fn select(&mut self, question_index: usize, option_index: usize) -> bool {
        if question_index >= self.quiz.question_count() || option_index >= OPTION_SLOTS {
            return false;
        }
        match &mut self.state {
            SessionState::Unanswered { selections } => {
                selections.choose(question_index, option_index);
                true
            }
            SessionState::Submitted { .. } => false,
        }
    }

    /// Evaluates the current selections and freezes them. Submitting again
    /// returns the stored score without re-evaluating.
    pub fn submit(&mut self) -> ScoreResult {
        if let Some(existing) = self.score() {
            return existing;
        }

        let selections = match std::mem::take(&mut self.state) {
            SessionState::Unanswered { selections } => selections,
            SessionState::Submitted { selections, .. } => selections,
        };
        let result = score(&self.quiz, &selections);
        tracing::debug!(
            correct = result.correct,
            total = result.total,
            "Quiz session submitted"
        );

        self.state = SessionState::Submitted {
            selections,
            score: result,
        };
        result
    }

    /// Drops selections and score together.
    pub fn reset(&mut self) {
        self.state = SessionState::default();
    }

    /// Highlight flags for one option row, recomputed from current state.
    /// Correctness is only revealed after submission.
    pub fn option_marks(&self, question_index: usize, option_index: usize) -> OptionMarks {
        let is_selected = self.selections().get(question_index) == Some(option_index);
        let Some(question) = self.quiz.quiz_questions.get(question_index) else {
            return OptionMarks::default();
        };
        if !self.is_submitted() {
            return OptionMarks {
                is_selected,
                ..OptionMarks::default()
            };
        }

        let options = build_options(question);
        let answer = resolve_answer(question, &options);
        let is_correct = options
            .get(option_index)
            .is_some_and(|text| *text == answer);

        OptionMarks {
            is_selected,
            is_correct,
            is_wrong_selected: is_selected && !is_correct,
        }
    }
}
