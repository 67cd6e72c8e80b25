//! Answer normalization and scoring for generated quizzes.
//!
//! Everything here is pure: functions take a [`Quiz`](crate::models::quiz::Quiz)
//! and [`Selections`](crate::models::quiz::Selections) explicitly and return
//! new values. [`QuizSession`] wraps them with the
//! unanswered/submitted lifecycle of a single quiz view.

mod normalize;
mod scoring;
mod session;

pub use normalize::{normalize, normalize_value};
pub use scoring::{
    build_options, is_answered_correctly, resolve_answer, review, score, ScoreResult,
    OPTION_SLOTS, PLACEHOLDER_OPTION,
};
pub use session::{Highlight, OptionMarks, QuizSession, SessionState};
