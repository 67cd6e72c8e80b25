pub mod article;
pub mod quiz;

pub use article::{KeyEntities, QuizGenerationResponse, WikiArticle};
pub use quiz::{Question, Quiz, Selections};
