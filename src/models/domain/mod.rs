pub mod generation;
pub mod page_content;
pub mod quiz;
pub mod quiz_question;
pub use generation::{GenerationAttempt, GenerationConfig};
pub use page_content::PageContent;
pub use quiz::Quiz;
pub use quiz_question::{Question, QuestionType};
pub use saved_test::{SavedTestRecord, UserAnswer, UserAnswers};
