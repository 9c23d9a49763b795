pub mod db;
pub mod enhance_llm;
pub mod feedback_llm;
pub mod learning_path_llm;
pub mod llm;
pub mod memory_identity;
pub mod notes_llm;
pub mod quiz_llm;

pub use db::DbAdapter;
pub use enhance_llm::OpenAiEnhanceAdapter;
pub use feedback_llm::OpenAiFeedbackAdapter;
pub use learning_path_llm::OpenAiLearningPathAdapter;
pub use llm::PromptRunner;
pub use memory_identity::InMemoryIdentityStore;
pub use notes_llm::OpenAiNotesAdapter;
pub use quiz_llm::OpenAiQuizAdapter;
