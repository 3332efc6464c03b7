pub mod chat_llm;
pub mod flashcards_llm;
pub mod summary_llm;

pub use chat_llm::OpenAiChatAdapter;
pub use flashcards_llm::OpenAiFlashcardsAdapter;
pub use summary_llm::OpenAiSummaryAdapter;
