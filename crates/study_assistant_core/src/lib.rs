pub mod chat;
pub mod domain;
pub mod knowledge;
pub mod ports;
pub mod service;

pub use chat::{ChatSession, ChatTranscript};
pub use domain::{
    ActiveView, ChatMessage, ChatRole, DerivedFromSummary, Flashcard, FlashcardSet, InputKind,
    ItemKind, KnowledgeBase, LoadedItem, Note, Summary,
};
pub use knowledge::KnowledgeStore;
pub use ports::{
    ChatConversation, ChatService, FlashcardGenerationService, FragmentStream, PortError,
    PortResult, SummarizationService,
};
pub use service::StudyService;
