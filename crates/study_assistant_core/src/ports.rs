//! crates/study_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the generative-AI provider behind them.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::domain::{Flashcard, InputKind};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, quota).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A human-readable failure reported by the generation provider.
    #[error("{0}")]
    Generation(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A finite, non-restartable sequence of reply text fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = PortResult<String>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait SummarizationService: Send + Sync {
    /// Produces a summary of a URL or a block of text.
    async fn summarize(&self, kind: InputKind, content: &str) -> PortResult<String>;
}

#[async_trait]
pub trait FlashcardGenerationService: Send + Sync {
    /// Extracts an ordered list of flashcards from a summary.
    async fn extract_flashcards(&self, summary_text: &str) -> PortResult<Vec<Flashcard>>;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Opens a conversation whose answers are grounded in the given summary.
    async fn open_grounded_chat(&self, summary_text: &str) -> PortResult<Box<dyn ChatConversation>>;
}

/// A handle to one open grounded conversation.
#[async_trait]
pub trait ChatConversation: Send + Sync {
    /// Sends a user message and returns the reply as a stream of fragments.
    async fn send(&mut self, message: &str) -> PortResult<FragmentStream>;
}
