//! crates/study_assistant_core/src/service.rs
//!
//! Wires the knowledge store to the generation ports. Every operation either
//! commits its result to the store or fails and leaves it untouched.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::chat::ChatSession;
use crate::domain::{
    ActiveView, FlashcardSet, InputKind, ItemKind, KnowledgeBase, LoadedItem, Note, Summary,
};
use crate::knowledge::{KnowledgeStore, FLASHCARD_SET_ID_PREFIX, SUMMARY_ID_PREFIX};
use crate::ports::{
    ChatService, FlashcardGenerationService, PortError, PortResult, SummarizationService,
};

pub struct StudyService {
    store: RwLock<KnowledgeStore>,
    summarizer: Arc<dyn SummarizationService>,
    flashcard_generator: Arc<dyn FlashcardGenerationService>,
    chat: Arc<dyn ChatService>,
}

impl StudyService {
    pub fn new(
        summarizer: Arc<dyn SummarizationService>,
        flashcard_generator: Arc<dyn FlashcardGenerationService>,
        chat: Arc<dyn ChatService>,
    ) -> Self {
        Self {
            store: RwLock::new(KnowledgeStore::new()),
            summarizer,
            flashcard_generator,
            chat,
        }
    }

    /// Summarizes a URL or text and records the result.
    pub async fn summarize(&self, kind: InputKind, content: &str) -> PortResult<Summary> {
        let content = content.trim();
        if content.is_empty() {
            return Err(PortError::InvalidInput(
                "content to summarize must not be empty".to_string(),
            ));
        }

        // The store lock is not held while the provider works.
        let summary_text = self.summarizer.summarize(kind, content).await?;

        let mut store = self.store.write().await;
        let title = match kind {
            InputKind::Url => content.to_string(),
            InputKind::Text => format!("Text Summary {}", store.summaries().len() + 1),
        };
        let summary = Summary {
            id: store.next_id(SUMMARY_ID_PREFIX),
            title,
            content: summary_text,
            source: content.to_string(),
            kind,
        };
        store.add_summary(summary.clone());
        info!("Added summary {} ({})", summary.id, kind);
        Ok(summary)
    }

    /// Generates a new flashcard set for an existing summary.
    pub async fn generate_flashcards(&self, summary_id: &str) -> PortResult<FlashcardSet> {
        let summary = self.require_summary(summary_id).await?;

        let cards = self
            .flashcard_generator
            .extract_flashcards(&summary.content)
            .await?;
        if cards.is_empty() {
            warn!("Flashcard generation for {} returned no cards", summary.id);
            return Err(PortError::Generation(
                "Failed to generate flashcards. The AI returned an empty set.".to_string(),
            ));
        }

        let mut store = self.store.write().await;
        let set = FlashcardSet {
            id: store.next_id(FLASHCARD_SET_ID_PREFIX),
            summary_id: summary.id,
            title: summary.title,
            cards,
        };
        store.add_flashcard_set(set.clone());
        info!(
            "Added flashcard set {} with {} cards for summary {}",
            set.id,
            set.cards.len(),
            set.summary_id
        );
        Ok(set)
    }

    /// Creates or updates the single note attached to a summary.
    pub async fn save_note(&self, summary_id: &str, content: &str) -> PortResult<Note> {
        if content.trim().is_empty() {
            return Err(PortError::InvalidInput("note content must not be empty".to_string()));
        }
        let mut store = self.store.write().await;
        if store.find_summary_by_id(summary_id).is_none() {
            return Err(PortError::NotFound(format!("summary {}", summary_id)));
        }
        Ok(store.upsert_note(summary_id, content))
    }

    /// Reopens an item from the knowledge base and reports what becomes active.
    pub async fn load_item(&self, kind: ItemKind, id: &str) -> PortResult<LoadedItem> {
        let store = self.store.read().await;
        let loaded = match kind {
            ItemKind::Summary => {
                let summary = store
                    .find_summary_by_id(id)
                    .ok_or_else(|| PortError::NotFound(format!("summary {}", id)))?;
                LoadedItem {
                    summary: Some(summary.clone()),
                    flashcards: Vec::new(),
                    note: None,
                    view: ActiveView::Summary,
                }
            }
            ItemKind::Flashcards => {
                let set = store
                    .find_flashcard_set_by_id(id)
                    .ok_or_else(|| PortError::NotFound(format!("flashcard set {}", id)))?;
                LoadedItem {
                    summary: store.resolve_parent_summary(set).cloned(),
                    flashcards: set.cards.clone(),
                    note: None,
                    view: ActiveView::Flashcards,
                }
            }
            ItemKind::Note => {
                let note = store
                    .find_note_by_id(id)
                    .ok_or_else(|| PortError::NotFound(format!("note {}", id)))?;
                LoadedItem {
                    summary: store.resolve_parent_summary(note).cloned(),
                    flashcards: Vec::new(),
                    note: Some(note.clone()),
                    view: ActiveView::Notes,
                }
            }
        };
        if loaded.summary.is_none() {
            warn!("Item {} refers to a summary that is no longer available", id);
        }
        Ok(loaded)
    }

    /// Opens a chat grounded in the given summary.
    pub async fn open_chat(&self, summary_id: &str) -> PortResult<ChatSession> {
        let summary = self.require_summary(summary_id).await?;
        let conversation = self.chat.open_grounded_chat(&summary.content).await?;
        info!("Opened grounded chat for summary {}", summary.id);
        Ok(ChatSession::new(summary.id, conversation))
    }

    pub async fn find_summary(&self, summary_id: &str) -> Option<Summary> {
        self.store
            .read()
            .await
            .find_summary_by_id(summary_id)
            .cloned()
    }

    pub async fn knowledge_base(&self) -> KnowledgeBase {
        self.store.read().await.snapshot()
    }

    async fn require_summary(&self, summary_id: &str) -> PortResult<Summary> {
        self.find_summary(summary_id)
            .await
            .ok_or_else(|| PortError::NotFound(format!("summary {}", summary_id)))
    }
}
