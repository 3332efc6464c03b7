//! crates/study_assistant_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// The kind of input a summary was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Url,
    Text,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Url => "url",
            InputKind::Text => "text",
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An AI-generated summary of a URL or a block of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub id: String,
    pub title: String,
    pub content: String,
    /// The original URL or raw text that was summarized.
    pub source: String,
    pub kind: InputKind,
}

/// A single question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

impl Flashcard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
        }
    }
}

/// An ordered set of flashcards derived from one summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardSet {
    pub id: String,
    pub summary_id: String,
    /// Copied from the parent summary at creation time.
    pub title: String,
    pub cards: Vec<Flashcard>,
}

/// Free-text notes attached to at most one summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub summary_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Anything that points back at the summary it was derived from.
pub trait DerivedFromSummary {
    fn summary_id(&self) -> &str;
}

impl DerivedFromSummary for FlashcardSet {
    fn summary_id(&self) -> &str {
        &self.summary_id
    }
}

impl DerivedFromSummary for Note {
    fn summary_id(&self) -> &str {
        &self.summary_id
    }
}

/// Every summary, flashcard set and note accumulated during a session.
/// Each collection is ordered most-recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    pub summaries: Vec<Summary>,
    pub flashcard_sets: Vec<FlashcardSet>,
    pub notes: Vec<Note>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

/// One message in a grounded chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Which pane the presentation layer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    Summary,
    Chat,
    Flashcards,
    Notes,
}

/// The kinds of item that can be reopened from the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Summary,
    Flashcards,
    Note,
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(ItemKind::Summary),
            "flashcards" => Ok(ItemKind::Flashcards),
            "note" => Ok(ItemKind::Note),
            other => Err(format!("unknown item kind '{}'", other)),
        }
    }
}

/// What becomes active after reopening an item from the knowledge base.
///
/// `summary` is `None` when a flashcard set or note points at a summary that
/// is not in the store; callers show the item without a summary pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedItem {
    pub summary: Option<Summary>,
    pub flashcards: Vec<Flashcard>,
    pub note: Option<Note>,
    pub view: ActiveView,
}
