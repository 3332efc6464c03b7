//! crates/study_assistant_core/src/knowledge.rs
//!
//! The in-memory knowledge store. Summaries and flashcard sets are prepended
//! on creation; notes are prepended on creation but updated in place.

use chrono::{DateTime, Utc};

use crate::domain::{DerivedFromSummary, FlashcardSet, KnowledgeBase, Note, Summary};

pub const SUMMARY_ID_PREFIX: &str = "sum";
pub const FLASHCARD_SET_ID_PREFIX: &str = "fc";
pub const NOTE_ID_PREFIX: &str = "note";

/// Owns the knowledge base for the lifetime of the process.
#[derive(Debug, Default)]
pub struct KnowledgeStore {
    base: KnowledgeBase,
    /// Last millisecond stamp handed out by `next_id_at`.
    last_stamp: i64,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues an id of the form `<prefix>_<millis>`. Stamps are strictly
    /// increasing across all prefixes, so ids never collide.
    pub fn next_id_at(&mut self, prefix: &str, now: DateTime<Utc>) -> String {
        let stamp = now.timestamp_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;
        format!("{}_{}", prefix, stamp)
    }

    pub fn next_id(&mut self, prefix: &str) -> String {
        self.next_id_at(prefix, Utc::now())
    }

    // --- Writes ---

    pub fn add_summary(&mut self, summary: Summary) {
        self.base.summaries.insert(0, summary);
    }

    /// The parent reference is not checked here; `resolve_parent_summary`
    /// tolerates dangling ids on read.
    pub fn add_flashcard_set(&mut self, set: FlashcardSet) {
        self.base.flashcard_sets.insert(0, set);
    }

    pub fn upsert_note(&mut self, summary_id: &str, content: &str) -> Note {
        self.upsert_note_at(summary_id, content, Utc::now())
    }

    /// Updates the note for `summary_id` in place, or prepends a new one.
    pub fn upsert_note_at(&mut self, summary_id: &str, content: &str, now: DateTime<Utc>) -> Note {
        if let Some(existing) = self
            .base
            .notes
            .iter_mut()
            .find(|n| n.summary_id == summary_id)
        {
            existing.content = content.to_string();
            existing.updated_at = now;
            return existing.clone();
        }

        let title = match self.find_summary_by_id(summary_id) {
            Some(summary) => format!("Notes for \"{}\"", summary.title),
            None => format!("Notes for \"{}\"", summary_id),
        };
        let note = Note {
            id: self.next_id_at(NOTE_ID_PREFIX, now),
            summary_id: summary_id.to_string(),
            title,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.base.notes.insert(0, note.clone());
        note
    }

    // --- Lookups ---

    pub fn find_summary_by_id(&self, id: &str) -> Option<&Summary> {
        self.base.summaries.iter().find(|s| s.id == id)
    }

    pub fn find_flashcard_set_by_id(&self, id: &str) -> Option<&FlashcardSet> {
        self.base.flashcard_sets.iter().find(|f| f.id == id)
    }

    pub fn find_note_by_id(&self, id: &str) -> Option<&Note> {
        self.base.notes.iter().find(|n| n.id == id)
    }

    pub fn find_note_for_summary(&self, summary_id: &str) -> Option<&Note> {
        self.base.notes.iter().find(|n| n.summary_id == summary_id)
    }

    /// Returns the summary an item was derived from, or `None` if it is gone.
    pub fn resolve_parent_summary<T: DerivedFromSummary>(&self, item: &T) -> Option<&Summary> {
        self.find_summary_by_id(item.summary_id())
    }

    pub fn summaries(&self) -> &[Summary] {
        &self.base.summaries
    }

    pub fn flashcard_sets(&self) -> &[FlashcardSet] {
        &self.base.flashcard_sets
    }

    pub fn notes(&self) -> &[Note] {
        &self.base.notes
    }

    /// An owned copy of the three collections for rendering.
    pub fn snapshot(&self) -> KnowledgeBase {
        self.base.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Flashcard, InputKind};
    use chrono::{Duration, TimeZone};

    fn summary(id: &str, title: &str) -> Summary {
        Summary {
            id: id.to_string(),
            title: title.to_string(),
            content: format!("content of {}", title),
            source: "some text".to_string(),
            kind: InputKind::Text,
        }
    }

    fn flashcard_set(id: &str, summary_id: &str) -> FlashcardSet {
        FlashcardSet {
            id: id.to_string(),
            summary_id: summary_id.to_string(),
            title: "Summary 1".to_string(),
            cards: vec![Flashcard::new("Q1", "A1"), Flashcard::new("Q2", "A2")],
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_add_summary_prepends() {
        let mut store = KnowledgeStore::new();
        for i in 0..5 {
            let id = format!("sum_{}", i);
            store.add_summary(summary(&id, "s"));
            assert_eq!(store.summaries().len(), i + 1);
            assert_eq!(store.summaries()[0].id, id);
        }
    }

    #[test]
    fn test_upsert_note_updates_in_place() {
        let mut store = KnowledgeStore::new();
        store.add_summary(summary("sum_1", "Summary 1"));

        let first = store.upsert_note_at("sum_1", "c1", t0());
        let later = t0() + Duration::seconds(30);
        let second = store.upsert_note_at("sum_1", "c2", later);

        assert_eq!(store.notes().len(), 1);
        assert_eq!(first.id, second.id);
        assert_eq!(store.notes()[0].content, "c2");
        assert_eq!(store.notes()[0].created_at, t0());
        assert_eq!(store.notes()[0].updated_at, later);
        assert_eq!(second.title, "Notes for \"Summary 1\"");
    }

    #[test]
    fn test_upsert_note_does_not_reorder_on_update() {
        let mut store = KnowledgeStore::new();
        store.upsert_note_at("sum_a", "a", t0());
        store.upsert_note_at("sum_b", "b", t0());
        assert_eq!(store.notes()[0].summary_id, "sum_b");

        store.upsert_note_at("sum_a", "a2", t0() + Duration::seconds(1));

        assert_eq!(store.notes().len(), 2);
        assert_eq!(store.notes()[0].summary_id, "sum_b");
        assert_eq!(store.notes()[1].summary_id, "sum_a");
        assert_eq!(store.notes()[1].content, "a2");
        assert_eq!(store.notes()[0].content, "b");
    }

    #[test]
    fn test_upsert_note_distinct_summaries_get_distinct_notes() {
        let mut store = KnowledgeStore::new();
        let a = store.upsert_note_at("sum_a", "a", t0());
        let b = store.upsert_note_at("sum_b", "b", t0());
        assert_ne!(a.id, b.id);

        store.upsert_note_at("sum_b", "b2", t0());
        assert_eq!(store.find_note_by_id(&a.id).unwrap().content, "a");
        assert_eq!(store.find_note_by_id(&b.id).unwrap().content, "b2");
    }

    #[test]
    fn test_note_title_falls_back_to_summary_id() {
        let mut store = KnowledgeStore::new();
        let note = store.upsert_note_at("sum_missing", "x", t0());
        assert_eq!(note.title, "Notes for \"sum_missing\"");
    }

    #[test]
    fn test_find_summary_by_id() {
        let mut store = KnowledgeStore::new();
        store.add_summary(summary("sum_1", "one"));
        store.add_summary(summary("sum_2", "two"));

        assert_eq!(store.find_summary_by_id("sum_1").unwrap().title, "one");
        assert_eq!(store.find_summary_by_id("sum_2").unwrap().title, "two");
        assert!(store.find_summary_by_id("sum_3").is_none());
    }

    #[test]
    fn test_resolve_parent_summary_tolerates_dangling_reference() {
        let mut store = KnowledgeStore::new();
        let orphan = flashcard_set("fc_1", "sum_never");
        store.add_flashcard_set(orphan.clone());

        assert!(store.resolve_parent_summary(&orphan).is_none());
        assert!(store.find_flashcard_set_by_id("fc_1").is_some());
    }

    #[test]
    fn test_ids_are_unique_within_one_millisecond() {
        let mut store = KnowledgeStore::new();
        let a = store.next_id_at(SUMMARY_ID_PREFIX, t0());
        let b = store.next_id_at(SUMMARY_ID_PREFIX, t0());
        let c = store.next_id_at(FLASHCARD_SET_ID_PREFIX, t0());

        assert_eq!(a, format!("sum_{}", t0().timestamp_millis()));
        assert_eq!(b, format!("sum_{}", t0().timestamp_millis() + 1));
        assert_eq!(c, format!("fc_{}", t0().timestamp_millis() + 2));
    }

    #[test]
    fn test_knowledge_base_scenario() {
        let mut store = KnowledgeStore::new();

        let s1 = summary("sum_1", "Summary 1");
        store.add_summary(s1.clone());
        assert_eq!(store.summaries().len(), 1);

        let f1 = flashcard_set("fc_1", "sum_1");
        store.add_flashcard_set(f1.clone());
        assert_eq!(store.flashcard_sets().len(), 1);
        assert_eq!(store.resolve_parent_summary(&f1), Some(&s1));

        store.upsert_note_at("sum_1", "remember X", t0());
        assert_eq!(store.notes().len(), 1);
        assert_eq!(store.notes()[0].content, "remember X");

        store.upsert_note_at("sum_1", "remember Y", t0() + Duration::minutes(1));
        assert_eq!(store.notes().len(), 1);
        assert_eq!(store.notes()[0].content, "remember Y");
        assert_eq!(store.find_note_for_summary("sum_1"), Some(&store.notes()[0]));

        let s2 = summary("sum_2", "Summary 2");
        store.add_summary(s2.clone());
        let snapshot = store.snapshot();
        assert_eq!(snapshot.summaries, vec![s2, s1]);
    }
}
