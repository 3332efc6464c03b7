//! services/api/src/adapters/flashcards_llm.rs
//!
//! This module contains the adapter for the flashcard-extracting LLM.
//! It implements the `FlashcardGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use study_assistant_core::{
    domain::Flashcard,
    ports::{FlashcardGenerationService, PortError, PortResult},
};
use tracing::{error, info};

const FLASHCARDS_FAILED: &str =
    "Failed to generate flashcards. The AI couldn't structure the data as requested.";

const SYSTEM_INSTRUCTIONS: &str = r#"You turn study material into flashcards.
Respond with ONLY a JSON object of this exact shape and nothing else:
{"flashcards": [{"front": "...", "back": "..."}]}
- "front": a question, term, or concept from the text.
- "back": the answer or definition corresponding to the "front"."#;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").expect("code fence pattern is valid")
});

#[derive(Deserialize)]
struct FlashcardRecord {
    front: String,
    back: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlashcardPayload {
    Wrapped { flashcards: Vec<FlashcardRecord> },
    Bare(Vec<FlashcardRecord>),
}

/// Parses the model's structured output into flashcards.
///
/// Accepts `{"flashcards": [...]}` or a bare array, optionally wrapped in a
/// Markdown code fence. Cards with a blank side are dropped.
pub fn parse_flashcards(raw: &str) -> Result<Vec<Flashcard>, serde_json::Error> {
    let trimmed = raw.trim();
    let json = CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());

    let records = match serde_json::from_str::<FlashcardPayload>(json)? {
        FlashcardPayload::Wrapped { flashcards } => flashcards,
        FlashcardPayload::Bare(cards) => cards,
    };

    Ok(records
        .into_iter()
        .filter(|r| !r.front.trim().is_empty() && !r.back.trim().is_empty())
        .map(|r| Flashcard::new(r.front.trim(), r.back.trim()))
        .collect())
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `FlashcardGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiFlashcardsAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiFlashcardsAdapter {
    /// Creates a new `OpenAiFlashcardsAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `FlashcardGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl FlashcardGenerationService for OpenAiFlashcardsAdapter {
    async fn extract_flashcards(&self, summary_text: &str) -> PortResult<Vec<Flashcard>> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!(
                    "Based on the following summary, create a set of flashcards. Each flashcard should \
                     have a 'front' with a key concept, question, or term, and a 'back' with a concise \
                     answer or definition. Provide at least 5 flashcards.\n\nSUMMARY: \"{}\"",
                    summary_text
                ))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| {
                error!("Error generating flashcards: {}", e);
                PortError::Generation(FLASHCARDS_FAILED.to_string())
            })?;

        let raw = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                error!("Flashcard LLM response contained no text content.");
                PortError::Generation(FLASHCARDS_FAILED.to_string())
            })?;

        let cards = parse_flashcards(&raw).map_err(|e| {
            error!("Flashcard LLM returned malformed JSON: {}", e);
            PortError::Generation(FLASHCARDS_FAILED.to_string())
        })?;

        info!("Extracted {} flashcards", cards.len());
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_object() {
        let raw = r#"{"flashcards": [{"front": "What is ATP?", "back": "Energy currency"}]}"#;
        let cards = parse_flashcards(raw).unwrap();
        assert_eq!(cards, vec![Flashcard::new("What is ATP?", "Energy currency")]);
    }

    #[test]
    fn test_parse_bare_array_in_code_fence() {
        let raw = "```json\n[{\"front\": \"A\", \"back\": \"1\"}, {\"front\": \"B\", \"back\": \"2\"}]\n```";
        let cards = parse_flashcards(raw).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1], Flashcard::new("B", "2"));
    }

    #[test]
    fn test_blank_cards_are_dropped() {
        let raw = r#"[{"front": "  ", "back": "x"}, {"front": " Term ", "back": " Def "}]"#;
        let cards = parse_flashcards(raw).unwrap();
        assert_eq!(cards, vec![Flashcard::new("Term", "Def")]);
    }

    #[test]
    fn test_prose_is_rejected() {
        assert!(parse_flashcards("Here are your flashcards!").is_err());
        assert!(parse_flashcards(r#"{"cards": []}"#).is_err());
    }
}
