//! services/api/src/adapters/summary_llm.rs
//!
//! This module contains the adapter for the summarizing LLM.
//! It implements the `SummarizationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use study_assistant_core::{
    domain::InputKind,
    ports::{PortError, PortResult, SummarizationService},
};
use tracing::{error, info};

const SUMMARY_FAILED: &str = "Failed to generate summary. Please check your input and try again.";

/// Builds the prompt for the given kind of input.
pub fn summary_prompt(kind: InputKind, content: &str) -> String {
    match kind {
        InputKind::Url => format!(
            "Please provide a detailed, well-structured summary of the content at this URL: {}. \
             Focus on extracting key points, main ideas, and any crucial details or context. \
             If the content is scholarly or academic, provide a summary suitable for research purposes.",
            content
        ),
        InputKind::Text => format!(
            "Please provide a detailed, well-structured summary of the following text. \
             Focus on extracting key points, main ideas, and any crucial details or context. \
             If the content is scholarly or academic, provide a summary suitable for research purposes.\
             \n\nTEXT: \"{}\"",
            content
        ),
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `SummarizationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiSummaryAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSummaryAdapter {
    /// Creates a new `OpenAiSummaryAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `SummarizationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SummarizationService for OpenAiSummaryAdapter {
    async fn summarize(&self, kind: InputKind, content: &str) -> PortResult<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(summary_prompt(kind, content))
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into()];

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
                error!("Error summarizing content: {}", e);
                PortError::Generation(SUMMARY_FAILED.to_string())
            })?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                error!("Summary LLM response contained no text content.");
                PortError::Generation(SUMMARY_FAILED.to_string())
            })?;

        info!("Generated {} summary of {} chars", kind, text.len());
        Ok(text)
    }
}
