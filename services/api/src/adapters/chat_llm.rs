//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the grounded chat LLM.
//! It implements the `ChatService` and `ChatConversation` ports from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::{fmt, future::Future, sync::Arc};
use study_assistant_core::ports::{
    ChatConversation, ChatService, FragmentStream, PortError, PortResult,
};
use tokio::sync::Mutex;
use tracing::{error, info};

const CHAT_FAILED: &str = "Failed to get response from chat.";

/// The system instruction that grounds a conversation in a summary.
pub fn grounding_instructions(summary_text: &str) -> String {
    format!(
        "You are a helpful AI assistant. The user has just read the following summary and wants \
         to discuss it. Your knowledge is now grounded in this summary. Answer the user's questions \
         based on this context. Do not mention that you are an AI. Be conversational and helpful.\
         \n\nSUMMARY:\n---\n{}\n---",
        summary_text
    )
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl ChatService for OpenAiChatAdapter {
    async fn open_grounded_chat(&self, summary_text: &str) -> PortResult<Box<dyn ChatConversation>> {
        let system: ChatCompletionRequestMessage = ChatCompletionRequestSystemMessageArgs::default()
            .content(grounding_instructions(summary_text))
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into();

        Ok(Box::new(OpenAiConversation {
            client: self.client.clone(),
            model: self.model.clone(),
            history: ConversationHistory::new(system),
        }))
    }
}

//=========================================================================================
// Conversation History
//=========================================================================================

/// The provider-side message history of one conversation, shared with the
/// reply streams it hands out.
///
/// A user turn is recorded when a reply is requested and dropped again if the
/// reply cannot be opened or fails mid-stream. The assistant turn is recorded
/// only once its stream has been fully drained.
#[derive(Clone)]
pub struct ConversationHistory {
    messages: Arc<Mutex<Vec<ChatCompletionRequestMessage>>>,
}

impl ConversationHistory {
    pub fn new(system: ChatCompletionRequestMessage) -> Self {
        Self {
            messages: Arc::new(Mutex::new(vec![system])),
        }
    }

    pub async fn messages(&self) -> Vec<ChatCompletionRequestMessage> {
        self.messages.lock().await.clone()
    }

    /// Records `user`, opens a reply over the full history with `open`, and
    /// returns its text deltas as a fragment stream.
    pub async fn exchange<F, Fut, S, E>(
        &self,
        user: ChatCompletionRequestMessage,
        open: F,
    ) -> PortResult<FragmentStream>
    where
        F: FnOnce(Vec<ChatCompletionRequestMessage>) -> Fut,
        Fut: Future<Output = Result<S, E>>,
        S: Stream<Item = Result<String, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let messages = {
            let mut history = self.messages.lock().await;
            history.push(user);
            history.clone()
        };

        match open(messages).await {
            Ok(deltas) => Ok(self.track_reply(deltas)),
            Err(e) => {
                error!("Error opening chat stream: {}", e);
                self.messages.lock().await.pop();
                Err(PortError::Generation(CHAT_FAILED.to_string()))
            }
        }
    }

    fn track_reply<S, E>(&self, deltas: S) -> FragmentStream
    where
        S: Stream<Item = Result<String, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let history = self.messages.clone();
        let fragments = async_stream::stream! {
            let mut deltas = Box::pin(deltas);
            let mut reply = String::new();
            while let Some(delta) = deltas.next().await {
                match delta {
                    Ok(text) if text.is_empty() => {}
                    Ok(text) => {
                        reply.push_str(&text);
                        yield Ok(text);
                    }
                    Err(e) => {
                        error!("Chat stream failed: {}", e);
                        history.lock().await.pop();
                        yield Err(PortError::Generation(CHAT_FAILED.to_string()));
                        return;
                    }
                }
            }

            info!("Chat reply finished ({} chars)", reply.len());
            match ChatCompletionRequestAssistantMessageArgs::default()
                .content(reply)
                .build()
            {
                Ok(assistant) => history.lock().await.push(assistant.into()),
                Err(e) => error!("Failed to record chat reply in history: {}", e),
            }
        };

        Box::pin(fragments)
    }
}

//=========================================================================================
// One Open Conversation
//=========================================================================================

pub struct OpenAiConversation {
    client: Client<OpenAIConfig>,
    model: String,
    history: ConversationHistory,
}

#[async_trait]
impl ChatConversation for OpenAiConversation {
    async fn send(&mut self, message: &str) -> PortResult<FragmentStream> {
        let user: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(message)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .into();

        let client = self.client.clone();
        let model = self.model.clone();
        self.history
            .exchange(user, move |messages| async move {
                let request = CreateChatCompletionRequestArgs::default()
                    .model(model)
                    .messages(messages)
                    .stream(true)
                    .build()?;
                let upstream = client.chat().create_stream(request).await?;
                Ok::<_, OpenAIError>(upstream.map(|chunk| {
                    chunk.map(|response| {
                        response
                            .choices
                            .into_iter()
                            .filter_map(|choice| choice.delta.content)
                            .collect::<String>()
                    })
                }))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> ConversationHistory {
        let system: ChatCompletionRequestMessage = ChatCompletionRequestSystemMessageArgs::default()
            .content(grounding_instructions("Mitochondria make ATP."))
            .build()
            .unwrap()
            .into();
        ConversationHistory::new(system)
    }

    fn user(text: &str) -> ChatCompletionRequestMessage {
        ChatCompletionRequestUserMessageArgs::default()
            .content(text)
            .build()
            .unwrap()
            .into()
    }

    #[test]
    fn test_grounding_embeds_summary() {
        let instructions = grounding_instructions("Mitochondria make ATP.");
        assert!(instructions.contains("SUMMARY:\n---\nMitochondria make ATP.\n---"));
        assert!(instructions.starts_with("You are a helpful AI assistant."));
    }

    #[tokio::test]
    async fn test_assistant_turn_recorded_after_stream_drained() {
        let history = history();
        let deltas: Vec<Result<String, String>> =
            vec![Ok("Hel".to_string()), Ok(String::new()), Ok("lo".to_string())];

        let mut fragments = history
            .exchange(user("hi"), |messages| async move {
                assert_eq!(messages.len(), 2);
                Ok::<_, String>(futures::stream::iter(deltas))
            })
            .await
            .unwrap();

        assert_eq!(fragments.next().await.unwrap().unwrap(), "Hel");
        assert_eq!(history.messages().await.len(), 2);
        assert_eq!(fragments.next().await.unwrap().unwrap(), "lo");
        assert!(fragments.next().await.is_none());

        let messages = history.messages().await;
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
    }

    #[tokio::test]
    async fn test_mid_stream_error_drops_user_turn() {
        let history = history();
        let deltas: Vec<Result<String, String>> =
            vec![Ok("par".to_string()), Err("connection reset".to_string())];

        let mut fragments = history
            .exchange(user("hi"), |_| async move {
                Ok::<_, String>(futures::stream::iter(deltas))
            })
            .await
            .unwrap();

        assert_eq!(fragments.next().await.unwrap().unwrap(), "par");
        let err = fragments.next().await.unwrap().unwrap_err();
        assert_eq!(err, PortError::Generation(CHAT_FAILED.to_string()));
        assert!(fragments.next().await.is_none());
        assert_eq!(history.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_drops_user_turn() {
        let history = history();

        let err = history
            .exchange(user("hi"), |_| async move {
                Err::<futures::stream::Empty<Result<String, String>>, _>("refused".to_string())
            })
            .await
            .err()
            .unwrap();

        assert_eq!(err, PortError::Generation(CHAT_FAILED.to_string()));
        assert_eq!(history.messages().await.len(), 1);

        // The next turn is sent without the failed one.
        history
            .exchange(user("again"), |messages| async move {
                assert_eq!(messages.len(), 2);
                Ok::<_, String>(futures::stream::empty::<Result<String, String>>())
            })
            .await
            .unwrap();
    }
}
