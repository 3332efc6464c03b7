//! crates/study_assistant_core/src/chat.rs
//!
//! The transcript of a grounded chat and the session that drives it.

use crate::domain::{ChatMessage, ChatRole};
use crate::ports::{ChatConversation, FragmentStream, PortResult};

/// Ordered user/model messages of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the user message followed by an empty model placeholder that
    /// reply fragments are accumulated into.
    pub fn begin_exchange(&mut self, message: &str) {
        self.messages.push(ChatMessage {
            role: ChatRole::User,
            content: message.to_string(),
        });
        self.messages.push(ChatMessage {
            role: ChatRole::Model,
            content: String::new(),
        });
    }

    pub fn append_fragment(&mut self, text: &str) {
        match self.messages.last_mut() {
            Some(last) if last.role == ChatRole::Model => last.content.push_str(text),
            _ => self.messages.push(ChatMessage {
                role: ChatRole::Model,
                content: text.to_string(),
            }),
        }
    }

    /// Drops the trailing model placeholder after a failed reply.
    pub fn abandon_reply(&mut self) {
        if matches!(self.messages.last(), Some(m) if m.role == ChatRole::Model) {
            self.messages.pop();
        }
    }

    /// Removes the whole last exchange, used when no reply stream was opened.
    pub fn retract_exchange(&mut self) {
        self.abandon_reply();
        if matches!(self.messages.last(), Some(m) if m.role == ChatRole::User) {
            self.messages.pop();
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The reply currently being built or last completed.
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == ChatRole::Model)
            .map(|m| m.content.as_str())
    }
}

/// A grounded conversation about one summary.
pub struct ChatSession {
    summary_id: String,
    conversation: Box<dyn ChatConversation>,
    transcript: ChatTranscript,
}

impl ChatSession {
    pub fn new(summary_id: String, conversation: Box<dyn ChatConversation>) -> Self {
        Self {
            summary_id,
            conversation,
            transcript: ChatTranscript::new(),
        }
    }

    pub fn summary_id(&self) -> &str {
        &self.summary_id
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    /// Starts an exchange and returns the reply stream. The caller feeds each
    /// fragment back through `record_fragment`, or calls `fail_reply`.
    /// If the stream cannot be opened the exchange leaves no trace.
    pub async fn send(&mut self, message: &str) -> PortResult<FragmentStream> {
        self.transcript.begin_exchange(message);
        match self.conversation.send(message).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                self.transcript.retract_exchange();
                Err(e)
            }
        }
    }

    pub fn record_fragment(&mut self, text: &str) {
        self.transcript.append_fragment(text);
    }

    pub fn fail_reply(&mut self) {
        self.transcript.abandon_reply();
    }
}
