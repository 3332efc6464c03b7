//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for grounded chat about a summary.

use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Opens a chat grounded in the given summary. This must be the first message
    /// sent on the connection.
    Init { summary_id: String },

    /// A user message. The next one is only read once the reply has finished.
    SendMessage { message: String },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the conversation is open.
    ChatInitialized { summary_id: String },

    /// Reports an error to the client, which should display the message.
    Error { message: String },

    /// The model has started replying; the UI can show a placeholder bubble.
    ReplyStarted,

    /// The next piece of the reply, to be appended to the placeholder.
    ReplyFragment { text: String },

    /// The reply is complete.
    ReplyEnded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_messages_are_tagged() {
        let init: ClientMessage =
            serde_json::from_str(r#"{"type": "init", "summary_id": "sum_1"}"#).unwrap();
        assert_eq!(
            init,
            ClientMessage::Init {
                summary_id: "sum_1".to_string()
            }
        );

        let send: ClientMessage =
            serde_json::from_str(r#"{"type": "send_message", "message": "why?"}"#).unwrap();
        assert_eq!(
            send,
            ClientMessage::SendMessage {
                message: "why?".to_string()
            }
        );
    }

    #[test]
    fn test_server_messages_are_tagged() {
        let json = serde_json::to_value(ServerMessage::ReplyFragment {
            text: "Hi".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "reply_fragment", "text": "Hi"}));

        let json = serde_json::to_value(ServerMessage::ReplyEnded).unwrap();
        assert_eq!(json, serde_json::json!({"type": "reply_ended"}));
    }
}
