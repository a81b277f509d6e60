use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeRequest {
    pub website_url: String,
    #[serde(default)]
    pub force_scrape: bool,
}

/// Body of a successful `POST /initialize`. Only logged by clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// A text frame pushed by the server on the chat socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InboundFrame {
    Reply(ChatReply),
    Error { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reply_frame_with_sources() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"answer":"X","sources":["a","b"]}"#).expect("frame");
        assert_eq!(
            frame,
            InboundFrame::Reply(ChatReply {
                answer: "X".to_string(),
                sources: vec!["a".to_string(), "b".to_string()],
            })
        );
    }

    #[test]
    fn missing_sources_default_to_empty() {
        let frame: InboundFrame = serde_json::from_str(r#"{"answer":"hi"}"#).expect("frame");
        match frame {
            InboundFrame::Reply(reply) => assert!(reply.sources.is_empty()),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn parses_server_error_frame() {
        let frame: InboundFrame =
            serde_json::from_str(r#"{"error":"Chatbot not initialized"}"#).expect("frame");
        assert_eq!(
            frame,
            InboundFrame::Error {
                error: "Chatbot not initialized".to_string()
            }
        );
    }

    #[test]
    fn rejects_unrelated_json() {
        assert!(serde_json::from_str::<InboundFrame>(r#"{"status":"ok"}"#).is_err());
    }

    #[test]
    fn initialize_request_uses_snake_case_fields() {
        let body = serde_json::to_value(InitializeRequest {
            website_url: "https://example.com".to_string(),
            force_scrape: false,
        })
        .expect("json");
        assert_eq!(
            body,
            serde_json::json!({"website_url": "https://example.com", "force_scrape": false})
        );
    }
}
