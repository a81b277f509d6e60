use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    #[error("server rejected request with status {status}")]
    Rejected { status: u16, detail: Option<String> },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket failure: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("invalid server url '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
    #[error("chat stream is closed")]
    StreamClosed,
}

impl ClientError {
    /// Detail text supplied by the server, if the failure carried one.
    pub fn server_detail(&self) -> Option<&str> {
        match self {
            ClientError::Rejected {
                detail: Some(detail),
                ..
            } => Some(detail.as_str()),
            _ => None,
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
