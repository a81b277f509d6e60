use std::sync::Arc;

use shared::{domain::ChatMessage, protocol::InitializeRequest};
use tracing::{debug, error, info, warn};
use url::Url;

pub mod error;
pub mod initializer;
pub mod transport;
pub mod view;

pub use error::{ClientError, ClientResult};
pub use initializer::{HttpInitializer, Initializer};
pub use transport::{
    chat_endpoint, ChatStream, StreamConnection, StreamConnector, StreamEvent, Subscription,
    WsConnector,
};
pub use view::{ChatView, RenderedMessage};

pub const NOTICE_MISSING_URL: &str = "Please enter a website URL";
pub const NOTICE_INIT_FAILED: &str = "Error initializing chatbot";
pub const NOTICE_STREAM_ERROR: &str = "Error connecting to chat server";
pub const NOTICE_NOT_CONNECTED: &str = "Chat connection not available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Chatting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was blank; nothing rendered or sent.
    Empty,
    Sent,
    /// Rendered locally but not transmitted.
    Dropped,
}

struct ChatSession {
    stream: Box<dyn ChatStream>,
    events: Option<Subscription>,
}

/// Drives one chat page: setup form, initialization call, chat stream and log.
pub struct ChatController<V: ChatView> {
    view: V,
    initializer: Arc<dyn Initializer>,
    connector: Arc<dyn StreamConnector>,
    chat_endpoint: Url,
    phase: Phase,
    session: Option<ChatSession>,
}

impl<V: ChatView> ChatController<V> {
    pub fn new(
        view: V,
        initializer: Arc<dyn Initializer>,
        connector: Arc<dyn StreamConnector>,
        chat_endpoint: Url,
    ) -> Self {
        Self {
            view,
            initializer,
            connector,
            chat_endpoint,
            phase: Phase::Setup,
            session: None,
        }
    }

    /// Controller talking HTTP and WebSocket to the chatbot server at `server_url`.
    pub fn for_server(view: V, server_url: &Url) -> ClientResult<Self> {
        Ok(Self::new(
            view,
            Arc::new(HttpInitializer::new(server_url)?),
            Arc::new(WsConnector),
            chat_endpoint(server_url)?,
        ))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn is_stream_open(&self) -> bool {
        self.session
            .as_ref()
            .map(|session| session.stream.is_open())
            .unwrap_or(false)
    }

    pub async fn submit_initialization(&mut self) -> ClientResult<()> {
        if self.phase == Phase::Chatting {
            warn!("initialize: already chatting, ignoring resubmission");
            return Ok(());
        }

        let website_url = self.view.website_url().trim().to_string();
        if website_url.is_empty() {
            self.view.notify(NOTICE_MISSING_URL);
            return Err(ClientError::Validation(NOTICE_MISSING_URL.to_string()));
        }
        let request = InitializeRequest {
            website_url,
            force_scrape: self.view.force_scrape(),
        };

        self.view.show_loading();
        let result = self.initializer.initialize(&request).await;
        self.view.hide_loading();

        match result {
            Ok(_) => {
                info!(
                    website_url = %request.website_url,
                    force_scrape = request.force_scrape,
                    "initialize: chatbot ready"
                );
                self.view.show_chat_view();
                self.phase = Phase::Chatting;
                // Stream failures are reported to the view; initialization itself succeeded.
                let _ = self.open_stream().await;
                Ok(())
            }
            Err(err) => {
                error!(%err, website_url = %request.website_url, "initialize: failed");
                let notice = match err.server_detail() {
                    Some(detail) => format!("Error: {detail}"),
                    None => NOTICE_INIT_FAILED.to_string(),
                };
                self.view.notify(&notice);
                Err(err)
            }
        }
    }

    pub async fn open_stream(&mut self) -> ClientResult<()> {
        if let Some(previous) = self.session.take() {
            previous.stream.close().await;
        }

        match self.connector.connect(&self.chat_endpoint).await {
            Ok(connection) => {
                debug!(endpoint = %self.chat_endpoint, "chat stream: subscribed");
                self.session = Some(ChatSession {
                    stream: connection.stream,
                    events: Some(connection.events),
                });
                Ok(())
            }
            Err(err) => {
                error!(%err, endpoint = %self.chat_endpoint, "chat stream: connect failed");
                self.view.notify(NOTICE_STREAM_ERROR);
                Err(err)
            }
        }
    }

    pub async fn send_message(&mut self) -> SendOutcome {
        let message = self.view.message_input().trim().to_string();
        if message.is_empty() {
            return SendOutcome::Empty;
        }

        self.render_message(&ChatMessage::user(message.clone()));

        let outcome = match self.session.as_ref() {
            Some(session) if session.stream.is_open() => {
                match session.stream.send_text(&message).await {
                    Ok(()) => SendOutcome::Sent,
                    Err(err) => {
                        warn!(%err, "chat stream: send failed");
                        SendOutcome::Dropped
                    }
                }
            }
            _ => SendOutcome::Dropped,
        };
        if outcome == SendOutcome::Dropped {
            self.view.notify(NOTICE_NOT_CONNECTED);
        }

        self.view.clear_message_input();
        outcome
    }

    pub fn render_message(&mut self, message: &ChatMessage) {
        self.view.append_message(RenderedMessage::from(message));
        self.view.scroll_to_latest();
    }

    pub fn clear_messages(&mut self) {
        self.view.clear_messages();
    }

    /// Next event from the active subscription. Pends while there is none.
    pub async fn next_stream_event(&mut self) -> Option<StreamEvent> {
        let Some(events) = self
            .session
            .as_mut()
            .and_then(|session| session.events.as_mut())
        else {
            return std::future::pending().await;
        };

        let next = events.next().await;
        if next.is_none() {
            self.revoke_subscription();
        }
        next
    }

    pub fn handle_stream_event(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Reply(reply) => self.render_message(&ChatMessage::from(reply)),
            StreamEvent::ServerError(message) => {
                error!(error = %message, "chat stream: server reported error");
                self.view.notify(&format!("Error: {message}"));
            }
            StreamEvent::Error(message) => {
                error!(error = %message, "chat stream: transport error");
                self.view.notify(NOTICE_STREAM_ERROR);
            }
            StreamEvent::Closed => {
                info!("chat stream: connection closed");
                self.revoke_subscription();
            }
        }
    }

    /// Release the session: close the socket and drop the subscription.
    pub async fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            session.stream.close().await;
            info!("chat session released");
        }
    }

    fn revoke_subscription(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.events = None;
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
