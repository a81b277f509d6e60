//! Chat stream transport: the duplex connection to the `/chat` endpoint.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use futures::{stream::SplitSink, SinkExt, Stream, StreamExt};
use shared::protocol::{ChatReply, InboundFrame};
use tokio::{
    net::TcpStream,
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Reply(ChatReply),
    /// `{"error": ...}` frame pushed by the server.
    ServerError(String),
    /// Transport failure; always followed by `Closed`.
    Error(String),
    Closed,
}

/// A revocable registration for stream events. Dropping it unsubscribes.
///
/// Unbounded: every frame the server pushed is delivered, in arrival order.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<StreamEvent>,
}

impl Subscription {
    pub fn new(rx: mpsc::UnboundedReceiver<StreamEvent>) -> Self {
        Self { rx }
    }

    /// Next event in arrival order, or `None` once the publisher is gone.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }
}

#[async_trait]
pub trait ChatStream: Send + Sync {
    fn is_open(&self) -> bool;
    async fn send_text(&self, text: &str) -> ClientResult<()>;
    async fn close(&self);
}

/// An open stream plus the subscription registered before any frame was read.
pub struct StreamConnection {
    pub stream: Box<dyn ChatStream>,
    pub events: Subscription,
}

#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, endpoint: &Url) -> ClientResult<StreamConnection>;
}

/// Chat endpoint on the same host as `server_url`.
pub fn chat_endpoint(server_url: &Url) -> ClientResult<Url> {
    let invalid = |reason: &str| ClientError::InvalidServerUrl {
        url: server_url.to_string(),
        reason: reason.to_string(),
    };
    let scheme = match server_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(invalid("scheme must be http, https, ws or wss")),
    };
    if server_url.host_str().is_none() {
        return Err(invalid("missing host"));
    }

    let mut endpoint = server_url.clone();
    endpoint
        .set_scheme(scheme)
        .map_err(|_| invalid("cannot switch to websocket scheme"))?;
    endpoint.set_path("/chat");
    endpoint.set_query(None);
    endpoint.set_fragment(None);
    Ok(endpoint)
}

pub(crate) fn parse_frame(text: &str) -> Option<StreamEvent> {
    match serde_json::from_str::<InboundFrame>(text) {
        Ok(InboundFrame::Reply(reply)) => Some(StreamEvent::Reply(reply)),
        Ok(InboundFrame::Error { error }) => Some(StreamEvent::ServerError(error)),
        Err(err) => {
            warn!(%err, frame_len = text.len(), "chat stream: dropping unreadable frame");
            None
        }
    }
}

/// Reads until the socket ends. After a close frame the reader keeps polling so
/// tungstenite can flush its close reply; data frames after that are ignored.
async fn pump_frames<S>(
    mut reader: S,
    open: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<StreamEvent>,
) where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    let mut closing = false;
    while let Some(msg) = reader.next().await {
        match msg {
            Ok(Message::Text(text)) if !closing => {
                if let Some(event) = parse_frame(&text) {
                    let _ = events.send(event);
                }
            }
            Ok(Message::Close(frame)) => {
                debug!(?frame, "chat stream: close frame received");
                open.store(false, Ordering::SeqCst);
                closing = true;
            }
            Ok(_) => {}
            Err(err) => {
                open.store(false, Ordering::SeqCst);
                if !closing {
                    let _ = events.send(StreamEvent::Error(format!(
                        "websocket receive failed: {err}"
                    )));
                }
                break;
            }
        }
    }
    open.store(false, Ordering::SeqCst);
    let _ = events.send(StreamEvent::Closed);
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

pub struct WsChatStream {
    writer: Mutex<WsSink>,
    open: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

#[async_trait]
impl ChatStream for WsChatStream {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn send_text(&self, text: &str) -> ClientResult<()> {
        if !self.is_open() {
            return Err(ClientError::StreamClosed);
        }
        let mut writer = self.writer.lock().await;
        writer.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    async fn close(&self) {
        if !self.open.swap(false, Ordering::SeqCst) {
            return;
        }
        let mut writer = self.writer.lock().await;
        if let Err(err) = writer.send(Message::Close(None)).await {
            debug!(%err, "chat stream: close frame not delivered");
        }
    }
}

impl Drop for WsChatStream {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl StreamConnector for WsConnector {
    async fn connect(&self, endpoint: &Url) -> ClientResult<StreamConnection> {
        let (ws_stream, _) = connect_async(endpoint.as_str()).await?;
        info!(%endpoint, "chat stream: connected");
        let (writer, reader) = ws_stream.split();

        let (events, rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));
        let reader = tokio::spawn(pump_frames(reader, Arc::clone(&open), events));

        Ok(StreamConnection {
            stream: Box::new(WsChatStream {
                writer: Mutex::new(writer),
                open,
                reader,
            }),
            events: Subscription::new(rx),
        })
    }
}
