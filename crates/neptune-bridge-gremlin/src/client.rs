//! Gremlin WebSocket session and shared client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

use neptune_bridge_core::{BridgeConfig, Bindings};

use crate::channel::ChannelStrategy;
use crate::message::{self, Outcome, ResponseMessage};
use crate::stream::{BatchSender, ResultStream};

/// Errors from Gremlin operations.
#[derive(Debug, thiserror::Error)]
pub enum GremlinError {
    #[error("Gremlin connection error: {0}")]
    Connection(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Request signing error: {0}")]
    Signing(String),

    #[error("Gremlin protocol error: {0}")]
    Protocol(String),

    #[error("Gremlin server error {code}: {message}")]
    Server { code: u16, message: String },

    #[error("Gremlin connection closed")]
    Closed,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where the Gremlin endpoint lives.
#[derive(Debug, Clone)]
pub struct GremlinConfig {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub path: String,
}

impl Default for GremlinConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8182,
            use_tls: false,
            path: "/gremlin".to_string(),
        }
    }
}

impl From<&BridgeConfig> for GremlinConfig {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            host: config.endpoint.clone(),
            port: config.port,
            use_tls: config.use_tls,
            ..Default::default()
        }
    }
}

impl GremlinConfig {
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{scheme}://{}:{}{}", self.host, self.port, self.path)
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Pending = Arc<Mutex<HashMap<Uuid, BatchSender>>>;

/// Thread-safe Gremlin client over one WebSocket.
///
/// Concurrent requests share the socket and are told apart by request id.
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GremlinClient {
    inner: Arc<Inner>,
}

struct Inner {
    sink: Mutex<SplitSink<WsStream, Message>>,
    pending: Pending,
    closed: Arc<AtomicBool>,
}

impl GremlinClient {
    /// Open the WebSocket session, applying the channel strategy to the handshake.
    pub async fn connect(
        config: &GremlinConfig,
        channel: &dyn ChannelStrategy,
    ) -> Result<Self, GremlinError> {
        let url = config.url();
        let mut request = url.as_str().into_client_request()?;
        channel.prepare(&mut request)?;

        if config.use_tls {
            // A provider may already be installed by another client in-process.
            let _ = rustls::crypto::ring::default_provider().install_default();
        }

        let (socket, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| GremlinError::Connection(e.to_string()))?;
        let (sink, stream) = socket.split();

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        tokio::spawn(read_loop(stream, pending.clone(), closed.clone()));

        tracing::info!(url = %url, channel = channel.name(), "Connected to Gremlin endpoint");
        Ok(Self {
            inner: Arc::new(Inner {
                sink: Mutex::new(sink),
                pending,
                closed,
            }),
        })
    }

    /// Submit a query without bindings.
    pub async fn submit(&self, query: &str) -> Result<ResultStream, GremlinError> {
        self.send(query, None).await
    }

    /// Submit a query together with named bindings.
    pub async fn submit_with_bindings(
        &self,
        query: &str,
        bindings: &Bindings,
    ) -> Result<ResultStream, GremlinError> {
        self.send(query, Some(bindings)).await
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    async fn send(
        &self,
        query: &str,
        bindings: Option<&Bindings>,
    ) -> Result<ResultStream, GremlinError> {
        if self.is_closed() {
            return Err(GremlinError::Closed);
        }

        let request_id = Uuid::new_v4();
        let frame = message::encode_request(request_id, query, bindings)?;
        let (tx, stream) = ResultStream::channel();
        self.inner.pending.lock().await.insert(request_id, tx);

        // The reader marks the client closed before failing pending requests,
        // so a request registered after that sweep is caught here.
        if self.is_closed() {
            self.inner.pending.lock().await.remove(&request_id);
            return Err(GremlinError::Closed);
        }

        let sent = self
            .inner
            .sink
            .lock()
            .await
            .send(Message::Binary(frame))
            .await;
        if let Err(e) = sent {
            self.inner.pending.lock().await.remove(&request_id);
            return Err(e.into());
        }

        tracing::debug!(
            request_id = %request_id,
            bindings = bindings.map_or(0, |b| b.len()),
            "Submitted Gremlin request"
        );
        Ok(stream)
    }
}

/// Route response frames to their pending requests until the socket ends.
async fn read_loop(mut stream: SplitStream<WsStream>, pending: Pending, closed: Arc<AtomicBool>) {
    while let Some(frame) = stream.next().await {
        let payload = match frame {
            Ok(Message::Binary(bytes)) => bytes,
            Ok(Message::Text(text)) => text.into_bytes(),
            Ok(Message::Close(reason)) => {
                tracing::warn!(reason = ?reason, "Gremlin endpoint closed the connection");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::error!(error = %e, "Gremlin connection failed");
                break;
            }
        };

        // A frame that cannot be routed may be the only answer some request
        // will ever get, so every pending request fails with it.
        if let Err(e) = dispatch(&payload, &pending).await {
            tracing::warn!(error = %e, "Unroutable Gremlin frame");
            let reason = e.to_string();
            fail_pending(&pending, || GremlinError::Protocol(reason.clone())).await;
        }
    }

    closed.store(true, Ordering::SeqCst);
    fail_pending(&pending, || GremlinError::Closed).await;
}

async fn fail_pending(pending: &Pending, err: impl Fn() -> GremlinError) {
    let mut pending = pending.lock().await;
    for (request_id, tx) in pending.drain() {
        tracing::debug!(request_id = %request_id, "Failing pending request");
        let _ = tx.send(Err(err()));
    }
}

async fn dispatch(payload: &[u8], pending: &Pending) -> Result<(), GremlinError> {
    let response = ResponseMessage::decode(payload)?;
    let request_id = response.request_id().ok_or_else(|| {
        GremlinError::Protocol(format!(
            "response without a request id (status {}: {})",
            response.status.code,
            response.status.message.as_deref().unwrap_or_default()
        ))
    })?;

    let mut pending = pending.lock().await;
    match response.into_outcome() {
        Outcome::Partial(records) => {
            if let Some(tx) = pending.get(&request_id) {
                let _ = tx.send(Ok(records));
            }
        }
        Outcome::Complete(records) => {
            if let Some(tx) = pending.remove(&request_id) {
                let _ = tx.send(Ok(records));
            }
        }
        Outcome::Failed(err) => {
            if let Some(tx) = pending.remove(&request_id) {
                let _ = tx.send(Err(err));
            }
        }
    }
    Ok(())
}
