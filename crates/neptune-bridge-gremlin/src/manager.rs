//! Connection lifecycle: open the session once, share it with every caller.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use neptune_bridge_core::{BridgeConfig, Bindings};

use crate::channel::{self, ChannelStrategy};
use crate::client::{GremlinClient, GremlinConfig, GremlinError};
use crate::stream::ResultStream;

/// A live session that accepts queries.
///
/// The two methods are distinct downstream call shapes: a bare query and a
/// query with bindings.
#[async_trait]
pub trait GraphSession: Send + Sync {
    async fn submit(&self, query: &str) -> Result<ResultStream, GremlinError>;

    async fn submit_with_bindings(
        &self,
        query: &str,
        bindings: &Bindings,
    ) -> Result<ResultStream, GremlinError>;
}

#[async_trait]
impl GraphSession for GremlinClient {
    async fn submit(&self, query: &str) -> Result<ResultStream, GremlinError> {
        GremlinClient::submit(self, query).await
    }

    async fn submit_with_bindings(
        &self,
        query: &str,
        bindings: &Bindings,
    ) -> Result<ResultStream, GremlinError> {
        GremlinClient::submit_with_bindings(self, query, bindings).await
    }
}

/// Opens a new session.
#[async_trait]
pub trait Connector: Send + Sync {
    type Session: GraphSession + 'static;

    async fn connect(&self) -> Result<Self::Session, GremlinError>;
}

/// Connects to a Gremlin endpoint through a channel strategy.
#[derive(Debug, Clone)]
pub struct GremlinConnector {
    config: GremlinConfig,
    channel: Arc<dyn ChannelStrategy>,
}

impl GremlinConnector {
    pub fn new(config: GremlinConfig, channel: Arc<dyn ChannelStrategy>) -> Self {
        Self { config, channel }
    }

    pub fn from_bridge_config(config: &BridgeConfig) -> Self {
        Self::new(GremlinConfig::from(config), channel::for_auth(&config.auth))
    }
}

#[async_trait]
impl Connector for GremlinConnector {
    type Session = GremlinClient;

    async fn connect(&self) -> Result<GremlinClient, GremlinError> {
        GremlinClient::connect(&self.config, self.channel.as_ref()).await
    }
}

/// Owns the single session to the cluster.
///
/// The session is opened on the first call to [`initialize`](Self::initialize)
/// (or the first submit) and reused afterwards. Concurrent first callers wait
/// on the same connection attempt. Nothing here closes or replaces a session
/// once it is open.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    session: OnceCell<C::Session>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            session: OnceCell::new(),
        }
    }

    /// Open the session if it is not open yet and return it.
    pub async fn initialize(&self) -> Result<&C::Session, GremlinError> {
        self.session
            .get_or_try_init(|| async {
                tracing::info!("Opening graph session");
                self.connector.connect().await
            })
            .await
    }

    pub fn is_initialized(&self) -> bool {
        self.session.initialized()
    }

    pub async fn submit(&self, query: &str) -> Result<ResultStream, GremlinError> {
        self.initialize().await?.submit(query).await
    }

    pub async fn submit_with_bindings(
        &self,
        query: &str,
        bindings: &Bindings,
    ) -> Result<ResultStream, GremlinError> {
        self.initialize()
            .await?
            .submit_with_bindings(query, bindings)
            .await
    }
}
