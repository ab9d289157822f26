//! Function runtime entry point for the Neptune bridge.
//!
//! Cold start loads configuration and opens the graph session before the
//! runtime loop begins; a failure here stops the container from serving.

use std::sync::Arc;

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing_subscriber::{fmt, EnvFilter};

use neptune_bridge::RequestHandler;
use neptune_bridge_core::{BridgeConfig, InboundRequest, OutboundResponse};
use neptune_bridge_gremlin::{ConnectionManager, GremlinConnector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .json()
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();

    let config = BridgeConfig::from_env()?;
    let connections = Arc::new(ConnectionManager::new(
        GremlinConnector::from_bridge_config(&config),
    ));
    connections.initialize().await?;
    tracing::info!(endpoint = %config.endpoint, port = config.port, "Neptune bridge ready");

    let handler = RequestHandler::new(connections);
    let handler = &handler;

    run(service_fn(|event: LambdaEvent<InboundRequest>| async move {
        Ok::<OutboundResponse, Error>(handler.handle(event.payload).await)
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}
