//! Per-invocation request handling.

use std::sync::Arc;

use neptune_bridge_core::error::Result;
use neptune_bridge_core::{Bindings, BridgeError, InboundRequest, OutboundResponse};
use neptune_bridge_gremlin::{ConnectionManager, Connector};

/// Validates a request, forwards it to the graph, and maps the outcome.
///
/// Cloning shares the same connection manager.
pub struct RequestHandler<C: Connector> {
    connections: Arc<ConnectionManager<C>>,
}

impl<C: Connector> Clone for RequestHandler<C> {
    fn clone(&self) -> Self {
        Self {
            connections: Arc::clone(&self.connections),
        }
    }
}

impl<C: Connector> RequestHandler<C> {
    pub fn new(connections: Arc<ConnectionManager<C>>) -> Self {
        Self { connections }
    }

    /// Handle one invocation. Never fails: every outcome becomes a response.
    ///
    /// - missing or empty query: 500 with an error body, nothing submitted
    /// - query submitted and fully drained: 200 with `{}`
    /// - submission or drain failed: 500 with `{}`
    pub async fn handle(&self, request: InboundRequest) -> OutboundResponse {
        let query = match request.validate() {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected request");
                return OutboundResponse::from_error(&e);
            }
        };

        match self.execute(query, request.bindings()).await {
            Ok(records) => {
                tracing::info!(records, "Query completed");
                OutboundResponse::succeeded()
            }
            Err(e) => {
                tracing::error!(error = %e, "Query failed");
                OutboundResponse::from_error(&e)
            }
        }
    }

    /// Submit and drain, returning the number of records observed.
    async fn execute(&self, query: &str, bindings: Option<&Bindings>) -> Result<usize> {
        tracing::debug!(query, bindings = bindings.map_or(0, |b| b.len()), "Submitting query");

        let submitted = match bindings {
            Some(bindings) => {
                self.connections
                    .submit_with_bindings(query, bindings)
                    .await
            }
            None => self.connections.submit(query).await,
        };

        let stream = submitted.map_err(|e| BridgeError::Submission(e.to_string()))?;
        stream
            .drain()
            .await
            .map_err(|e| BridgeError::Submission(e.to_string()))
    }
}
