//! neptune-bridge-gremlin: Gremlin client for the Neptune graph cluster.
//!
//! This crate owns the single outbound connection to the cluster. All
//! queries flow through the [`ConnectionManager`], which opens the WebSocket
//! session exactly once and multiplexes concurrent requests over it.

pub mod channel;
pub mod client;
pub mod manager;
pub mod message;
pub mod sigv4;
pub mod stream;

pub use channel::{ChannelStrategy, PlainChannel, SigV4Channel};
pub use client::{GremlinClient, GremlinConfig, GremlinError};
pub use manager::{ConnectionManager, Connector, GraphSession, GremlinConnector};
pub use stream::ResultStream;
