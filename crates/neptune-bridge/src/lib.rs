//! neptune-bridge: Function handler that forwards Gremlin queries to Neptune.
//!
//! Each invocation is validated, submitted through the shared connection,
//! drained, and answered with a gateway-style status envelope.

pub mod handler;

pub use handler::RequestHandler;
