//! neptune-bridge-core: Shared types, configuration, and error handling for the Neptune bridge.
//!
//! This crate provides the foundational pieces used by the Gremlin client and
//! the function handler:
//! - Inbound request and outbound gateway response value objects
//! - Environment-driven configuration, including the IAM signing inputs
//! - The top-level error type

pub mod config;
pub mod error;
pub mod types;

pub use config::{AuthMode, BridgeConfig, SigningConfig};
pub use error::BridgeError;
pub use types::{Bindings, InboundRequest, OutboundResponse};
