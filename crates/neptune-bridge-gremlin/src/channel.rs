//! Channel strategies applied to the WebSocket upgrade request.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;

use neptune_bridge_core::{AuthMode, SigningConfig};

use crate::client::GremlinError;
use crate::sigv4;

/// Prepares the handshake request before the socket is opened.
pub trait ChannelStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn prepare(&self, request: &mut Request) -> Result<(), GremlinError>;
}

/// Pick the strategy for a configured auth mode.
pub fn for_auth(auth: &AuthMode) -> Arc<dyn ChannelStrategy> {
    match auth {
        AuthMode::None => Arc::new(PlainChannel),
        AuthMode::SigV4(signing) => Arc::new(SigV4Channel::new(signing.clone())),
    }
}

/// No authentication; the request is sent as built.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainChannel;

impl ChannelStrategy for PlainChannel {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn prepare(&self, _request: &mut Request) -> Result<(), GremlinError> {
        Ok(())
    }
}

/// Signs the upgrade request for IAM-authenticated clusters.
#[derive(Debug, Clone)]
pub struct SigV4Channel {
    signing: SigningConfig,
}

impl SigV4Channel {
    pub fn new(signing: SigningConfig) -> Self {
        Self { signing }
    }
}

impl ChannelStrategy for SigV4Channel {
    fn name(&self) -> &'static str {
        "sigv4"
    }

    fn prepare(&self, request: &mut Request) -> Result<(), GremlinError> {
        let host = request
            .uri()
            .authority()
            .map(|a| a.as_str().to_string())
            .ok_or_else(|| GremlinError::Signing("request URI has no host".to_string()))?;
        let path = request.uri().path().to_string();

        let signed = sigv4::sign_handshake(&self.signing, &host, &path, Utc::now())?;

        let headers = request.headers_mut();
        headers.insert("host", header(&host)?);
        headers.insert("x-amz-date", header(&signed.amz_date)?);
        if let Some(token) = &signed.security_token {
            headers.insert("x-amz-security-token", header(token)?);
        }
        headers.insert("authorization", header(&signed.authorization)?);
        Ok(())
    }
}

fn header(value: &str) -> Result<HeaderValue, GremlinError> {
    HeaderValue::from_str(value).map_err(|e| GremlinError::Signing(e.to_string()))
}
