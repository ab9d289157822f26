//! Configuration management for the Neptune bridge.
//!
//! Configuration is read from the process environment only:
//! 1. `NEPTUNE_` variables describe the cluster endpoint and channel strategy
//! 2. `AWS_` variables carry the region and credentials injected by the
//!    function runtime, used when IAM request signing is enabled

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::error::{BridgeError, Result};

/// How the WebSocket upgrade request to the cluster is authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Unauthenticated cluster, no signing.
    None,
    /// IAM-authenticated cluster, SigV4-signed handshake.
    SigV4(SigningConfig),
}

/// Inputs for SigV4 request signing.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Validated bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Cluster contact point (host name only).
    pub endpoint: String,
    pub port: u16,
    /// Connect with `wss://` instead of `ws://`.
    pub use_tls: bool,
    pub auth: AuthMode,
}

/// Raw environment values before validation.
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    neptune_endpoint: Option<String>,
    #[serde(default)]
    neptune_port: Option<String>,
    #[serde(default = "default_true")]
    neptune_iam_auth: bool,
    #[serde(default = "default_true")]
    neptune_use_tls: bool,
    #[serde(default)]
    aws_region: Option<String>,
    #[serde(default)]
    aws_access_key_id: Option<String>,
    #[serde(default)]
    aws_secret_access_key: Option<String>,
    #[serde(default)]
    aws_session_token: Option<String>,
}

fn default_true() -> bool {
    true
}

impl BridgeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load from an explicit variable map instead of the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("NEPTUNE")
                    .keep_prefix(true)
                    .source(vars.clone()),
            )
            .add_source(
                config::Environment::with_prefix("AWS")
                    .keep_prefix(true)
                    .source(vars),
            )
            .build()
            .map_err(|e| BridgeError::Config(e.to_string()))?;

        let raw: RawSettings = cfg
            .try_deserialize()
            .map_err(|e| BridgeError::Config(e.to_string()))?;

        let config = raw.validate()?;
        tracing::debug!(
            endpoint = %config.endpoint,
            port = config.port,
            use_tls = config.use_tls,
            iam_auth = matches!(config.auth, AuthMode::SigV4(_)),
            "Loaded bridge configuration"
        );
        Ok(config)
    }
}

impl RawSettings {
    fn validate(self) -> Result<BridgeConfig> {
        let endpoint = non_empty(self.neptune_endpoint)
            .ok_or_else(|| BridgeError::Config("NEPTUNE_ENDPOINT is required".to_string()))?;

        let port_raw = non_empty(self.neptune_port)
            .ok_or_else(|| BridgeError::Config("NEPTUNE_PORT is required".to_string()))?;
        let port = port_raw.trim().parse::<u16>().map_err(|e| {
            BridgeError::Config(format!(
                "NEPTUNE_PORT must be an integer port, got {port_raw:?}: {e}"
            ))
        })?;

        let auth = if self.neptune_iam_auth {
            let missing = |name: &str| {
                BridgeError::Config(format!("{name} is required when NEPTUNE_IAM_AUTH is enabled"))
            };
            AuthMode::SigV4(SigningConfig {
                region: non_empty(self.aws_region).ok_or_else(|| missing("AWS_REGION"))?,
                access_key_id: non_empty(self.aws_access_key_id)
                    .ok_or_else(|| missing("AWS_ACCESS_KEY_ID"))?,
                secret_access_key: non_empty(self.aws_secret_access_key)
                    .ok_or_else(|| missing("AWS_SECRET_ACCESS_KEY"))?,
                session_token: non_empty(self.aws_session_token),
            })
        } else {
            AuthMode::None
        };

        Ok(BridgeConfig {
            endpoint,
            port,
            use_tls: self.neptune_use_tls,
            auth,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plain_cluster() {
        let config = BridgeConfig::from_vars(vars(&[
            ("NEPTUNE_ENDPOINT", "db.cluster.local"),
            ("NEPTUNE_PORT", "8182"),
            ("NEPTUNE_IAM_AUTH", "false"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint, "db.cluster.local");
        assert_eq!(config.port, 8182);
        assert!(config.use_tls);
        assert_eq!(config.auth, AuthMode::None);
    }

    #[test]
    fn test_iam_is_default() {
        let config = BridgeConfig::from_vars(vars(&[
            ("NEPTUNE_ENDPOINT", "db.cluster.local"),
            ("NEPTUNE_PORT", "8182"),
            ("AWS_REGION", "us-east-1"),
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_SESSION_TOKEN", "token"),
        ]))
        .unwrap();

        match config.auth {
            AuthMode::SigV4(signing) => {
                assert_eq!(signing.region, "us-east-1");
                assert_eq!(signing.access_key_id, "AKIDEXAMPLE");
                assert_eq!(signing.session_token.as_deref(), Some("token"));
            }
            AuthMode::None => panic!("expected SigV4"),
        }
    }

    #[test]
    fn test_iam_requires_credentials() {
        let err = BridgeConfig::from_vars(vars(&[
            ("NEPTUNE_ENDPOINT", "db.cluster.local"),
            ("NEPTUNE_PORT", "8182"),
            ("AWS_REGION", "us-east-1"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("AWS_ACCESS_KEY_ID"));
    }

    #[test]
    fn test_non_integer_port_is_rejected() {
        let err = BridgeConfig::from_vars(vars(&[
            ("NEPTUNE_ENDPOINT", "db.cluster.local"),
            ("NEPTUNE_PORT", "eighty"),
            ("NEPTUNE_IAM_AUTH", "false"),
        ]))
        .unwrap_err();
        assert!(matches!(err, BridgeError::Config(ref m) if m.contains("NEPTUNE_PORT")));
    }

    #[test]
    fn test_missing_endpoint_is_rejected() {
        let err = BridgeConfig::from_vars(vars(&[
            ("NEPTUNE_PORT", "8182"),
            ("NEPTUNE_IAM_AUTH", "false"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("NEPTUNE_ENDPOINT"));
    }

    #[test]
    fn test_tls_can_be_disabled() {
        let config = BridgeConfig::from_vars(vars(&[
            ("NEPTUNE_ENDPOINT", "localhost"),
            ("NEPTUNE_PORT", "8182"),
            ("NEPTUNE_IAM_AUTH", "false"),
            ("NEPTUNE_USE_TLS", "false"),
        ]))
        .unwrap();
        assert!(!config.use_tls);
    }

    #[test]
    fn test_signing_debug_redacts_secret() {
        let signing = SigningConfig {
            region: "us-east-1".into(),
            access_key_id: "AKID".into(),
            secret_access_key: "very-secret".into(),
            session_token: Some("tok".into()),
        };
        let dbg = format!("{signing:?}");
        assert!(!dbg.contains("very-secret"));
        assert!(!dbg.contains("tok\""));
    }
}
