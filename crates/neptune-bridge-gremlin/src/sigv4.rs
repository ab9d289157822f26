//! AWS Signature Version 4 for the Gremlin WebSocket handshake.
//!
//! Neptune authenticates IAM clients on the HTTP upgrade request only; frames
//! sent over the established socket are not signed.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use neptune_bridge_core::SigningConfig;

use crate::client::GremlinError;

type HmacSha256 = Hmac<Sha256>;

pub const SERVICE: &str = "neptune-db";
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Headers to attach to a signed handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub amz_date: String,
    pub security_token: Option<String>,
    pub authorization: String,
}

/// Sign a `GET` of `path` on `host` (which includes the port).
pub fn sign_handshake(
    signing: &SigningConfig,
    host: &str,
    path: &str,
    now: DateTime<Utc>,
) -> Result<SignedHeaders, GremlinError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let mut canonical_headers = format!("host:{host}\nx-amz-date:{amz_date}\n");
    let mut signed_headers = String::from("host;x-amz-date");
    if let Some(token) = &signing.session_token {
        canonical_headers.push_str(&format!("x-amz-security-token:{token}\n"));
        signed_headers.push_str(";x-amz-security-token");
    }

    let payload_hash = hex::encode(Sha256::digest(b""));
    let canonical_request =
        format!("GET\n{path}\n\n{canonical_headers}\n{signed_headers}\n{payload_hash}");

    let scope = format!("{date}/{}/{SERVICE}/aws4_request", signing.region);
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let k_secret = format!("AWS4{}", signing.secret_access_key);
    let k_date = hmac(k_secret.as_bytes(), &date)?;
    let k_region = hmac(&k_date, &signing.region)?;
    let k_service = hmac(&k_region, SERVICE)?;
    let k_signing = hmac(&k_service, "aws4_request")?;
    let signature = hex::encode(hmac(&k_signing, &string_to_sign)?);

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
        signing.access_key_id
    );

    Ok(SignedHeaders {
        amz_date,
        security_token: signing.session_token.clone(),
        authorization,
    })
}

fn hmac(key: &[u8], data: &str) -> Result<Vec<u8>, GremlinError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| GremlinError::Signing(e.to_string()))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}
