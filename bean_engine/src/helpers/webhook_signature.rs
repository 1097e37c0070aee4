//! # Webhook signature verification
//!
//! The payment processor signs every notification it sends with a secret that is shared with this server. The
//! signature travels in a header of the form
//!
//! ```text
//!    t=1718000000,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd,v1=...
//! ```
//!
//! where
//!   * `t` is the unix time (in seconds) at which the notification was signed,
//!   * each `v1` entry is a hex-encoded HMAC-SHA256 of `{t}.{raw request body}`, keyed with the shared secret. More
//!     than one `v1` entry is sent while the processor is rolling over to a new secret.
//!
//! Entries for other schemes (e.g. `v0`) are ignored.
//!
//! Verification is a pure function of the raw body bytes, the header, the secret and the current time. The body must
//! be the exact bytes received on the wire: re-serialising a parsed payload will not reproduce the signature.
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// The header carrying the processor's signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";
/// Notifications signed further than this from "now" are rejected.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

const SIGNATURE_SCHEME: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("No signature header was provided")]
    MissingHeader,
    #[error("The signature header does not contain a timestamp")]
    MissingTimestamp,
    #[error("The signature timestamp is not a valid unix time: {0}")]
    InvalidTimestamp(String),
    #[error("The signature header does not contain any v1 signatures")]
    NoSignatures,
    #[error("The signature was signed at {timestamp}, which is outside the tolerance window (now is {now})")]
    StaleTimestamp { timestamp: i64, now: i64 },
    #[error("No signature in the header matches the payload")]
    Mismatch,
    #[error("The signing secret is not configured")]
    MissingSecret,
}

/// A request body whose signature has been checked.
///
/// The only way to obtain one is through [`verify_signature`], so holding a `VerifiedPayload` is proof that the bytes
/// came from the holder of the shared secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayload {
    timestamp: i64,
    body: Vec<u8>,
}

impl VerifiedPayload {
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Deserializes the verified body.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for (key, value) in header.split(',').filter_map(|pair| pair.trim().split_once('=')) {
        match key.trim() {
            "t" => {
                let value = value.trim();
                let t = value.parse::<i64>().map_err(|_| SignatureError::InvalidTimestamp(value.to_string()))?;
                timestamp = Some(t);
            },
            SIGNATURE_SCHEME => {
                // A signature that is not even hex can never match. Skip it, but keep looking at the others.
                if let Ok(sig) = hex::decode(value.trim()) {
                    signatures.push(sig);
                }
            },
            _ => {},
        }
    }
    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    Ok(SignatureHeader { timestamp, signatures })
}

fn new_mac(secret: &str, timestamp: i64, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::MissingSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

/// Checks that `body` was signed by the holder of `secret`.
///
/// * `header` is the value of the [`SIGNATURE_HEADER`] header, if it was present.
/// * `tolerance` is the maximum allowed distance, in seconds, between the signature timestamp and `now`. `None`
///   disables the freshness check.
/// * `now` is the current unix time in seconds.
///
/// Every `v1` signature in the header is checked in constant time; any single match is sufficient.
pub fn verify_signature(
    body: &[u8],
    header: Option<&str>,
    secret: &str,
    tolerance: Option<i64>,
    now: i64,
) -> Result<VerifiedPayload, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::MissingSecret);
    }
    let header = header.filter(|h| !h.trim().is_empty()).ok_or(SignatureError::MissingHeader)?;
    let SignatureHeader { timestamp, signatures } = parse_header(header)?;
    if signatures.is_empty() {
        return Err(SignatureError::NoSignatures);
    }
    if let Some(tolerance) = tolerance {
        let fresh = now
            .checked_sub(timestamp)
            .map(i64::unsigned_abs)
            .is_some_and(|age| age <= tolerance.unsigned_abs());
        if !fresh {
            return Err(SignatureError::StaleTimestamp { timestamp, now });
        }
    }
    let mac = new_mac(secret, timestamp, body)?;
    let matched = signatures.iter().any(|sig| mac.clone().verify_slice(sig).is_ok());
    if matched {
        Ok(VerifiedPayload { timestamp, body: body.to_vec() })
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Produces a valid signature header for `body`, signed at `timestamp`.
pub fn sign_payload(body: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    let mac = new_mac(secret, timestamp, body)?;
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={timestamp},{SIGNATURE_SCHEME}={signature}"))
}
