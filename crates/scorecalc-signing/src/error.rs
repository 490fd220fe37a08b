//! Signing error types.

use thiserror::Error;

/// Errors that can occur when signing or verifying results.
#[derive(Debug, Error)]
pub enum SigningError {
    /// No signing key was configured, or it was empty.
    #[error("no signing key configured (set signing_key or SCORECALC_SIGNING_KEY)")]
    MissingKey,

    /// The key was rejected by the MAC implementation.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// The payload could not be serialized or deserialized.
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The envelope names an algorithm this build does not implement.
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signature is not valid hex.
    #[error("malformed signature: {0}")]
    MalformedSignature(#[from] hex::FromHexError),

    /// The signature does not match the payload.
    #[error("signature mismatch: payload was modified or signed with another key")]
    SignatureMismatch,
}
