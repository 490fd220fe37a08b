//! scorecalc-signing: Tamper-evident serialization of scoring results.
//!
//! A result is serialized to JSON, signed with HMAC-SHA256 under a
//! configured key, and wrapped in a [`SignedEnvelope`]. The key always comes
//! from configuration and is passed in explicitly.

pub mod error;

use std::fmt;

use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

pub use error::SigningError;

type HmacSha256 = Hmac<Sha256>;

/// Name recorded in every envelope this crate produces.
pub const ALGORITHM: &str = "HMAC-SHA256";

/// Secret key material for signing.
///
/// Note: Debug output never shows the key bytes.
#[derive(Clone)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    /// Build a key from raw bytes. Empty keys are rejected.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, SigningError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(SigningError::MissingKey);
        }
        Ok(Self(bytes))
    }

    /// Build a key from the optional `signing_key` config value.
    pub fn from_config(key: Option<&str>) -> Result<Self, SigningError> {
        match key {
            Some(k) if !k.trim().is_empty() => Self::new(k.as_bytes()),
            _ => Err(SigningError::MissingKey),
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningKey").field(&"***").finish()
    }
}

/// A signed payload as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub algorithm: String,
    pub payload: serde_json::Value,
    /// Lowercase hex MAC over the compact JSON encoding of `payload`.
    pub signature: String,
}

impl SignedEnvelope {
    pub fn to_json_pretty(&self) -> Result<String, SigningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(content: &str) -> Result<Self, SigningError> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Signs and verifies result payloads.
#[derive(Debug, Clone)]
pub struct ResultSigner {
    key: SigningKey,
}

impl ResultSigner {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Serialize `payload` and sign it.
    pub fn sign<T: Serialize>(&self, payload: &T) -> Result<SignedEnvelope, SigningError> {
        let payload = serde_json::to_value(payload)?;
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        tracing::debug!(algorithm = ALGORITHM, "signed payload");
        Ok(SignedEnvelope {
            algorithm: ALGORITHM.to_string(),
            payload,
            signature,
        })
    }

    /// Check the envelope's signature. The comparison is constant-time.
    pub fn verify(&self, envelope: &SignedEnvelope) -> Result<(), SigningError> {
        if envelope.algorithm != ALGORITHM {
            return Err(SigningError::UnsupportedAlgorithm(envelope.algorithm.clone()));
        }
        let expected = hex::decode(&envelope.signature)?;
        self.mac(&envelope.payload)?
            .verify_slice(&expected)
            .map_err(|_| SigningError::SignatureMismatch)
    }

    /// Verify the envelope and deserialize its payload.
    pub fn open<T: DeserializeOwned>(&self, envelope: &SignedEnvelope) -> Result<T, SigningError> {
        self.verify(envelope)?;
        Ok(serde_json::from_value(envelope.payload.clone())?)
    }

    fn mac(&self, payload: &serde_json::Value) -> Result<HmacSha256, SigningError> {
        // serde_json::Value keeps object keys sorted, so the encoding is canonical.
        let bytes = serde_json::to_vec(payload)?;
        let mut mac = HmacSha256::new_from_slice(&self.key.0)
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;
        mac.update(&bytes);
        Ok(mac)
    }
}
