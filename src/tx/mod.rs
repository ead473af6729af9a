//! Transaction payloads, signing and the timed submit pipeline.
//!
//! Transaction bytes are opaque here: they are either produced by the node's
//! transaction builder endpoints or loaded prebuilt from a file, and they are
//! submitted exactly as built.

use crate::error::{BenchError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::path::Path;

pub mod builder;
pub mod pipeline;
pub mod signer;

pub use builder::PayloadSource;
pub use pipeline::{SubmitOutcome, SubmitPipeline};
pub use signer::{Ed25519Signer, TransactionSigner};

/// Encoded transaction bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPayload {
    bytes: Vec<u8>,
}

impl TransactionPayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| BenchError::MalformedResponse(format!("transaction bytes: {e}")))?;
        Ok(Self { bytes })
    }

    /// Load base64 transaction bytes from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BenchError::InvalidInput(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_base64(&text)
            .map_err(|e| BenchError::InvalidInput(format!("{}: {e}", path.display())))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A serialized user signature (`flag || signature || public key`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSignature {
    bytes: Vec<u8>,
}

impl UserSignature {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }
}
