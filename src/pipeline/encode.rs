//! Encoding: finished [`DocumentModel`] → output bytes.
//!
//! The word-processor encoder lives outside this crate; [`Encoder`] is the
//! seam it plugs into. [`JsonEncoder`] ships as the built-in implementation
//! and writes the model as JSON, with image bytes as base64 strings.
//!
//! An encoder failure is the one fatal error of a conversion: it is turned
//! into [`Md2DocError::EncodingFailed`] carrying the encoder's own message.

use crate::error::Md2DocError;
use crate::model::DocumentModel;
use tracing::debug;

/// Serialises a document model into a binary buffer.
pub trait Encoder: Send + Sync {
    /// Short identifier used in errors and logs.
    fn name(&self) -> &str;

    /// File extension (without dot) for the produced format.
    fn extension(&self) -> &str;

    /// Encode the model. The error string is surfaced verbatim.
    fn encode(&self, document: &DocumentModel) -> Result<Vec<u8>, String>;
}

/// Writes the document model as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder {
    pub pretty: bool,
}

impl Encoder for JsonEncoder {
    fn name(&self) -> &str {
        "json"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn encode(&self, document: &DocumentModel) -> Result<Vec<u8>, String> {
        let result = if self.pretty {
            serde_json::to_vec_pretty(document)
        } else {
            serde_json::to_vec(document)
        };
        result.map_err(|e| e.to_string())
    }
}

/// Run `encoder`, mapping its failure into the fatal error type.
pub fn encode_document(
    encoder: &dyn Encoder,
    document: &DocumentModel,
) -> Result<Vec<u8>, Md2DocError> {
    let bytes = encoder
        .encode(document)
        .map_err(|message| Md2DocError::EncodingFailed {
            encoder: encoder.name().to_string(),
            message,
        })?;
    debug!("Encoded document with '{}' → {} bytes", encoder.name(), bytes.len());
    Ok(bytes)
}
