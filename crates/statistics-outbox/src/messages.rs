//! Upload protocol messages.

use crate::{MessageId, OutboxError, OutboxResult};
use serde::{Deserialize, Serialize};

/// Channel the upload documents are sent on.
pub const UPLOAD_CHANNEL: &str = "upload_statistics";

/// Topic the remote side acknowledges uploads on.
pub const UPLOAD_RESPONSE_TOPIC: &str = "upload_statistics_response";

/// Bundle section of an upload document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlePayload {
    pub namespace: String,
    pub stats: serde_json::Value,
}

/// Outbound upload document.
///
/// Wire shape: `{"bundle": {"namespace": ..., "stats": ...}, "message_id": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    pub bundle: BundlePayload,
    pub message_id: MessageId,
}

impl UploadRequest {
    pub fn new(namespace: &str, stats: serde_json::Value, message_id: MessageId) -> Self {
        Self {
            bundle: BundlePayload {
                namespace: namespace.to_string(),
                stats,
            },
            message_id,
        }
    }

    /// Build the JSON document handed to the channel.
    pub fn to_document(&self) -> OutboxResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| OutboxError::MalformedPayload(e.to_string()))
    }
}

/// Inbound acknowledgement of an upload.
///
/// Wire shape: `{"message_id": ..., "game_id": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message_id: MessageId,
    pub game_id: String,
}

impl UploadResponse {
    /// Parse an acknowledgement document.
    pub fn from_document(document: &serde_json::Value) -> OutboxResult<Self> {
        UploadResponse::deserialize(document)
            .map_err(|e| OutboxError::MalformedResponse(e.to_string()))
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> OutboxResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
