//! Acknowledgement handling for uploaded bundles.
//!
//! Acknowledgements arrive asynchronously and in any order. Each one removes
//! its correlation entry and notifies the recipients recorded at submission.
//! Stray or duplicate acknowledgements are logged and dropped.

use crate::sink::{CompletionNotice, CompletionNotifier};
use crate::{CorrelationTable, MessageId, OutboxError, UploadResponse};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to one inbound acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The upload was awaiting this acknowledgement; its recipients were notified.
    Notified { message_id: MessageId, recipients: usize },
    /// No upload with this id was awaiting an acknowledgement.
    UnknownCorrelation { message_id: MessageId },
    /// The document could not be parsed.
    Malformed,
}

/// Resolves acknowledgements against the correlation table.
pub struct AcknowledgementHandler {
    table: Arc<CorrelationTable>,
    notifier: Arc<dyn CompletionNotifier>,
}

impl AcknowledgementHandler {
    pub fn new(table: Arc<CorrelationTable>, notifier: Arc<dyn CompletionNotifier>) -> Self {
        Self { table, notifier }
    }

    /// Handle a parsed acknowledgement.
    pub fn on_response(&self, response: &UploadResponse) -> AckOutcome {
        let message_id = response.message_id;

        let recipients = match self.table.resolve_and_remove(message_id) {
            Ok(recipients) => recipients,
            Err(OutboxError::UnknownCorrelation(_)) => {
                warn!(
                    message_id = %message_id,
                    game_id = %response.game_id,
                    "Received upload response for unknown message"
                );
                return AckOutcome::UnknownCorrelation { message_id };
            }
            Err(e) => {
                warn!(message_id = %message_id, error = %e, "Failed to resolve upload response");
                return AckOutcome::UnknownCorrelation { message_id };
            }
        };

        debug!(
            message_id = %message_id,
            game_id = %response.game_id,
            recipients = recipients.len(),
            "Upload acknowledged"
        );

        let notice = CompletionNotice {
            message_id,
            game_id: response.game_id.clone(),
        };
        self.notifier.notify(&recipients, &notice);

        AckOutcome::Notified {
            message_id,
            recipients: recipients.len(),
        }
    }

    /// Handle a raw acknowledgement document from the response topic.
    pub fn on_response_document(&self, document: &Value) -> AckOutcome {
        match UploadResponse::from_document(document) {
            Ok(response) => self.on_response(&response),
            Err(e) => {
                warn!(error = %e, "Dropping malformed upload response");
                AckOutcome::Malformed
            }
        }
    }
}
