//! Delivery coordinator for statistic uploads.
//!
//! Owns the correlation table and retry queue for one integration channel.
//! A single instance is constructed per process and shared as `Arc`; every
//! entry point takes `&self` and may be called from any thread.

use crate::ack::{AckOutcome, AcknowledgementHandler};
use crate::queue::{DrainOutcome, Envelope, RetryQueue};
use crate::sink::{CompletionNotifier, StatisticsPresenter, StatisticsSummary};
use crate::transport::ChannelSender;
use crate::{
    CorrelationTable, MessageId, OutboxError, OutboxResult, RecipientSet, StatisticBundle,
    UploadRequest, UploadResponse,
};
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use relay_config_and_utils::{Config, MAX_CORRELATION_MAX_AGE_SECS};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Memory bounds for outstanding uploads.
///
/// Both are unbounded by default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboxLimits {
    /// Maximum queued uploads; the oldest is dropped beyond this.
    pub retry_queue_capacity: Option<usize>,
    /// Maximum time an upload may wait for its acknowledgement.
    pub correlation_max_age: Option<Duration>,
}

impl From<&Config> for OutboxLimits {
    /// Ages above [`MAX_CORRELATION_MAX_AGE_SECS`] are clamped to it, so an
    /// unvalidated config still keeps a limit.
    fn from(config: &Config) -> Self {
        Self {
            retry_queue_capacity: config.retry_queue_capacity,
            correlation_max_age: config.correlation_max_age_secs.map(max_age_from_secs),
        }
    }
}

fn max_age_from_secs(secs: u64) -> Duration {
    let clamped = if secs > MAX_CORRELATION_MAX_AGE_SECS {
        warn!(
            configured = secs,
            max = MAX_CORRELATION_MAX_AGE_SECS,
            "Correlation max age too large, clamping"
        );
        MAX_CORRELATION_MAX_AGE_SECS
    } else {
        secs
    };

    // The ceiling is far inside the i64 range chrono accepts.
    i64::try_from(clamped)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or_else(|| Duration::days(365))
}

/// Snapshot of the coordinator's outstanding work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutboxStatus {
    /// Uploads waiting for the channel.
    pub queued: usize,
    /// Uploads (sent or queued) waiting for an acknowledgement.
    pub awaiting_ack: usize,
}

/// Result of handling a connection-opened event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Uploads the channel accepted during this pass.
    pub sent: usize,
    /// Uploads still queued afterwards.
    pub remaining: usize,
}

/// Coordinates upload submission, retry, and acknowledgement.
pub struct StatisticsCoordinator {
    sender: Arc<dyn ChannelSender>,
    presenter: Arc<dyn StatisticsPresenter>,
    table: Arc<CorrelationTable>,
    queue: RetryQueue,
    acks: AcknowledgementHandler,
    /// Serializes drain passes.
    drain_lock: Mutex<()>,
    limits: OutboxLimits,
}

impl StatisticsCoordinator {
    /// Create a coordinator bound to `sender`.
    pub fn new(
        sender: Arc<dyn ChannelSender>,
        presenter: Arc<dyn StatisticsPresenter>,
        notifier: Arc<dyn CompletionNotifier>,
        limits: OutboxLimits,
    ) -> Self {
        let table = Arc::new(CorrelationTable::new());
        let acks = AcknowledgementHandler::new(table.clone(), notifier);

        Self {
            sender,
            presenter,
            table,
            queue: RetryQueue::with_capacity(limits.retry_queue_capacity),
            acks,
            drain_lock: Mutex::new(()),
            limits,
        }
    }

    /// Submit one finished game's bundle for upload.
    ///
    /// Recipients with statistics in the bundle see their summary right away.
    /// The upload is then attempted; if the channel is down it is queued for
    /// the next connection-opened event. Either way the recipients are
    /// recorded against the returned id until the acknowledgement arrives.
    ///
    /// Fails if the bundle cannot be encoded or no message id is left, in
    /// which case nothing is presented, queued, or recorded.
    pub fn submit_bundle(
        &self,
        recipients: RecipientSet,
        namespace: &str,
        bundle: &StatisticBundle,
    ) -> OutboxResult<MessageId> {
        let stats = bundle.encode()?;
        let message_id = self.table.allocate_id()?;

        for recipient in &recipients {
            if let Some(summary) = StatisticsSummary::for_recipient(namespace, bundle, recipient) {
                self.presenter.present(recipient, &summary);
            }
        }

        if self.limits.correlation_max_age.is_some() {
            self.sweep_expired();
        }

        debug!(message_id = %message_id, namespace = %namespace, "Submitting statistic bundle");

        let body = UploadRequest::new(namespace, stats, message_id).to_document()?;
        let envelope = Envelope::new(message_id, body);

        // Recorded before the attempt so an acknowledgement racing the send
        // still resolves.
        self.table.record(message_id, recipients);

        match self.try_send(&envelope) {
            Ok(()) => {
                debug!(message_id = %message_id, namespace = %namespace, "Upload sent");
            }
            Err(e) => {
                debug!(message_id = %message_id, error = %e, "Upload deferred");
                let dropped = self.queue.enqueue(envelope);
                self.forget(&dropped);
            }
        }

        Ok(message_id)
    }

    /// Retry queued uploads after the channel reopens.
    ///
    /// Uploads are attempted in queue order; the first renewed failure stops
    /// the pass and that upload goes back to the head of the queue.
    pub fn on_connection_opened(&self) -> DrainReport {
        let _guard = self.drain_lock.lock();

        let outcome = self.queue.drain(|envelope| self.try_send(envelope).is_ok());
        let sent = outcome.sent();

        if let DrainOutcome::Stalled { envelope, .. } = outcome {
            debug!(message_id = %envelope.message_id, "Channel refused queued upload, stopping");
            let dropped = self.queue.restore_front(envelope);
            self.forget(&dropped);
        }

        let remaining = self.queue.len();
        if sent > 0 || remaining > 0 {
            info!(sent = sent, remaining = remaining, "Retried queued uploads");
        }

        DrainReport { sent, remaining }
    }

    /// Handle a parsed acknowledgement.
    pub fn on_response(&self, response: &UploadResponse) -> AckOutcome {
        self.acks.on_response(response)
    }

    /// Handle a raw acknowledgement document from the response topic.
    pub fn on_response_document(&self, document: &Value) -> AckOutcome {
        self.acks.on_response_document(document)
    }

    /// Drop correlation entries older than the configured max age.
    pub fn sweep_expired(&self) -> Vec<MessageId> {
        match self.limits.correlation_max_age {
            Some(max_age) => self.table.expire_older_than(max_age, Utc::now()),
            None => Vec::new(),
        }
    }

    pub fn status(&self) -> OutboxStatus {
        OutboxStatus {
            queued: self.queue.len(),
            awaiting_ack: self.table.len(),
        }
    }

    /// Ids of queued uploads, next to be retried first.
    pub fn queued_ids(&self) -> Vec<MessageId> {
        self.queue.snapshot_ids()
    }

    /// Recipients still waiting on `id`.
    pub fn awaiting(&self, id: MessageId) -> Option<RecipientSet> {
        self.table.recipients(id)
    }

    fn try_send(&self, envelope: &Envelope) -> OutboxResult<()> {
        if self.sender.send(&envelope.body) {
            Ok(())
        } else {
            Err(OutboxError::ChannelUnavailable(envelope.message_id))
        }
    }

    /// Uploads evicted from the queue will never be acknowledged.
    fn forget(&self, dropped: &[Envelope]) {
        for envelope in dropped {
            if self.table.resolve_and_remove(envelope.message_id).is_ok() {
                warn!(message_id = %envelope.message_id, "Abandoned upload evicted from retry queue");
            }
        }
    }
}
