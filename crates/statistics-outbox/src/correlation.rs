//! Correlation table mapping upload ids to the recipients awaiting them.

use crate::{MessageId, OutboxError, OutboxResult, RecipientSet};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
struct CorrelationEntry {
    recipients: RecipientSet,
    recorded_at: DateTime<Utc>,
}

/// Outstanding uploads keyed by message id.
///
/// Ids come from a process-wide counter owned by the table: they start at 1,
/// strictly increase, and are never handed out twice.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    last_id: AtomicU32,
    entries: Mutex<HashMap<MessageId, CorrelationEntry>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh message id.
    ///
    /// Fails once `u32::MAX` ids have been handed out; ids never wrap.
    pub fn allocate_id(&self) -> OutboxResult<MessageId> {
        self.last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
            .map(|last| MessageId(last + 1))
            .map_err(|_| {
                error!("Message id space exhausted");
                OutboxError::IdSpaceExhausted
            })
    }

    #[cfg(test)]
    pub(crate) fn set_last_id(&self, last: u32) {
        self.last_id.store(last, Ordering::SeqCst);
    }

    /// Record the recipients awaiting `id`, replacing any previous entry.
    pub fn record(&self, id: MessageId, recipients: RecipientSet) {
        self.record_at(id, recipients, Utc::now());
    }

    pub(crate) fn record_at(&self, id: MessageId, recipients: RecipientSet, now: DateTime<Utc>) {
        let entry = CorrelationEntry {
            recipients,
            recorded_at: now,
        };
        if self.entries.lock().insert(id, entry).is_some() {
            debug!(message_id = %id, "Replaced existing correlation entry");
        }
    }

    /// Remove and return the recipients awaiting `id`.
    pub fn resolve_and_remove(&self, id: MessageId) -> OutboxResult<RecipientSet> {
        self.entries
            .lock()
            .remove(&id)
            .map(|entry| entry.recipients)
            .ok_or(OutboxError::UnknownCorrelation(id))
    }

    /// Drop every entry recorded more than `max_age` before `now`.
    ///
    /// Returns the dropped ids in ascending order. A cutoff before the
    /// earliest representable time expires nothing.
    pub fn expire_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> Vec<MessageId> {
        let Some(cutoff) = now.checked_sub_signed(max_age) else {
            return Vec::new();
        };
        let mut expired = Vec::new();

        self.entries.lock().retain(|id, entry| {
            let keep = entry.recorded_at >= cutoff;
            if !keep {
                expired.push(*id);
            }
            keep
        });

        expired.sort_unstable();
        for id in &expired {
            warn!(message_id = %id, "Dropping upload that was never acknowledged");
        }
        expired
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    /// Recipients awaiting `id`, without removing the entry.
    pub fn recipients(&self, id: MessageId) -> Option<RecipientSet> {
        self.entries.lock().get(&id).map(|entry| entry.recipients.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
