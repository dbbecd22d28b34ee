//! Channel capability consumed by the outbox.
//!
//! The physical connection lives elsewhere; the outbox only needs to know
//! whether a document was accepted for transmission right now.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// A sender bound to one integration channel.
pub trait ChannelSender: Send + Sync {
    /// Hand a document to the channel.
    ///
    /// Returns `false` if the channel is currently unavailable; the caller is
    /// responsible for keeping the document for a later attempt.
    fn send(&self, document: &Value) -> bool;
}

/// A sender that records accepted documents, for tests and local runs.
///
/// Outcomes pushed with [`RecordingSender::push_outcomes`] are consumed first;
/// after that every attempt follows the availability flag.
#[derive(Debug, Default)]
pub struct RecordingSender {
    available: AtomicBool,
    scripted: Mutex<VecDeque<bool>>,
    accepted: Mutex<Vec<Value>>,
    attempts: AtomicUsize,
}

impl RecordingSender {
    /// Creates a sender with the given initial availability.
    pub fn new(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
            ..Self::default()
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Queue explicit outcomes for the next attempts.
    pub fn push_outcomes(&self, outcomes: impl IntoIterator<Item = bool>) {
        self.scripted.lock().extend(outcomes);
    }

    /// Documents the channel accepted, in acceptance order.
    pub fn accepted(&self) -> Vec<Value> {
        self.accepted.lock().clone()
    }

    /// `message_id` of every accepted document, in acceptance order.
    pub fn accepted_ids(&self) -> Vec<u64> {
        self.accepted
            .lock()
            .iter()
            .filter_map(|doc| doc.get("message_id").and_then(Value::as_u64))
            .collect()
    }

    /// Total number of send attempts, accepted or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ChannelSender for RecordingSender {
    fn send(&self, document: &Value) -> bool {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let outcome = self
            .scripted
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.available.load(Ordering::SeqCst));

        if outcome {
            self.accepted.lock().push(document.clone());
        }
        outcome
    }
}
