//! Retry queue for uploads the channel refused.

use crate::MessageId;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// A fully built upload document and its correlation id.
///
/// Built once at submission and retried verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub message_id: MessageId,
    pub body: Value,
}

impl Envelope {
    pub fn new(message_id: MessageId, body: Value) -> Self {
        Self { message_id, body }
    }
}

/// Result of one drain pass.
#[derive(Debug, Clone, PartialEq)]
pub enum DrainOutcome {
    /// The queue ran empty.
    Drained { sent: usize },
    /// An attempt failed; the failed envelope is handed back to the caller and
    /// everything behind it is still queued.
    Stalled { sent: usize, envelope: Envelope },
}

impl DrainOutcome {
    pub fn sent(&self) -> usize {
        match self {
            DrainOutcome::Drained { sent } | DrainOutcome::Stalled { sent, .. } => *sent,
        }
    }
}

/// FIFO buffer of envelopes awaiting (re)transmission.
#[derive(Debug, Default)]
pub struct RetryQueue {
    pending: Mutex<VecDeque<Envelope>>,
    /// Maximum queued envelopes; `None` is unbounded.
    capacity: Option<usize>,
}

impl RetryQueue {
    /// Create an unbounded queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that drops its oldest envelope once `capacity` is exceeded.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            capacity: capacity.map(|c| c.max(1)),
        }
    }

    /// Append an envelope to the tail.
    ///
    /// Returns the envelopes dropped to stay within capacity, oldest first.
    pub fn enqueue(&self, envelope: Envelope) -> Vec<Envelope> {
        let mut pending = self.pending.lock();
        debug!(message_id = %envelope.message_id, queued = pending.len() + 1, "Queued upload for retry");
        pending.push_back(envelope);
        self.enforce_capacity(&mut pending)
    }

    /// Put an envelope back at the head, ahead of everything queued since it
    /// was taken out.
    pub fn restore_front(&self, envelope: Envelope) -> Vec<Envelope> {
        let mut pending = self.pending.lock();
        pending.push_front(envelope);
        self.enforce_capacity(&mut pending)
    }

    /// Attempt queued envelopes in order until one fails or the queue is empty.
    ///
    /// Each envelope is removed from the queue before `send_fn` runs, and the
    /// lock is not held during the call, so producers may enqueue concurrently.
    /// Envelopes enqueued during the pass are attempted in the same pass.
    pub fn drain(&self, mut send_fn: impl FnMut(&Envelope) -> bool) -> DrainOutcome {
        let mut sent = 0;

        loop {
            let next = self.pending.lock().pop_front();
            let Some(envelope) = next else {
                return DrainOutcome::Drained { sent };
            };

            if send_fn(&envelope) {
                sent += 1;
            } else {
                return DrainOutcome::Stalled { sent, envelope };
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Ids of the queued envelopes, head first.
    pub fn snapshot_ids(&self) -> Vec<MessageId> {
        self.pending.lock().iter().map(|e| e.message_id).collect()
    }

    fn enforce_capacity(&self, pending: &mut VecDeque<Envelope>) -> Vec<Envelope> {
        let Some(capacity) = self.capacity else {
            return Vec::new();
        };

        let mut dropped = Vec::new();
        while pending.len() > capacity {
            if let Some(oldest) = pending.pop_front() {
                warn!(
                    message_id = %oldest.message_id,
                    capacity = capacity,
                    "Retry queue full, dropping oldest upload"
                );
                dropped.push(oldest);
            }
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(id: u32) -> Envelope {
        Envelope::new(MessageId(id), json!({"message_id": id}))
    }

    #[test]
    fn test_retry_queue_new_is_empty() {
        let queue = RetryQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_retry_queue_enqueue_preserves_order() {
        let queue = RetryQueue::new();
        for id in 1..=3 {
            assert!(queue.enqueue(envelope(id)).is_empty());
        }

        assert_eq!(
            queue.snapshot_ids(),
            vec![MessageId(1), MessageId(2), MessageId(3)]
        );
    }

    #[test]
    fn test_retry_queue_drain_empty_is_noop() {
        let queue = RetryQueue::new();
        let mut calls = 0;

        let outcome = queue.drain(|_| {
            calls += 1;
            true
        });

        assert_eq!(outcome, DrainOutcome::Drained { sent: 0 });
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_retry_queue_drain_all() {
        let queue = RetryQueue::new();
        for id in 1..=3 {
            queue.enqueue(envelope(id));
        }

        let mut seen = Vec::new();
        let outcome = queue.drain(|e| {
            seen.push(e.message_id);
            true
        });

        assert_eq!(outcome, DrainOutcome::Drained { sent: 3 });
        assert_eq!(seen, vec![MessageId(1), MessageId(2), MessageId(3)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_retry_queue_drain_stops_at_first_failure() {
        let queue = RetryQueue::new();
        for id in 1..=4 {
            queue.enqueue(envelope(id));
        }

        let outcome = queue.drain(|e| e.message_id != MessageId(2));

        match outcome {
            DrainOutcome::Stalled { sent, envelope } => {
                assert_eq!(sent, 1);
                assert_eq!(envelope.message_id, MessageId(2));
            }
            other => panic!("expected stall, got {:?}", other),
        }
        // The failed envelope is out of the queue until the caller restores it
        assert_eq!(queue.snapshot_ids(), vec![MessageId(3), MessageId(4)]);
    }

    #[test]
    fn test_retry_queue_restore_front() {
        let queue = RetryQueue::new();
        queue.enqueue(envelope(2));
        queue.restore_front(envelope(1));

        assert_eq!(queue.snapshot_ids(), vec![MessageId(1), MessageId(2)]);
    }

    #[test]
    fn test_retry_queue_drain_sees_envelopes_enqueued_mid_pass() {
        let queue = RetryQueue::new();
        queue.enqueue(envelope(1));

        let mut seen = Vec::new();
        queue.drain(|e| {
            seen.push(e.message_id);
            if e.message_id == MessageId(1) {
                queue.enqueue(envelope(2));
            }
            true
        });

        assert_eq!(seen, vec![MessageId(1), MessageId(2)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_retry_queue_capacity_drops_oldest() {
        let queue = RetryQueue::with_capacity(Some(2));
        queue.enqueue(envelope(1));
        queue.enqueue(envelope(2));

        let dropped = queue.enqueue(envelope(3));

        assert_eq!(dropped, vec![envelope(1)]);
        assert_eq!(queue.snapshot_ids(), vec![MessageId(2), MessageId(3)]);
    }

    #[test]
    fn test_retry_queue_zero_capacity_treated_as_one() {
        let queue = RetryQueue::with_capacity(Some(0));
        queue.enqueue(envelope(1));
        queue.enqueue(envelope(2));

        assert_eq!(queue.snapshot_ids(), vec![MessageId(2)]);
    }

    #[test]
    fn test_drain_outcome_sent() {
        assert_eq!(DrainOutcome::Drained { sent: 4 }.sent(), 4);
        assert_eq!(
            DrainOutcome::Stalled {
                sent: 1,
                envelope: envelope(9)
            }
            .sent(),
            1
        );
    }
}
