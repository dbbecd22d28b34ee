//! At-least-once upload of finished-game statistics.
//!
//! This crate provides:
//! - StatisticsCoordinator: submits bundles, queues them while the channel is
//!   down, and retries them in order when it reopens
//! - CorrelationTable: tracks which recipients await each upload's acknowledgement
//! - RetryQueue: FIFO buffer of uploads the channel refused
//! - AcknowledgementHandler: resolves inbound acknowledgements and notifies recipients
//! - StatisticsIntegration: wires the coordinator into an integrations hub
//!
//! ## Flow
//!
//! ```text
//! finished game ──▶ submit_bundle ──▶ send ──ok──▶ awaiting ack
//!                                      │
//!                                    fail
//!                                      ▼
//!                                 RetryQueue ◀── connection opened (drain in order)
//!
//! upload response ──▶ AcknowledgementHandler ──▶ CompletionNotifier
//! ```

pub mod ack;
mod coordinator;
mod correlation;
mod error;
pub mod events;
pub mod integration;
mod messages;
pub mod queue;
pub mod sink;
mod stats;
pub mod transport;
mod types;

#[cfg(test)]
mod tests;

pub use ack::{AckOutcome, AcknowledgementHandler};
pub use coordinator::{DrainReport, OutboxLimits, OutboxStatus, StatisticsCoordinator};
pub use correlation::CorrelationTable;
pub use error::{OutboxError, OutboxResult};
pub use events::{run_event_loop, spawn_event_loop, IntegrationEvent};
pub use integration::{
    ClosedGame, CloseReason, ConnectionOpenHandler, GameUploadReport, IntegrationHub,
    ReceiveHandler, StatisticsIntegration,
};
pub use messages::{BundlePayload, UploadRequest, UploadResponse, UPLOAD_CHANNEL, UPLOAD_RESPONSE_TOPIC};
pub use queue::{DrainOutcome, Envelope, RetryQueue};
pub use sink::{
    CompletionNotice, CompletionNotifier, NullSink, RecordingNotifier, RecordingPresenter,
    StatisticsPresenter, StatisticsSummary, WebLinkNotifier,
};
pub use stats::{RecipientStatistics, StatisticBundle, StatisticKey, StatisticValue};
pub use transport::{ChannelSender, RecordingSender};
pub use types::{MessageId, RecipientId, RecipientSet};
