//! Async pump for transports that publish on a broadcast channel.

use crate::messages::UPLOAD_RESPONSE_TOPIC;
use crate::StatisticsCoordinator;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Events a transport publishes to the outbox.
#[derive(Debug, Clone)]
pub enum IntegrationEvent {
    /// Connectivity was (re)established.
    ConnectionOpened,
    /// Connectivity was lost.
    ConnectionClosed,
    /// A document arrived on `topic`.
    Message { topic: String, body: Value },
}

/// Feed transport events into the coordinator until the channel closes.
///
/// Returns the number of events received. A lagged receiver may have missed a
/// connection-opened event, so lag triggers a drain pass of its own.
pub async fn run_event_loop(
    coordinator: Arc<StatisticsCoordinator>,
    mut events: broadcast::Receiver<IntegrationEvent>,
) -> usize {
    let mut handled = 0;

    loop {
        match events.recv().await {
            Ok(event) => {
                handled += 1;
                dispatch(&coordinator, event);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped = skipped, "Event receiver lagged, retrying queued uploads");
                coordinator.on_connection_opened();
            }
            Err(RecvError::Closed) => {
                debug!(handled = handled, "Event channel closed");
                break;
            }
        }
    }

    handled
}

/// Spawn [`run_event_loop`] on the current tokio runtime.
pub fn spawn_event_loop(
    coordinator: Arc<StatisticsCoordinator>,
    events: broadcast::Receiver<IntegrationEvent>,
) -> JoinHandle<usize> {
    tokio::spawn(run_event_loop(coordinator, events))
}

fn dispatch(coordinator: &StatisticsCoordinator, event: IntegrationEvent) {
    match event {
        IntegrationEvent::ConnectionOpened => {
            coordinator.on_connection_opened();
        }
        IntegrationEvent::ConnectionClosed => {
            debug!("Connection closed, uploads will queue");
        }
        IntegrationEvent::Message { topic, body } if topic == UPLOAD_RESPONSE_TOPIC => {
            coordinator.on_response_document(&body);
        }
        IntegrationEvent::Message { topic, .. } => {
            debug!(topic = %topic, "Ignoring message on unrelated topic");
        }
    }
}
