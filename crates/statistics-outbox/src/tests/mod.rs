//! Scenario tests for the statistics outbox.
//!
//! - `properties.rs`  - delivery, retry, and acknowledgement guarantees
//! - `concurrency.rs` - producers, drains, and acknowledgements on many threads
//! - `binding.rs`     - hub registration and finished-game hook

mod binding;

use crate::integration::{ConnectionOpenHandler, IntegrationHub, ReceiveHandler};
use crate::sink::{RecordingNotifier, RecordingPresenter};
use crate::transport::{ChannelSender, RecordingSender};
use crate::{OutboxLimits, RecipientId, RecipientSet, StatisticBundle, StatisticsCoordinator};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// A coordinator wired to recording collaborators.
struct Fixture {
    coordinator: Arc<StatisticsCoordinator>,
    sender: Arc<RecordingSender>,
    presenter: Arc<RecordingPresenter>,
    notifier: Arc<RecordingNotifier>,
}

impl Fixture {
    fn new(available: bool) -> Self {
        Self::with_limits(available, OutboxLimits::default())
    }

    fn with_limits(available: bool, limits: OutboxLimits) -> Self {
        let sender = Arc::new(RecordingSender::new(available));
        let presenter = Arc::new(RecordingPresenter::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let coordinator = Arc::new(StatisticsCoordinator::new(
            sender.clone(),
            presenter.clone(),
            notifier.clone(),
            limits,
        ));

        Self {
            coordinator,
            sender,
            presenter,
            notifier,
        }
    }
}

fn recipients(ids: &[&str]) -> RecipientSet {
    ids.iter().map(|id| RecipientId::from(*id)).collect()
}

/// A bundle with one statistic for each of `ids`.
fn bundle_for(ids: &[&str]) -> StatisticBundle {
    let mut bundle = StatisticBundle::new();
    for id in ids {
        bundle.set(&RecipientId::from(*id), "wins", 1);
    }
    bundle
}

/// In-process hub that lets tests fire connection and receive events.
#[derive(Default)]
struct LoopbackHub {
    sender: Arc<RecordingSender>,
    opened_channels: Mutex<Vec<String>>,
    connection_handlers: Mutex<Vec<ConnectionOpenHandler>>,
    receivers: Mutex<Vec<(String, ReceiveHandler)>>,
}

impl LoopbackHub {
    fn new(available: bool) -> Self {
        Self {
            sender: Arc::new(RecordingSender::new(available)),
            ..Self::default()
        }
    }

    fn open_connection(&self) {
        self.sender.set_available(true);
        for handler in self.connection_handlers.lock().iter() {
            handler();
        }
    }

    fn receive(&self, topic: &str, document: &Value) {
        for (bound, handler) in self.receivers.lock().iter() {
            if bound == topic {
                handler(document);
            }
        }
    }
}

impl IntegrationHub for LoopbackHub {
    fn open_sender(&self, channel: &str) -> Arc<dyn ChannelSender> {
        self.opened_channels.lock().push(channel.to_string());
        self.sender.clone()
    }

    fn bind_connection_open(&self, handler: ConnectionOpenHandler) {
        self.connection_handlers.lock().push(handler);
    }

    fn bind_receiver(&self, topic: &str, handler: ReceiveHandler) {
        self.receivers.lock().push((topic.to_string(), handler));
    }
}
