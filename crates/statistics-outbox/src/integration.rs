//! Binding the coordinator to an integrations hub and to finished games.

use crate::messages::{UPLOAD_CHANNEL, UPLOAD_RESPONSE_TOPIC};
use crate::sink::{CompletionNotifier, StatisticsPresenter};
use crate::transport::ChannelSender;
use crate::{
    MessageId, OutboxError, OutboxLimits, RecipientSet, StatisticBundle, StatisticsCoordinator,
};
use relay_config_and_utils::Config;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Callback run when the hub's connection (re)opens.
pub type ConnectionOpenHandler = Box<dyn Fn() + Send + Sync>;

/// Callback run for each document received on a topic.
pub type ReceiveHandler = Box<dyn Fn(&Value) + Send + Sync>;

/// The connection-owning side the integration registers with.
pub trait IntegrationHub {
    /// Open a sender for one outbound channel.
    fn open_sender(&self, channel: &str) -> Arc<dyn ChannelSender>;

    /// Register a callback for every connection-opened event.
    fn bind_connection_open(&self, handler: ConnectionOpenHandler);

    /// Register a callback for documents received on `topic`.
    fn bind_receiver(&self, topic: &str, handler: ReceiveHandler);
}

/// Why a game closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The game ran to completion.
    Finished,
    /// The game was stopped before completion.
    Canceled,
    /// The game closed because of an error.
    Errored,
}

/// A game at the moment it closed.
#[derive(Debug, Clone, Default)]
pub struct ClosedGame {
    /// Participants at close time.
    pub participants: RecipientSet,
    /// Statistic bundles by namespace.
    pub bundles: BTreeMap<String, StatisticBundle>,
}

/// What [`StatisticsIntegration::on_game_closed`] submitted.
#[derive(Debug, Default)]
pub struct GameUploadReport {
    /// Ids of the bundles accepted for upload, in namespace order.
    pub submitted: Vec<MessageId>,
    /// Namespaces whose bundle was refused, with the reason.
    pub rejected: Vec<(String, OutboxError)>,
}

impl GameUploadReport {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Statistics upload wired into a hub.
pub struct StatisticsIntegration {
    coordinator: Arc<StatisticsCoordinator>,
}

impl StatisticsIntegration {
    /// Wire a coordinator into `hub`, or return `None` if uploads are disabled.
    ///
    /// Registers a drain on connection-opened and the acknowledgement handler
    /// on the response topic. The hub's callbacks hold weak references, so
    /// dropping the integration stops them.
    pub fn bind(
        hub: &dyn IntegrationHub,
        config: &Config,
        presenter: Arc<dyn StatisticsPresenter>,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Option<Self> {
        if !config.send_statistics {
            debug!("Statistics upload disabled");
            return None;
        }

        let sender = hub.open_sender(UPLOAD_CHANNEL);
        let coordinator = Arc::new(StatisticsCoordinator::new(
            sender,
            presenter,
            notifier,
            OutboxLimits::from(config),
        ));

        let weak = Arc::downgrade(&coordinator);
        hub.bind_connection_open(Box::new(move || {
            if let Some(coordinator) = weak.upgrade() {
                coordinator.on_connection_opened();
            }
        }));

        let weak = Arc::downgrade(&coordinator);
        hub.bind_receiver(
            UPLOAD_RESPONSE_TOPIC,
            Box::new(move |document| {
                if let Some(coordinator) = weak.upgrade() {
                    coordinator.on_response_document(document);
                }
            }),
        );

        info!(channel = UPLOAD_CHANNEL, "Statistics upload bound");
        Some(Self { coordinator })
    }

    /// Submit every bundle of a game that finished.
    ///
    /// A refused bundle does not stop the others. Games closed for any other
    /// reason upload nothing.
    pub fn on_game_closed(&self, game: &ClosedGame, reason: CloseReason) -> GameUploadReport {
        let mut report = GameUploadReport::default();
        if reason != CloseReason::Finished {
            debug!(reason = ?reason, "Skipping statistics for unfinished game");
            return report;
        }

        for (namespace, bundle) in &game.bundles {
            match self
                .coordinator
                .submit_bundle(game.participants.clone(), namespace, bundle)
            {
                Ok(id) => report.submitted.push(id),
                Err(e) => {
                    warn!(namespace = %namespace, error = %e, "Statistic bundle refused");
                    report.rejected.push((namespace.clone(), e));
                }
            }
        }
        report
    }

    pub fn coordinator(&self) -> &Arc<StatisticsCoordinator> {
        &self.coordinator
    }
}
