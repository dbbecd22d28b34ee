//! Recipient-facing sinks.
//!
//! The outbox decides *when* recipients hear about a bundle; the sinks decide
//! what that looks like. Two moments exist:
//!
//! - a statistics summary, presented synchronously at submission
//! - a completion notice, delivered once the remote side acknowledges the upload

use crate::{MessageId, RecipientId, RecipientSet, StatisticBundle, StatisticKey, StatisticValue};
use parking_lot::Mutex;

const SEPARATOR: &str = "+--------------------------------------+";

/// One recipient's view of a bundle, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsSummary {
    pub namespace: String,
    pub entries: Vec<(StatisticKey, StatisticValue)>,
}

impl StatisticsSummary {
    /// Summary for `recipient`, or `None` if the bundle holds nothing for them.
    pub fn for_recipient(
        namespace: &str,
        bundle: &StatisticBundle,
        recipient: &RecipientId,
    ) -> Option<Self> {
        let view = bundle.for_recipient(recipient);
        if view.is_empty() {
            return None;
        }

        let mut entries = Vec::with_capacity(view.len());
        view.visit_all(|key, value| entries.push((key.clone(), value)));

        Some(Self {
            namespace: namespace.to_string(),
            entries,
        })
    }

    /// Plain-text rendering: framed header followed by one line per statistic.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.entries.len() + 3);
        lines.push(SEPARATOR.to_string());
        lines.push(format!("Statistics for {}", self.namespace));
        for (key, value) in &self.entries {
            lines.push(format!("  {key}: {value}"));
        }
        lines.push(SEPARATOR.to_string());
        lines
    }
}

/// Receives statistic summaries for individual recipients.
pub trait StatisticsPresenter: Send + Sync {
    fn present(&self, recipient: &RecipientId, summary: &StatisticsSummary);
}

/// Confirmation that the remote side stored an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotice {
    pub message_id: MessageId,
    /// Reference assigned by the remote side to the uploaded game.
    pub game_id: String,
}

/// Receives completion notices for the recipients of an acknowledged upload.
pub trait CompletionNotifier: Send + Sync {
    fn notify(&self, recipients: &RecipientSet, notice: &CompletionNotice);
}

/// Discards everything.
///
/// This is the default completion notifier while there is nothing to link to.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl StatisticsPresenter for NullSink {
    fn present(&self, _recipient: &RecipientId, _summary: &StatisticsSummary) {}
}

impl CompletionNotifier for NullSink {
    fn notify(&self, _recipients: &RecipientSet, _notice: &CompletionNotice) {}
}

/// Sends each recipient a link to the uploaded game.
pub struct WebLinkNotifier {
    base_url: String,
    deliver: Box<dyn Fn(&RecipientId, &str) + Send + Sync>,
}

impl WebLinkNotifier {
    /// `deliver` is called once per recipient with the rendered link.
    pub fn new(
        base_url: impl Into<String>,
        deliver: impl Fn(&RecipientId, &str) + Send + Sync + 'static,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            deliver: Box::new(deliver),
        }
    }

    /// Link for a game, e.g. `https://nucleoid.xyz/game/#abc`.
    pub fn link_for(&self, game_id: &str) -> String {
        format!("{}#{}", self.base_url, game_id)
    }
}

impl CompletionNotifier for WebLinkNotifier {
    fn notify(&self, recipients: &RecipientSet, notice: &CompletionNotice) {
        let link = self.link_for(&notice.game_id);
        for recipient in recipients {
            (self.deliver)(recipient, &link);
        }
    }
}

/// Records summaries for tests.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    presented: Mutex<Vec<(RecipientId, StatisticsSummary)>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> Vec<(RecipientId, StatisticsSummary)> {
        self.presented.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.presented.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatisticsPresenter for RecordingPresenter {
    fn present(&self, recipient: &RecipientId, summary: &StatisticsSummary) {
        self.presented
            .lock()
            .push((recipient.clone(), summary.clone()));
    }
}

/// Records completion notices for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(RecipientSet, CompletionNotice)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(RecipientSet, CompletionNotice)> {
        self.notices.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CompletionNotifier for RecordingNotifier {
    fn notify(&self, recipients: &RecipientSet, notice: &CompletionNotice) {
        self.notices.lock().push((recipients.clone(), notice.clone()));
    }
}
