//! Hub registration and the finished-game hook.

use super::{bundle_for, recipients, LoopbackHub};
use crate::integration::{CloseReason, ClosedGame, StatisticsIntegration};
use crate::sink::{NullSink, RecordingNotifier, RecordingPresenter, WebLinkNotifier};
use crate::{MessageId, OutboxError, UPLOAD_CHANNEL, UPLOAD_RESPONSE_TOPIC};
use parking_lot::Mutex;
use relay_config_and_utils::Config;
use serde_json::json;
use std::sync::Arc;

fn enabled() -> Config {
    Config {
        send_statistics: true,
        ..Config::default()
    }
}

fn finished_game() -> ClosedGame {
    let mut game = ClosedGame {
        participants: recipients(&["p1", "p2"]),
        ..ClosedGame::default()
    };
    game.bundles.insert("spleef".to_string(), bundle_for(&["p1"]));
    game.bundles.insert("bedwars".to_string(), bundle_for(&["p2"]));
    game
}

fn bind(
    hub: &LoopbackHub,
    config: &Config,
) -> (Option<StatisticsIntegration>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let integration = StatisticsIntegration::bind(
        hub,
        config,
        Arc::new(RecordingPresenter::new()),
        notifier.clone(),
    );
    (integration, notifier)
}

#[test]
fn bind_disabled_registers_nothing() {
    let hub = LoopbackHub::new(true);

    let (integration, _) = bind(&hub, &Config::default());

    assert!(integration.is_none());
    assert!(hub.opened_channels.lock().is_empty());
    assert!(hub.connection_handlers.lock().is_empty());
    assert!(hub.receivers.lock().is_empty());
}

#[test]
fn bind_opens_upload_channel_and_response_topic() {
    let hub = LoopbackHub::new(true);

    let (integration, _) = bind(&hub, &enabled());

    assert!(integration.is_some());
    assert_eq!(*hub.opened_channels.lock(), vec![UPLOAD_CHANNEL.to_string()]);
    assert_eq!(hub.connection_handlers.lock().len(), 1);
    let receivers = hub.receivers.lock();
    assert_eq!(receivers.len(), 1);
    assert_eq!(receivers[0].0, UPLOAD_RESPONSE_TOPIC);
}

#[test]
fn finished_game_uploads_every_namespace() {
    let hub = LoopbackHub::new(true);
    let (integration, _) = bind(&hub, &enabled());
    let integration = integration.unwrap();

    let report = integration.on_game_closed(&finished_game(), CloseReason::Finished);

    assert!(report.is_complete());
    assert_eq!(report.submitted, vec![MessageId(1), MessageId(2)]);
    let accepted = hub.sender.accepted();
    assert_eq!(accepted.len(), 2);
    // Namespaces are submitted in sorted order.
    assert_eq!(accepted[0]["bundle"]["namespace"], "bedwars");
    assert_eq!(accepted[1]["bundle"]["namespace"], "spleef");
}

#[test]
fn refused_bundle_does_not_hide_the_others() {
    let hub = LoopbackHub::new(true);
    let (integration, _) = bind(&hub, &enabled());
    let integration = integration.unwrap();
    let mut game = finished_game();
    let mut broken = bundle_for(&["p1"]);
    broken.set_global("ratio", f64::NAN);
    game.bundles.insert("ctf".to_string(), broken);

    let report = integration.on_game_closed(&game, CloseReason::Finished);

    assert!(!report.is_complete());
    assert_eq!(report.submitted, vec![MessageId(1), MessageId(2)]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].0, "ctf");
    assert!(matches!(report.rejected[0].1, OutboxError::MalformedPayload(_)));
    assert_eq!(hub.sender.accepted_ids(), vec![1, 2]);
    assert_eq!(integration.coordinator().status().awaiting_ack, 2);
}

#[test]
fn unfinished_games_upload_nothing() {
    let hub = LoopbackHub::new(true);
    let (integration, _) = bind(&hub, &enabled());
    let integration = integration.unwrap();

    for reason in [CloseReason::Canceled, CloseReason::Errored] {
        let report = integration.on_game_closed(&finished_game(), reason);
        assert!(report.submitted.is_empty());
        assert!(report.rejected.is_empty());
    }

    assert_eq!(hub.sender.attempts(), 0);
    assert_eq!(integration.coordinator().status().awaiting_ack, 0);
}

#[test]
fn connection_open_drains_queued_uploads() {
    let hub = LoopbackHub::new(false);
    let (integration, _) = bind(&hub, &enabled());
    let integration = integration.unwrap();

    integration.on_game_closed(&finished_game(), CloseReason::Finished);
    assert_eq!(integration.coordinator().status().queued, 2);

    hub.open_connection();

    assert_eq!(integration.coordinator().status().queued, 0);
    assert_eq!(hub.sender.accepted_ids(), vec![1, 2]);
}

#[test]
fn response_topic_resolves_acknowledgements() {
    let hub = LoopbackHub::new(true);
    let (integration, notifier) = bind(&hub, &enabled());
    let integration = integration.unwrap();
    integration.on_game_closed(&finished_game(), CloseReason::Finished);

    hub.receive(UPLOAD_RESPONSE_TOPIC, &json!({"message_id": 2, "game_id": "g2"}));
    hub.receive("other_topic", &json!({"message_id": 1, "game_id": "g1"}));

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].1.message_id, MessageId(2));
    assert_eq!(notices[0].0, recipients(&["p1", "p2"]));
    assert_eq!(integration.coordinator().status().awaiting_ack, 1);
}

#[test]
fn malformed_response_is_dropped() {
    let hub = LoopbackHub::new(true);
    let (integration, notifier) = bind(&hub, &enabled());
    let integration = integration.unwrap();
    integration.on_game_closed(&finished_game(), CloseReason::Finished);

    hub.receive(UPLOAD_RESPONSE_TOPIC, &json!({"game_id": "g1"}));
    hub.receive(UPLOAD_RESPONSE_TOPIC, &json!("not an object"));

    assert!(notifier.is_empty());
    assert_eq!(integration.coordinator().status().awaiting_ack, 2);
}

#[test]
fn callbacks_are_inert_after_integration_dropped() {
    let hub = LoopbackHub::new(false);
    let (integration, notifier) = bind(&hub, &enabled());
    let integration = integration.unwrap();
    integration.on_game_closed(&finished_game(), CloseReason::Finished);

    drop(integration);
    hub.open_connection();
    hub.receive(UPLOAD_RESPONSE_TOPIC, &json!({"message_id": 1, "game_id": "g1"}));

    assert!(hub.sender.accepted().is_empty());
    assert!(notifier.is_empty());
}

#[test]
fn web_links_use_configured_base() {
    let hub = LoopbackHub::new(true);
    let config = enabled();
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delivered);
    let notifier = WebLinkNotifier::new(config.web_url_base.clone(), move |recipient, link| {
        sink.lock().push((recipient.to_string(), link.to_string()));
    });

    let integration =
        StatisticsIntegration::bind(&hub, &config, Arc::new(NullSink), Arc::new(notifier))
            .unwrap();
    integration.on_game_closed(&finished_game(), CloseReason::Finished);
    hub.receive(UPLOAD_RESPONSE_TOPIC, &json!({"message_id": 1, "game_id": "abc"}));

    let delivered = delivered.lock();
    assert_eq!(
        *delivered,
        vec![
            ("p1".to_string(), format!("{}#abc", config.web_url_base)),
            ("p2".to_string(), format!("{}#abc", config.web_url_base)),
        ]
    );
}
