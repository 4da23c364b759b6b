mod common;

use common::*;
use nad_control::{
    PollOutcome, PowerState, Receiver, ReceiverSnapshot, ReconciliationPolicy, TransportHandle,
    ZoneSnapshot,
};
use std::sync::Arc;

fn legacy_receiver() -> (Receiver, Arc<ScriptedLine>) {
    let line = Arc::new(ScriptedLine::new());
    let receiver =
        Receiver::with_transport(&legacy_config(), TransportHandle::Line(line.clone())).unwrap();
    (receiver, line)
}

fn tcp_receiver(script: StatusScript) -> (Receiver, Arc<ScriptedStatus>) {
    let transport = Arc::new(ScriptedStatus::new(script));
    let receiver =
        Receiver::with_transport(&tcp_config(), TransportHandle::Status(transport.clone()))
            .unwrap();
    (receiver, transport)
}

#[tokio::test]
async fn powered_main_zone_is_fully_read() {
    let (receiver, line) = legacy_receiver();
    script_main_on(&line);

    receiver.update().await;

    assert_eq!(
        receiver.snapshot().main,
        ZoneSnapshot {
            power: PowerState::On,
            muted: Some(true),
            volume: Some(0.5),
            source: Some("CD".to_string()),
        }
    );
    assert!(receiver.available());
    assert_eq!(receiver.state(), PowerState::On);
    assert_eq!(receiver.is_volume_muted(), Some(true));
    assert_eq!(receiver.volume_level(), Some(0.5));
    assert_eq!(receiver.source().as_deref(), Some("CD"));
}

#[tokio::test]
async fn unreadable_main_power_skips_secondary_zones() {
    let (receiver, line) = legacy_receiver();
    line.reply("Zone2.Power?", "Zone2.Power=On");

    let outcome = receiver.update().await;

    assert_eq!(outcome, PollOutcome::Unavailable(ReceiverSnapshot::default()));
    assert_eq!(receiver.snapshot(), ReceiverSnapshot::default());
    assert!(!receiver.available());
    assert_eq!(line.queried(), vec!["Main.Power?"]);
}

#[tokio::test]
async fn losing_main_power_wipes_previous_snapshot() {
    let (receiver, line) = legacy_receiver();
    script_main_on(&line);
    line.reply("Zone2.Power?", "Zone2.Power=On");
    line.reply("Zone2.Volume?", "Zone2.Volume=-20");
    receiver.update().await;
    assert!(receiver.available());

    line.go_silent();
    receiver.update().await;

    assert_eq!(receiver.snapshot(), ReceiverSnapshot::default());
    assert_eq!(receiver.state(), PowerState::Unknown);
    assert!(!receiver.available());
}

#[tokio::test]
async fn power_off_clears_zone_values() {
    let (receiver, line) = legacy_receiver();
    script_main_on(&line);
    line.reply("Zone2.Power?", "Zone2.Power=On");
    line.reply("Zone2.Mute?", "Zone2.Mute=On");
    line.reply("Zone2.Volume?", "Zone2.Volume=-38");
    receiver.update().await;
    assert_eq!(receiver.snapshot().zone2.volume, Some(0.75));

    line.reply("Main.Power?", "Main.Power=Off");
    line.reply("Zone2.Power?", "Zone2.Power=Off");
    receiver.update().await;

    let snapshot = receiver.snapshot();
    assert_eq!(snapshot.main, ZoneSnapshot::off(None));
    assert_eq!(snapshot.main.muted, None);
    assert_eq!(snapshot.main.source, None);
    assert_eq!(snapshot.zone2.power, PowerState::Off);
    assert_eq!(snapshot.zone2.muted, Some(false));
    assert_eq!(snapshot.zone2.volume, None);
    assert!(receiver.available());
}

#[tokio::test]
async fn powered_off_main_zone_is_not_queried_further() {
    let (receiver, line) = legacy_receiver();
    line.reply("Main.Power?", "Main.Power=Off");

    receiver.update().await;

    let queried = line.queried();
    assert!(!queried.iter().any(|q| q.starts_with("Main.") && q != "Main.Power?"));
    assert!(queried.contains(&"Zone2.Power?".to_string()));
    assert!(queried.contains(&"Zone3.Power?".to_string()));
}

#[tokio::test]
async fn receiver_without_volume_report() {
    let (receiver, line) = legacy_receiver();
    line.reply("Main.Power?", "Main.Power=On");
    line.reply("Main.Mute?", "Main.Mute=Off");
    line.reply("Main.Source?", "Main.Source=1");

    receiver.update().await;

    let main = receiver.snapshot().main;
    assert_eq!(main.power, PowerState::On);
    assert_eq!(main.muted, Some(false));
    assert_eq!(main.volume, None);
    assert_eq!(main.source.as_deref(), Some("Tuner"));
}

#[tokio::test]
async fn unmapped_source_index_is_unknown() {
    let (receiver, line) = legacy_receiver();
    script_main_on(&line);
    line.reply("Main.Source?", "Main.Source=7");

    receiver.update().await;

    assert_eq!(receiver.source(), None);
}

#[tokio::test]
async fn secondary_zones_reconcile_independently() {
    let (receiver, line) = legacy_receiver();
    line.reply("Main.Power?", "Main.Power=Off");
    line.reply("Zone2.Power?", "Zone2.Power=On");
    line.reply("Zone2.Mute?", "Zone2.Mute=Off");
    line.reply("Zone2.Volume?", "Zone2.Volume=-92");
    line.reply("Zone2.Source?", "Zone2.Source=5");

    receiver.update().await;

    let snapshot = receiver.snapshot();
    assert_eq!(snapshot.main.power, PowerState::Off);
    assert_eq!(
        snapshot.zone2,
        ZoneSnapshot {
            power: PowerState::On,
            muted: Some(false),
            volume: Some(0.0),
            source: Some("Aux".to_string()),
        }
    );
    assert_eq!(snapshot.zone3, ZoneSnapshot::unknown());

    let attrs = receiver.extra_state_attributes();
    assert_eq!(attrs.zone2_state, PowerState::On);
    assert_eq!(attrs.zone2_volume_level, Some(0.0));
    assert_eq!(attrs.zone3_state, PowerState::Unknown);
}

#[tokio::test]
async fn legacy_volume_beyond_range_is_not_clamped() {
    let (receiver, line) = legacy_receiver();
    script_main_on(&line);
    line.reply("Main.Volume?", "Main.Volume=-10");

    receiver.update().await;

    let volume = receiver.volume_level().unwrap();
    assert!(volume > 1.0);
}

#[tokio::test]
async fn tcp_poll_reads_status() {
    let (receiver, _) = tcp_receiver(StatusScript::Reply(status(true, 80, false, "Dock")));

    let outcome = receiver.update().await;

    assert!(matches!(outcome, PollOutcome::Updated(_)));
    assert_eq!(
        receiver.snapshot().main,
        ZoneSnapshot {
            power: PowerState::On,
            muted: Some(false),
            volume: Some(0.5),
            source: Some("Dock".to_string()),
        }
    );
    assert_eq!(receiver.snapshot().zone2, ZoneSnapshot::unknown());
}

#[tokio::test]
async fn tcp_unreachable_keeps_previous_snapshot() {
    let (receiver, transport) =
        tcp_receiver(StatusScript::Reply(status(true, 140, true, "Bluetooth")));
    receiver.update().await;
    let before = receiver.snapshot();

    transport.set(StatusScript::Unreachable);
    let outcome = receiver.update().await;

    assert_eq!(outcome, PollOutcome::Skipped);
    assert_eq!(receiver.snapshot(), before);
    assert!(receiver.available());
    assert_eq!(receiver.volume_level(), Some(1.0));
}

#[tokio::test]
async fn tcp_unusable_reply_is_skipped() {
    let (receiver, _) = tcp_receiver(StatusScript::Garbage);

    assert_eq!(receiver.update().await, PollOutcome::Skipped);
    assert!(!receiver.available());
}

#[tokio::test]
async fn tcp_volume_is_clamped() {
    let (receiver, transport) = tcp_receiver(StatusScript::Reply(status(true, 180, false, "Dock")));
    receiver.update().await;
    assert_eq!(receiver.volume_level(), Some(1.0));

    transport.set(StatusScript::Reply(status(true, 0, false, "Dock")));
    receiver.update().await;
    assert_eq!(receiver.volume_level(), Some(0.0));
}

#[tokio::test]
async fn tcp_power_off_clears_values() {
    let (receiver, transport) = tcp_receiver(StatusScript::Reply(status(true, 80, true, "Dock")));
    receiver.update().await;

    transport.set(StatusScript::Reply(status(false, 80, true, "Dock")));
    receiver.update().await;

    assert_eq!(receiver.snapshot().main, ZoneSnapshot::off(None));
    assert_eq!(receiver.state(), PowerState::Off);
}

#[test]
fn policies_follow_transport_family() {
    let (legacy, _) = legacy_receiver();
    assert_eq!(legacy.policy(), ReconciliationPolicy::WipeOnMainPowerLoss);

    let (tcp, _) = tcp_receiver(StatusScript::Garbage);
    assert_eq!(tcp.policy(), ReconciliationPolicy::SkipCycleOnUnreachable);
}

#[tokio::test]
async fn completed_polls_are_broadcast() {
    let (receiver, transport) = tcp_receiver(StatusScript::Reply(status(true, 80, false, "Dock")));
    let mut updates = receiver.subscribe();

    receiver.update().await;
    let snapshot = updates.try_recv().unwrap();
    assert_eq!(snapshot.main.power, PowerState::On);

    transport.set(StatusScript::Unreachable);
    receiver.update().await;
    assert!(updates.try_recv().is_none());
}

#[tokio::test]
async fn lagging_subscriber_skips_to_buffered_snapshots() {
    let (receiver, _) = tcp_receiver(StatusScript::Reply(status(true, 80, false, "Dock")));
    let mut updates = receiver.subscribe();

    for _ in 0..40 {
        receiver.update().await;
    }

    let snapshot = updates.try_recv().unwrap();
    assert_eq!(snapshot.main.source.as_deref(), Some("Dock"));
}

#[tokio::test]
async fn subscription_ends_when_receiver_is_dropped() {
    let (receiver, _) = tcp_receiver(StatusScript::Reply(status(true, 80, false, "Dock")));
    let mut updates = receiver.subscribe();

    receiver.update().await;
    drop(receiver);

    assert!(updates.recv().await.is_some());
    assert!(updates.recv().await.is_none());
}

#[tokio::test]
async fn poller_runs_updates_until_stopped() {
    let (receiver, line) = legacy_receiver();
    script_main_on(&line);
    let receiver = Arc::new(receiver);
    let mut updates = receiver.subscribe();

    let poller = receiver.spawn_poller(std::time::Duration::from_secs(30));
    let snapshot = updates.recv().await.unwrap();
    poller.stop().await;

    assert_eq!(snapshot.main.source.as_deref(), Some("CD"));
    assert!(receiver.available());
}
