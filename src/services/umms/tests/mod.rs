//! Unit tests for the UMMS client service
//!
//! Session lifecycle and notification handling run against an in-memory
//! bus; value types and rendering are tested directly.

use std::{sync::Arc, time::Duration};

use tokio::{sync::broadcast, time::timeout};

use crate::services::umms::{
    AudioCall, AudioOutput, CallOutput, DecodeError, EventSource, MetadataEntry, OutputCall,
    PlayerCall, PlayerEvent, PlayerPath, PlayerRequest, PlayerSignal, PlayerState,
    ProtocolVersion, Rectangle, SessionError, SessionManager, SignalKind, StatePayload,
    TargetDescriptor, TargetInfo, VideoCall, testing::MockBus,
};

fn session(version: ProtocolVersion) -> (Arc<MockBus>, SessionManager) {
    let bus = Arc::new(MockBus::default());
    let session = SessionManager::new(bus.clone(), version);
    (bus, session)
}

async fn next_event(events: &mut broadcast::Receiver<PlayerEvent>) -> PlayerEvent {
    timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

fn player(path: &str) -> EventSource {
    EventSource::Player(PlayerPath::new(path))
}

#[tokio::test]
async fn request_makes_handle_current() {
    let (bus, session) = session(ProtocolVersion::Extended);

    let handle = session.request_player(PlayerRequest::Attended).await.unwrap();

    assert_eq!(session.current(), Some(handle.clone()));
    assert!(handle.is_attended());
    assert!(bus.subscriptions(handle.path()).contains(&SignalKind::NeedReply));
    assert!(bus.subscriptions(handle.path()).contains(&SignalKind::TargetReady));
}

#[tokio::test]
async fn unattended_request_skips_liveness_subscription() {
    let (bus, session) = session(ProtocolVersion::Standard);

    let handle = session
        .request_player(PlayerRequest::Unattended(Duration::from_secs(5)))
        .await
        .unwrap();

    assert!(!handle.is_attended());
    let signals = bus.subscriptions(handle.path());
    assert!(!signals.contains(&SignalKind::NeedReply));
    assert!(!signals.contains(&SignalKind::TargetReady));
    assert!(signals.contains(&SignalKind::PlayerStateChanged));
}

#[tokio::test]
async fn new_request_supersedes_without_removing() {
    let (bus, session) = session(ProtocolVersion::Extended);

    let first = session.request_player(PlayerRequest::Attended).await.unwrap();
    let second = session.request_player(PlayerRequest::Attended).await.unwrap();

    assert_ne!(first.path(), second.path());
    assert_eq!(session.current(), Some(second));

    let mut events = session.events();
    bus.emit(first.path(), PlayerSignal::Eof);
    assert_eq!(
        next_event(&mut events).await,
        PlayerEvent::Notice {
            source: EventSource::Player(first.path().clone()),
            signal: PlayerSignal::Eof,
        }
    );
}

#[tokio::test]
async fn remove_clears_current_and_calls_need_a_session() {
    let (_bus, session) = session(ProtocolVersion::Extended);
    let handle = session.request_player(PlayerRequest::Attended).await.unwrap();

    session.remove_player(&handle).await.unwrap();

    assert_eq!(session.current(), None);
    assert_eq!(
        session.call(&PlayerCall::Play).await,
        Err(SessionError::NoActiveSession)
    );
}

#[tokio::test]
async fn second_removal_reports_invalid_handle() {
    let (_bus, session) = session(ProtocolVersion::Extended);
    let handle = session.request_player(PlayerRequest::Attended).await.unwrap();

    session.remove_player(&handle).await.unwrap();
    let second = session.remove_player(&handle).await;

    assert!(matches!(
        second,
        Err(SessionError::InvalidHandle { ref path, .. }) if path == handle.path()
    ));
}

#[tokio::test]
async fn remove_current_without_session() {
    let (_bus, session) = session(ProtocolVersion::Extended);

    assert_eq!(
        session.remove_current().await,
        Err(SessionError::NoActiveSession)
    );
}

#[tokio::test]
async fn refused_request_is_resource_exhausted() {
    let (bus, session) = session(ProtocolVersion::Extended);
    let kept = session.request_player(PlayerRequest::Attended).await.unwrap();
    bus.refuse_players();

    let result = session.request_player(PlayerRequest::Attended).await;

    assert!(matches!(result, Err(SessionError::ResourceExhausted(_))));
    assert_eq!(session.current(), Some(kept));
}

#[tokio::test]
async fn unreachable_service_is_reported() {
    let (bus, session) = session(ProtocolVersion::Extended);
    bus.go_offline();

    let result = session.request_player(PlayerRequest::Attended).await;

    assert!(matches!(result, Err(SessionError::ServiceUnavailable(_))));
}

#[tokio::test]
async fn expired_player_invalidates_current() {
    let (bus, session) = session(ProtocolVersion::Extended);
    let handle = session
        .request_player(PlayerRequest::Unattended(Duration::from_secs(1)))
        .await
        .unwrap();
    bus.expire(handle.path());

    let result = session.call(&PlayerCall::Play).await;

    assert!(matches!(result, Err(SessionError::InvalidHandle { .. })));
    assert_eq!(session.current(), None);
}

#[tokio::test]
async fn rejected_call_keeps_current() {
    let (bus, session) = session(ProtocolVersion::Extended);
    let handle = session.request_player(PlayerRequest::Attended).await.unwrap();
    bus.fail_method("Play");

    let result = session.call(&PlayerCall::Play).await;

    assert!(matches!(
        result,
        Err(SessionError::CallFailed { method: "Play", .. })
    ));
    assert_eq!(session.current(), Some(handle));
}

#[tokio::test]
async fn calls_target_the_current_handle() {
    let (bus, session) = session(ProtocolVersion::Extended);
    session.request_player(PlayerRequest::Attended).await.unwrap();
    let second = session.request_player(PlayerRequest::Attended).await.unwrap();
    bus.set_output("GetPosition", CallOutput::Millis(1500));

    let output = session.call(&PlayerCall::GetPosition).await.unwrap();

    assert_eq!(output, CallOutput::Millis(1500));
    assert_eq!(
        bus.calls(),
        vec![(second.path().clone(), PlayerCall::GetPosition)]
    );
}

#[tokio::test]
async fn scheduled_recorder_becomes_current() {
    let (_bus, session) = session(ProtocolVersion::Extended);
    let schedule = crate::services::umms::RecorderSchedule {
        start: Duration::from_secs(10),
        duration: Duration::from_secs(60),
        uri: "dvb://current".to_string(),
        location: "/tmp/record.ts".to_string(),
    };

    let handle = session.request_scheduled_recorder(&schedule).await.unwrap();

    assert!(!handle.is_attended());
    assert_eq!(session.current(), Some(handle));
}

#[tokio::test]
async fn liveness_ping_is_acknowledged() {
    let (bus, session) = session(ProtocolVersion::Extended);
    let handle = session.request_player(PlayerRequest::Attended).await.unwrap();
    let mut events = session.events();

    bus.emit(handle.path(), PlayerSignal::NeedReply);

    assert_eq!(
        next_event(&mut events).await,
        PlayerEvent::LivenessAcknowledged(handle.path().clone())
    );
    assert_eq!(bus.replies(), vec![handle.path().clone()]);
}

#[tokio::test]
async fn superseded_attended_player_keeps_answering_pings() {
    let (bus, session) = session(ProtocolVersion::Extended);
    let first = session.request_player(PlayerRequest::Attended).await.unwrap();
    session.request_player(PlayerRequest::Attended).await.unwrap();
    let mut events = session.events();

    bus.emit(first.path(), PlayerSignal::NeedReply);

    assert_eq!(
        next_event(&mut events).await,
        PlayerEvent::LivenessAcknowledged(first.path().clone())
    );
}

#[tokio::test]
async fn extended_state_change_carries_both_states() {
    let (bus, session) = session(ProtocolVersion::Extended);
    let handle = session.request_player(PlayerRequest::Attended).await.unwrap();
    let mut events = session.events();

    bus.emit(
        handle.path(),
        PlayerSignal::StateChanged(StatePayload::Transition { old: 1, new: 3 }),
    );

    let event = next_event(&mut events).await;
    assert_eq!(
        event,
        PlayerEvent::StateChanged {
            source: EventSource::Player(handle.path().clone()),
            old: Some(PlayerState::Stopped),
            new: PlayerState::Playing,
        }
    );
    assert!(
        event
            .to_string()
            .ends_with("State changed from 'PlayerStateStopped' to 'PlayerStatePlaying'")
    );
}

#[tokio::test]
async fn unknown_state_ordinal_is_undecodable() {
    let (bus, session) = session(ProtocolVersion::Standard);
    let handle = session.request_player(PlayerRequest::Attended).await.unwrap();
    let mut events = session.events();

    bus.emit(
        handle.path(),
        PlayerSignal::StateChanged(StatePayload::New(9)),
    );

    assert_eq!(
        next_event(&mut events).await,
        PlayerEvent::Undecodable {
            source: EventSource::Player(handle.path().clone()),
            kind: SignalKind::PlayerStateChanged,
            error: DecodeError::PlayerState {
                raw: 9,
                version: ProtocolVersion::Standard,
            },
        }
    );
}

#[tokio::test]
async fn single_state_under_extended_uses_extended_order() {
    let (bus, session) = session(ProtocolVersion::Extended);
    let handle = session.request_player(PlayerRequest::Attended).await.unwrap();
    let mut events = session.events();

    bus.emit(
        handle.path(),
        PlayerSignal::StateChanged(StatePayload::New(2)),
    );

    let event = next_event(&mut events).await;
    assert_eq!(
        event,
        PlayerEvent::StateChanged {
            source: EventSource::Player(handle.path().clone()),
            old: None,
            new: PlayerState::Paused,
        }
    );
    assert!(event.to_string().ends_with("State changed to 'PlayerStatePaused'"));
}

#[tokio::test]
async fn unreadable_body_reaches_subscribers() {
    let (bus, session) = session(ProtocolVersion::Extended);
    let handle = session.request_player(PlayerRequest::Attended).await.unwrap();
    let mut events = session.events();

    bus.emit(
        handle.path(),
        PlayerSignal::Unreadable {
            kind: SignalKind::PlayerStateChanged,
            reason: "body is 's'".to_string(),
        },
    );

    let event = next_event(&mut events).await;
    assert_eq!(
        event,
        PlayerEvent::Undecodable {
            source: EventSource::Player(handle.path().clone()),
            kind: SignalKind::PlayerStateChanged,
            error: DecodeError::Payload("body is 's'".to_string()),
        }
    );
    assert!(event.to_string().contains("Could not decode PlayerStateChanged"));
}

#[tokio::test]
async fn failed_subscription_releases_the_player() {
    let (bus, session) = session(ProtocolVersion::Extended);
    let first = session.request_player(PlayerRequest::Attended).await.unwrap();
    bus.fail_subscriptions();

    let result = session.request_player(PlayerRequest::Attended).await;

    let Err(SessionError::SubscriptionFailed { path, .. }) = result else {
        panic!("expected SubscriptionFailed, got {result:?}");
    };
    assert!(!bus.is_live(&path));
    assert_eq!(bus.removals(), vec![path]);
    assert_eq!(session.current(), Some(first));
}

#[tokio::test]
async fn output_calls_need_no_player() {
    let (bus, session) = session(ProtocolVersion::Extended);
    bus.set_output("GetState", CallOutput::OutputState(1));

    let call = OutputCall::Audio(AudioCall::GetState(AudioOutput::Spdif));
    let output = session.output_call(&call).await.unwrap();

    assert_eq!(output, CallOutput::OutputState(1));
    assert_eq!(bus.output_calls(), vec![call]);
    assert!(session.current().is_none());
}

#[tokio::test]
async fn rejected_output_call_is_call_failed() {
    let (bus, session) = session(ProtocolVersion::Extended);
    bus.fail_method("SetMode");

    let result = session
        .output_call(&OutputCall::Video(VideoCall::SetMode {
            output: "HDMI1".to_string(),
            mode: "1920x1080".to_string(),
        }))
        .await;

    assert!(matches!(
        result,
        Err(SessionError::CallFailed {
            method: "SetMode",
            ..
        })
    ));
}

#[tokio::test]
async fn service_metadata_updates_are_forwarded() {
    let (bus, session) = session(ProtocolVersion::Extended);
    session.watch_service().await.unwrap();
    session.watch_service().await.unwrap();
    let mut events = session.events();

    let entries = vec![MetadataEntry {
        uri: "dvb://1".to_string(),
        title: "News".to_string(),
        artist: String::new(),
    }];
    bus.emit_service(PlayerSignal::MetadataUpdated(entries.clone()));

    assert_eq!(
        next_event(&mut events).await,
        PlayerEvent::Notice {
            source: EventSource::Service,
            signal: PlayerSignal::MetadataUpdated(entries),
        }
    );
}

#[tokio::test]
async fn shutdown_stops_listeners() {
    let (bus, session) = session(ProtocolVersion::Extended);
    let handle = session.request_player(PlayerRequest::Attended).await.unwrap();
    let mut events = session.events();

    session.shutdown().await;
    bus.emit(handle.path(), PlayerSignal::Eof);

    let received = timeout(Duration::from_millis(200), events.recv()).await;
    assert!(received.is_err());
}

#[test]
fn state_ordinals_follow_protocol_order() {
    assert_eq!(
        PlayerState::from_ordinal(ProtocolVersion::Legacy, 1),
        Ok(PlayerState::Paused)
    );
    assert_eq!(
        PlayerState::from_ordinal(ProtocolVersion::Legacy, 3),
        Ok(PlayerState::Stopped)
    );
    assert_eq!(
        PlayerState::from_ordinal(ProtocolVersion::Extended, 1),
        Ok(PlayerState::Stopped)
    );
    assert_eq!(
        PlayerState::from_ordinal(ProtocolVersion::Extended, 3),
        Ok(PlayerState::Playing)
    );
    assert!(PlayerState::from_ordinal(ProtocolVersion::Extended, -1).is_err());
    assert!(PlayerState::from_ordinal(ProtocolVersion::Extended, 4).is_err());
}

#[test]
fn state_change_decoding_uses_names() {
    let legacy = PlayerEvent::decode(
        player("/p"),
        PlayerSignal::StateChanged(StatePayload::New(2)),
        ProtocolVersion::Legacy,
    )
    .unwrap();
    let extended = PlayerEvent::decode(
        player("/p"),
        PlayerSignal::StateChanged(StatePayload::Transition { old: 0, new: 3 }),
        ProtocolVersion::Extended,
    )
    .unwrap();

    let PlayerEvent::StateChanged { new: legacy_new, .. } = legacy else {
        panic!("expected a state change");
    };
    let PlayerEvent::StateChanged { new: extended_new, .. } = extended else {
        panic!("expected a state change");
    };
    assert_eq!(legacy_new, extended_new);
    assert_eq!(legacy_new.name(), "PlayerStatePlaying");
}

#[test]
fn rectangle_parsing() {
    assert_eq!(
        "0, 0,720,576".parse::<Rectangle>(),
        Ok(Rectangle {
            x: 0,
            y: 0,
            width: 720,
            height: 576
        })
    );
    assert!("1,2,3".parse::<Rectangle>().is_err());
    assert!("1,2,3,-4".parse::<Rectangle>().is_err());
}

#[test]
fn target_parsing_and_params() {
    let plane: TargetDescriptor = "plane 0,0,1280,720 4".parse().unwrap();
    assert_eq!(plane.type_id(), 3);
    let params = plane.params();
    assert!(params.contains_key("rectangle"));
    assert!(params.contains_key("plane-id"));

    let window: TargetDescriptor = "XWindow 77".parse().unwrap();
    assert_eq!(window, TargetDescriptor::XWindow { window_id: 77.0 });
    assert!(window.params().contains_key("window-id"));

    assert_eq!(
        "datacopy".parse::<TargetDescriptor>(),
        Ok(TargetDescriptor::DataCopy)
    );
    assert!("socket extra".parse::<TargetDescriptor>().is_err());
    assert!("hologram".parse::<TargetDescriptor>().is_err());
}

#[test]
fn notice_rendering() {
    let error = PlayerEvent::Notice {
        source: player("/p"),
        signal: PlayerSignal::Error {
            domain: 0,
            message: "no decoder".to_string(),
        },
    };
    assert_eq!(
        error.to_string(),
        "[/p] Error Domain:'ErrorTypeEngine', msg='no decoder'"
    );

    let target = PlayerEvent::Notice {
        source: player("/p"),
        signal: PlayerSignal::TargetReady(TargetInfo {
            rectangle: Some("0,0,720,576".to_string()),
            plane_id: Some(2),
        }),
    };
    assert_eq!(
        target.to_string(),
        "[/p] Target ready, rectangle='0,0,720,576', plane-id=2"
    );
}

#[test]
fn call_output_rendering() {
    let version = ProtocolVersion::Extended;

    assert_eq!(CallOutput::Unit.render(version), Ok(None));
    assert_eq!(
        CallOutput::Millis(42).render(version),
        Ok(Some("'42' ms".to_string()))
    );
    assert_eq!(
        CallOutput::State(2).render(version),
        Ok(Some("'PlayerStatePaused'".to_string()))
    );
    assert_eq!(
        CallOutput::State(2).render(ProtocolVersion::Legacy),
        Ok(Some("'PlayerStatePlaying'".to_string()))
    );
    assert!(CallOutput::State(7).render(version).is_err());
}

#[test]
fn output_results_rendering() {
    let version = ProtocolVersion::Extended;

    assert_eq!(
        CallOutput::Names(vec!["HDMI1".to_string(), "VGA".to_string()]).render(version),
        Ok(Some("'HDMI1', 'VGA'".to_string()))
    );
    assert_eq!(
        CallOutput::Names(Vec::new()).render(version),
        Ok(Some("none".to_string()))
    );
    assert_eq!(
        CallOutput::OutputState(0).render(version),
        Ok(Some("off".to_string()))
    );
    assert_eq!(
        CallOutput::OutputState(5).render(version),
        Ok(Some("unknown output state 5".to_string()))
    );
}

#[test]
fn audio_outputs_by_number_or_name() {
    assert_eq!(AudioOutput::from_input("0"), Some(AudioOutput::Hdmi));
    assert_eq!(AudioOutput::from_input("SPDIF"), Some(AudioOutput::Spdif));
    assert_eq!(AudioOutput::from_input("i2s1"), Some(AudioOutput::I2s1));
    assert_eq!(AudioOutput::from_input("4"), None);
    assert_eq!(AudioOutput::from_input("usb"), None);
    assert_eq!(AudioOutput::I2s0.as_raw(), 2);
}
