//! End-to-end tests for the interactive command loop.
//!
//! The dispatcher runs against an in-memory media service; input is a
//! byte slice or a duplex pipe standing in for stdin.

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod common;

use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use umms_client::{
    cli::{Dispatcher, DispatcherState, MethodRegistry},
    services::umms::{
        AudioCall, AudioOutput, CallOutput, OutputCall, PlayerCall, PlayerRequest, PlayerSignal,
        ProtocolVersion, Rectangle, SignalKind, VideoCall,
    },
};

use common::{eventually, session, settings};

async fn run_script(
    version: ProtocolVersion,
    session: std::sync::Arc<umms_client::services::umms::SessionManager>,
    script: &str,
) -> (DispatcherState, String) {
    run_bytes(version, session, script.as_bytes()).await
}

async fn run_bytes(
    version: ProtocolVersion,
    session: std::sync::Arc<umms_client::services::umms::SessionManager>,
    input: &[u8],
) -> (DispatcherState, String) {
    let mut dispatcher =
        Dispatcher::new(session, MethodRegistry::new(version), settings(), input, Vec::new());

    dispatcher.run().await.unwrap();
    let state = dispatcher.state();
    let output = String::from_utf8(dispatcher.into_output()).unwrap();
    (state, output)
}

mod requesting {
    use super::*;

    #[tokio::test]
    async fn legacy_digit_zero_requests_a_player() {
        let (service, session) = session(ProtocolVersion::Legacy);

        let (state, output) = run_script(ProtocolVersion::Legacy, session.clone(), "0\n").await;

        let handle = session.current().expect("handle created");
        assert!(
            service
                .subscriptions(handle.path())
                .contains(&SignalKind::NeedReply)
        );
        assert!(output.contains("Current player:"));
        assert_eq!(output.matches("> ").count(), 2, "prompt returns to the loop");
        assert_eq!(state, DispatcherState::Terminated);
    }

    #[tokio::test]
    async fn shortcut_requests_an_attended_player() {
        let (service, session) = session(ProtocolVersion::Extended);

        let (_, output) = run_script(ProtocolVersion::Extended, session.clone(), "r\n").await;

        let handle = session.current().expect("handle created");
        assert!(handle.is_attended());
        assert!(
            service
                .subscriptions(handle.path())
                .contains(&SignalKind::NeedReply)
        );
        assert!(output.contains(handle.path().as_str()));
    }

    #[tokio::test]
    async fn unattended_shortcut_skips_liveness() {
        let (service, session) = session(ProtocolVersion::Extended);

        run_script(ProtocolVersion::Extended, session.clone(), "u\n").await;

        let handle = session.current().expect("handle created");
        assert!(!handle.is_attended());
        assert!(
            !service
                .subscriptions(handle.path())
                .contains(&SignalKind::NeedReply)
        );
    }

    #[tokio::test]
    async fn remove_shortcut_clears_the_session() {
        let (_, session) = session(ProtocolVersion::Standard);

        let (_, output) = run_script(ProtocolVersion::Standard, session.clone(), "r\nd\n").await;

        assert!(session.current().is_none());
        assert!(output.contains("Removed player"));
    }

    #[tokio::test]
    async fn failed_subscription_is_reported_and_the_player_released() {
        let (service, session) = session(ProtocolVersion::Extended);
        service.fail_subscriptions();

        let (state, output) =
            run_script(ProtocolVersion::Extended, session.clone(), "r\n2\n").await;

        assert!(output.contains("player released"));
        assert!(!output.contains("Current player:"));
        assert!(session.current().is_none());
        assert_eq!(service.removals().len(), 1);
        assert!(!service.is_live(&service.removals()[0]));
        assert!(output.contains("no active player"), "Play is refused afterwards");
        assert_eq!(state, DispatcherState::Terminated);
    }
}

mod calls {
    use super::*;

    #[tokio::test]
    async fn play_issues_a_single_call_without_prompts() {
        for (version, token) in [
            (ProtocolVersion::Extended, "2"),
            (ProtocolVersion::Standard, "1"),
        ] {
            let (service, session) = session(version);
            let handle = session.request_player(PlayerRequest::Attended).await.unwrap();

            let (_, output) = run_script(version, session, &format!("{token}\n")).await;

            assert_eq!(
                service.calls(),
                vec![(handle.path().clone(), PlayerCall::Play)]
            );
            assert!(output.contains("Play: done"));
            assert_eq!(output.matches("> ").count(), 2, "no argument prompt expected");
        }
    }

    #[tokio::test]
    async fn set_video_size_parses_the_rectangle() {
        for (version, token) in [
            (ProtocolVersion::Extended, "12"),
            (ProtocolVersion::Standard, "11"),
        ] {
            let (service, session) = session(version);
            session.request_player(PlayerRequest::Attended).await.unwrap();

            let (_, output) =
                run_script(version, session, &format!("{token}\n0,0,352,288\n")).await;

            let calls = service.calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(
                calls[0].1,
                PlayerCall::SetVideoSize(Rectangle {
                    x: 0,
                    y: 0,
                    width: 352,
                    height: 288
                })
            );
            assert!(output.contains("Rectangle (x,y,w,h): "));
        }
    }

    #[tokio::test]
    async fn player_methods_need_a_session() {
        let (service, session) = session(ProtocolVersion::Extended);

        let (state, output) = run_script(ProtocolVersion::Extended, session, "2\n12\n").await;

        assert!(service.calls().is_empty());
        assert_eq!(output.matches("no active player").count(), 2);
        assert!(!output.contains("Rectangle"), "no prompt without a session");
        assert_eq!(state, DispatcherState::Terminated);
    }

    #[tokio::test]
    async fn bad_argument_is_prompted_again() {
        let (service, session) = session(ProtocolVersion::Extended);
        session.request_player(PlayerRequest::Attended).await.unwrap();

        let (_, output) =
            run_script(ProtocolVersion::Extended, session, "12\nwide\n1,2,3,4\n").await;

        assert!(output.contains("try again"));
        assert_eq!(
            service.calls()[0].1,
            PlayerCall::SetVideoSize(Rectangle {
                x: 1,
                y: 2,
                width: 3,
                height: 4
            })
        );
    }

    #[tokio::test]
    async fn second_bad_argument_aborts_the_command() {
        let (service, session) = session(ProtocolVersion::Extended);
        session.request_player(PlayerRequest::Attended).await.unwrap();

        let (state, output) =
            run_script(ProtocolVersion::Extended, session, "12\nwide\ntall\n2\n").await;

        assert!(output.contains("Invalid rectangle"));
        assert_eq!(service.calls().len(), 1, "only the later Play went out");
        assert_eq!(service.calls()[0].1, PlayerCall::Play);
        assert_eq!(state, DispatcherState::Terminated);
    }

    #[tokio::test]
    async fn input_closing_mid_arguments_terminates() {
        let (service, session) = session(ProtocolVersion::Extended);
        session.request_player(PlayerRequest::Attended).await.unwrap();

        let (state, _) = run_script(ProtocolVersion::Extended, session, "12\n").await;

        assert!(service.calls().is_empty());
        assert_eq!(state, DispatcherState::Terminated);
    }
}

mod outputs {
    use super::*;

    #[tokio::test]
    async fn audio_volume_is_set_without_a_player() {
        let (service, session) = session(ProtocolVersion::Extended);

        let (_, output) =
            run_script(ProtocolVersion::Extended, session.clone(), "52\nspdif\n70\n").await;

        assert!(session.current().is_none());
        assert_eq!(
            service.output_calls(),
            vec![OutputCall::Audio(AudioCall::SetVolume {
                output: AudioOutput::Spdif,
                volume: 70
            })]
        );
        assert!(output.contains("Audio output (0:hdmi, 1:spdif, 2:i2s0, 3:i2s1): "));
        assert!(output.contains("AudioManager.SetVolume: done"));
    }

    #[tokio::test]
    async fn audio_state_is_rendered_as_on_or_off() {
        let (service, session) = session(ProtocolVersion::Extended);
        service.set_output("GetState", CallOutput::OutputState(1));

        let (_, output) = run_script(ProtocolVersion::Extended, session, "55\n0\n").await;

        assert_eq!(
            service.output_calls(),
            vec![OutputCall::Audio(AudioCall::GetState(AudioOutput::Hdmi))]
        );
        assert!(output.contains("AudioManager.GetState: on"));
    }

    #[tokio::test]
    async fn video_modes_are_listed() {
        let (service, session) = session(ProtocolVersion::Extended);
        service.set_output(
            "GetValidMode",
            CallOutput::Names(vec!["1280x720".to_string(), "1920x1080".to_string()]),
        );

        let (_, output) = run_script(ProtocolVersion::Extended, session, "57\nHDMI1\n").await;

        assert_eq!(
            service.output_calls(),
            vec![OutputCall::Video(VideoCall::GetValidMode("HDMI1".to_string()))]
        );
        assert!(output.contains("VideoOutput.GetValidMode: '1280x720', '1920x1080'"));
    }

    #[tokio::test]
    async fn unknown_audio_output_is_prompted_again() {
        let (service, session) = session(ProtocolVersion::Extended);

        let (_, output) =
            run_script(ProtocolVersion::Extended, session, "53\noptical\ni2s1\n").await;

        assert!(output.contains("try again"));
        assert_eq!(
            service.output_calls(),
            vec![OutputCall::Audio(AudioCall::GetVolume(AudioOutput::I2s1))]
        );
    }
}

mod loop_control {
    use super::*;

    #[tokio::test]
    async fn quit_terminates_immediately() {
        let (service, session) = session(ProtocolVersion::Extended);
        session.request_player(PlayerRequest::Attended).await.unwrap();

        let (state, output) = run_script(ProtocolVersion::Extended, session, "q\n2\n").await;

        assert_eq!(state, DispatcherState::Terminated);
        assert_eq!(output.matches("> ").count(), 1);
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_letters_are_reported_and_the_loop_continues() {
        let (_, session) = session(ProtocolVersion::Standard);

        let (state, output) = run_script(ProtocolVersion::Standard, session, "x\nh\nq\n").await;

        assert!(output.contains("Unsupported command: 'x'"));
        assert!(output.contains("Shortcuts:"));
        assert_eq!(output.matches("> ").count(), 3);
        assert_eq!(state, DispatcherState::Terminated);
    }

    #[tokio::test]
    async fn malformed_tokens_are_reported() {
        let (_, session) = session(ProtocolVersion::Standard);

        let (_, output) = run_script(ProtocolVersion::Standard, session, "4a\n\n99\n").await;

        assert!(output.contains("Malformed command: '4a'"));
        assert!(output.contains("Unsupported command: '99'"));
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_reported_and_the_loop_continues() {
        let (service, session) = session(ProtocolVersion::Standard);
        let handle = session.request_player(PlayerRequest::Attended).await.unwrap();

        let (state, output) =
            run_bytes(ProtocolVersion::Standard, session, b"\xff\xfe\n1\nq\n").await;

        assert!(output.contains("is not valid UTF-8"));
        assert_eq!(
            service.calls(),
            vec![(handle.path().clone(), PlayerCall::Play)]
        );
        assert_eq!(output.matches("> ").count(), 3);
        assert_eq!(state, DispatcherState::Terminated);
    }

    #[tokio::test]
    async fn invalid_utf8_argument_is_prompted_again() {
        let (service, session) = session(ProtocolVersion::Extended);
        session.request_player(PlayerRequest::Attended).await.unwrap();

        let (_, output) =
            run_bytes(ProtocolVersion::Extended, session, b"12\n\xff\n1,2,3,4\n").await;

        assert!(output.contains("input is not valid UTF-8, try again"));
        assert_eq!(
            service.calls()[0].1,
            PlayerCall::SetVideoSize(Rectangle {
                x: 1,
                y: 2,
                width: 3,
                height: 4
            })
        );
    }
}

#[tokio::test]
async fn liveness_is_acknowledged_while_waiting_for_input() {
    let (service, session) = session(ProtocolVersion::Extended);
    let (mut stdin, reader) = tokio::io::duplex(64);

    let mut dispatcher = Dispatcher::new(
        session.clone(),
        MethodRegistry::new(ProtocolVersion::Extended),
        settings(),
        BufReader::new(reader),
        Vec::new(),
    );
    let running = tokio::spawn(async move {
        dispatcher.run().await.unwrap();
        dispatcher.state()
    });

    stdin.write_all(b"r\n").await.unwrap();
    assert!(eventually(|| session.current().is_some()).await);
    let handle = session.current().unwrap();

    // Dispatcher is now parked on the next line of input.
    service.emit(handle.path(), PlayerSignal::NeedReply);
    assert!(eventually(|| service.replies() == vec![handle.path().clone()]).await);
    assert!(!running.is_finished());

    stdin.write_all(b"q\n").await.unwrap();
    let state = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state, DispatcherState::Terminated);
}
