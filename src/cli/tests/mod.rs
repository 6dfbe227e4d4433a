//! Unit tests for CLI module
//!
//! Tests the method registry, argument parsing and help formatting.
//! No bus and no command execution.

use std::time::Duration;

use crate::{
    cli::{
        ArgDefaults, ArgType, ArgValue, ArgValues, CliError, Command, MethodRegistry, Shortcut,
        formatting::format_help,
    },
    services::umms::{
        AudioCall, AudioOutput, BufferFormat, OutputCall, PlayerCall, ProtocolVersion, Rectangle,
        ScaleMode, TargetDescriptor, VideoCall,
    },
};

fn defaults() -> ArgDefaults {
    ArgDefaults {
        uri: "file:///root/720p.m4v".to_string(),
        record_location: "/tmp/record.ts".to_string(),
    }
}

fn method_name(registry: &MethodRegistry, token: &str) -> &'static str {
    match registry.lookup(token) {
        Ok(Command::Method(method)) => method.name,
        other => panic!("expected a method for '{token}', got {other:?}"),
    }
}

#[test]
fn table_sizes_per_version() {
    assert_eq!(MethodRegistry::new(ProtocolVersion::Legacy).methods().len(), 26);
    assert_eq!(MethodRegistry::new(ProtocolVersion::Standard).methods().len(), 23);
    assert_eq!(MethodRegistry::new(ProtocolVersion::Extended).methods().len(), 60);
}

#[test]
fn digit_lookup_returns_entry_at_that_id() {
    for version in [
        ProtocolVersion::Legacy,
        ProtocolVersion::Standard,
        ProtocolVersion::Extended,
    ] {
        let registry = MethodRegistry::new(version);
        for method in registry.methods() {
            let Ok(Command::Method(found)) = registry.lookup(&method.id.to_string()) else {
                panic!("id {} not found in {version}", method.id);
            };
            assert_eq!(found.id, method.id);
            assert_eq!(found.name, method.name);
        }
    }
}

#[test]
fn each_revision_has_its_own_id_mapping() {
    let legacy = MethodRegistry::new(ProtocolVersion::Legacy);
    let standard = MethodRegistry::new(ProtocolVersion::Standard);
    let extended = MethodRegistry::new(ProtocolVersion::Extended);

    assert_eq!(method_name(&legacy, "0"), "RequestMediaPlayer");
    assert_eq!(method_name(&legacy, "3"), "SetUri");
    assert_eq!(method_name(&legacy, "25"), "GetPlayerState");

    assert_eq!(method_name(&standard, "0"), "SetUri");
    assert_eq!(method_name(&standard, "1"), "Play");
    assert_eq!(method_name(&standard, "22"), "GetPlayerState");

    assert_eq!(method_name(&extended, "1"), "SetTarget");
    assert_eq!(method_name(&extended, "2"), "Play");
    assert_eq!(method_name(&extended, "23"), "GetPlayerState");
    assert_eq!(method_name(&extended, "49"), "Record");
    assert_eq!(method_name(&extended, "51"), "RequestScheduledRecorder");
    assert_eq!(method_name(&extended, "52"), "AudioManager.SetVolume");
    assert_eq!(method_name(&extended, "59"), "VideoOutput.GetMode");

    assert_eq!(method_name(&standard, "11"), "SetVideoSize");
    assert_eq!(method_name(&extended, "11"), "SetWindowId");
    assert_eq!(method_name(&extended, "12"), "SetVideoSize");
}

#[test]
fn output_methods_exist_only_in_the_extended_table() {
    for version in [ProtocolVersion::Legacy, ProtocolVersion::Standard] {
        let registry = MethodRegistry::new(version);
        assert!(
            registry
                .methods()
                .iter()
                .all(|m| !matches!(m.action, crate::cli::Action::Output(_))),
            "{version} has output methods"
        );
    }

    let extended = MethodRegistry::new(ProtocolVersion::Extended);
    let outputs: Vec<_> = extended
        .methods()
        .iter()
        .filter(|m| matches!(m.action, crate::cli::Action::Output(_)))
        .map(|m| m.id)
        .collect();
    assert_eq!(outputs, (52..60).collect::<Vec<_>>());
    assert!(
        extended.methods()[52..]
            .iter()
            .all(|m| !m.action.needs_player())
    );
}

#[test]
fn out_of_range_digits_are_unsupported() {
    let registry = MethodRegistry::new(ProtocolVersion::Standard);

    assert!(matches!(
        registry.lookup("23"),
        Err(CliError::UnsupportedCommand(_))
    ));
    assert!(matches!(
        registry.lookup("99999999999999999999999"),
        Err(CliError::UnsupportedCommand(_))
    ));
}

#[test]
fn letter_tokens_resolve_to_shortcuts() {
    let registry = MethodRegistry::new(ProtocolVersion::Extended);

    for shortcut in Shortcut::ALL {
        let token = shortcut.letter().to_string();
        assert!(matches!(
            registry.lookup(&token),
            Ok(Command::Shortcut(found)) if found == shortcut
        ));
    }

    assert!(matches!(
        registry.lookup("x"),
        Err(CliError::UnsupportedCommand(_))
    ));
    assert!(matches!(
        registry.lookup("quit"),
        Err(CliError::UnsupportedCommand(_))
    ));
}

#[test]
fn mixed_tokens_are_malformed() {
    let registry = MethodRegistry::new(ProtocolVersion::Extended);

    for token in ["1a", "-1", "r2", "4.5", "", "?"] {
        assert!(
            matches!(registry.lookup(token), Err(CliError::MalformedCommand(_))),
            "token '{token}'"
        );
    }
}

#[test]
fn every_player_builder_accepts_its_declared_arguments() {
    let registry = MethodRegistry::new(ProtocolVersion::Extended);
    let samples = |ty: ArgType| match ty {
        ArgType::Uri | ArgType::Text | ArgType::Location => "x",
        ArgType::SeekSeconds | ArgType::Index | ArgType::Integer | ArgType::Volume => "1",
        ArgType::Seconds | ArgType::Number | ArgType::WindowId => "1.5",
        ArgType::Rectangle => "0,0,10,10",
        ArgType::Target => "socket",
        ArgType::Flag | ArgType::ScaleMode | ArgType::BufferFormat => "1",
        ArgType::AudioOutput => "spdif",
    };

    for method in registry.methods() {
        let values = method
            .args
            .iter()
            .map(|spec| spec.value_type.parse(samples(spec.value_type), &defaults()).unwrap())
            .collect();
        let mut values = ArgValues::new(values);

        match method.action {
            crate::cli::Action::Player(build) => {
                assert_eq!(build(&mut values).unwrap().method(), method.name);
            }
            crate::cli::Action::Output(build) => {
                let call = build(&mut values).unwrap();
                assert!(method.name.ends_with(&format!(".{}", call.method())));
            }
            _ => {}
        }
    }
}

#[test]
fn output_builders_map_arguments_in_order() {
    let registry = MethodRegistry::new(ProtocolVersion::Extended);
    let build = |token: &str, values: Vec<ArgValue>| {
        let Ok(Command::Method(method)) = registry.lookup(token) else {
            panic!("{token} missing");
        };
        let crate::cli::Action::Output(build) = method.action else {
            panic!("{token} is not an output call");
        };
        build(&mut ArgValues::new(values)).unwrap()
    };

    assert_eq!(
        build("52", vec![ArgValue::Output(AudioOutput::I2s1), ArgValue::Integer(40)]),
        OutputCall::Audio(AudioCall::SetVolume {
            output: AudioOutput::I2s1,
            volume: 40
        })
    );
    assert_eq!(
        build("54", vec![ArgValue::Output(AudioOutput::Hdmi), ArgValue::Flag(false)]),
        OutputCall::Audio(AudioCall::SetState {
            output: AudioOutput::Hdmi,
            on: false
        })
    );
    assert_eq!(
        build(
            "58",
            vec![
                ArgValue::Text("HDMI1".to_string()),
                ArgValue::Text("1920x1080".to_string()),
            ]
        ),
        OutputCall::Video(VideoCall::SetMode {
            output: "HDMI1".to_string(),
            mode: "1920x1080".to_string()
        })
    );
}

#[test]
fn audio_output_argument() {
    let ty = ArgType::AudioOutput;
    assert_eq!(
        ty.parse("2", &defaults()),
        Ok(ArgValue::Output(AudioOutput::I2s0))
    );
    assert_eq!(
        ty.parse("HDMI", &defaults()),
        Ok(ArgValue::Output(AudioOutput::Hdmi))
    );
    assert!(ty.parse("4", &defaults()).is_err());
    assert!(ty.parse("optical", &defaults()).is_err());
}

#[test]
fn builders_map_arguments_in_order() {
    let registry = MethodRegistry::new(ProtocolVersion::Extended);
    let Ok(Command::Method(record)) = registry.lookup("49") else {
        panic!("Record missing");
    };
    let crate::cli::Action::Player(build) = record.action else {
        panic!("Record is a player call");
    };

    let call = build(&mut ArgValues::new(vec![
        ArgValue::Flag(true),
        ArgValue::Text("/tmp/out.ts".to_string()),
    ]))
    .unwrap();

    assert_eq!(
        call,
        PlayerCall::Record {
            enable: true,
            location: "/tmp/out.ts".to_string()
        }
    );
}

#[test]
fn builder_rejects_mismatched_values() {
    let registry = MethodRegistry::new(ProtocolVersion::Extended);
    let Ok(Command::Method(set_volume)) = registry.lookup("9") else {
        panic!("SetVolume missing");
    };
    let crate::cli::Action::Player(build) = set_volume.action else {
        panic!("SetVolume is a player call");
    };

    let result = build(&mut ArgValues::new(vec![ArgValue::Flag(true)]));

    assert!(matches!(result, Err(CliError::InvalidArgument { .. })));
}

#[test]
fn uri_and_location_fall_back_to_defaults() {
    assert_eq!(
        ArgType::Uri.parse("  ", &defaults()),
        Ok(ArgValue::Text("file:///root/720p.m4v".to_string()))
    );
    assert_eq!(
        ArgType::Location.parse("", &defaults()),
        Ok(ArgValue::Text("/tmp/record.ts".to_string()))
    );
    assert_eq!(
        ArgType::Uri.parse("http://host/a.ts", &defaults()),
        Ok(ArgValue::Text("http://host/a.ts".to_string()))
    );
}

#[test]
fn seek_seconds_become_milliseconds() {
    assert_eq!(
        ArgType::SeekSeconds.parse("12", &defaults()),
        Ok(ArgValue::Millis(12_000))
    );
    assert!(ArgType::SeekSeconds.parse("soon", &defaults()).is_err());
}

#[test]
fn numeric_arguments_are_range_checked() {
    assert_eq!(
        ArgType::Volume.parse("100", &defaults()),
        Ok(ArgValue::Integer(100))
    );
    assert!(ArgType::Volume.parse("101", &defaults()).is_err());
    assert!(ArgType::Index.parse("-1", &defaults()).is_err());
    assert!(ArgType::Seconds.parse("-2", &defaults()).is_err());
    assert_eq!(
        ArgType::Seconds.parse("2.5", &defaults()),
        Ok(ArgValue::Duration(Duration::from_millis(2500)))
    );
}

#[test]
fn enumerated_arguments() {
    assert_eq!(
        ArgType::ScaleMode.parse("2", &defaults()),
        Ok(ArgValue::Scale(ScaleMode::KeepAspectRatio))
    );
    assert!(ArgType::ScaleMode.parse("4", &defaults()).is_err());
    assert_eq!(
        ArgType::BufferFormat.parse("1", &defaults()),
        Ok(ArgValue::Format(BufferFormat::ByBytes))
    );
    assert_eq!(
        ArgType::Flag.parse("Yes", &defaults()),
        Ok(ArgValue::Flag(true))
    );
    assert!(ArgType::Flag.parse("maybe", &defaults()).is_err());
}

#[test]
fn structured_arguments() {
    assert_eq!(
        ArgType::Rectangle.parse("1,2,3,4", &defaults()),
        Ok(ArgValue::Rectangle(Rectangle {
            x: 1,
            y: 2,
            width: 3,
            height: 4
        }))
    );
    assert_eq!(
        ArgType::Target.parse("xwindow 5", &defaults()),
        Ok(ArgValue::Target(TargetDescriptor::XWindow { window_id: 5.0 }))
    );
    assert!(ArgType::Target.parse("plane 1,2,3", &defaults()).is_err());
}

#[test]
fn help_lists_shortcuts_and_every_method() {
    let registry = MethodRegistry::new(ProtocolVersion::Standard);

    let help = format_help(&registry);

    assert!(help.contains("remove the current player"));
    assert!(help.contains("standard protocol"));
    for (_, name) in registry.list() {
        assert!(help.contains(name), "{name} missing from help");
    }
}
