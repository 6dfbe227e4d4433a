//! umms-client - interactive client for the UMMS media-player service
//!
//! Exits with status 0 on `q` or end of input, and non-zero when the
//! service cannot be reached at startup.

use std::{process::ExitCode, sync::Arc};

use tokio::io::{self, BufReader};
use tracing::{error, info, instrument, warn};
use umms_client::{
    ClientError, Result,
    cli::{
        ArgDefaults, DispatchSettings, Dispatcher, EventPrinter, MethodRegistry,
        formatting::{format_error, format_help},
    },
    config::Config,
    services::umms::{DbusPlayerBus, PlayerRequest, ProtocolVersion, SessionManager},
    tracing_config,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load_user() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_error(&e.to_string()));
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match tracing_config::init(&config.general) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", format_error(&e.to_string()));
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", format_error(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Connects, runs the command loop, and tears everything down in order:
/// input first, then notification listeners, then the bus connection.
#[instrument(skip(config))]
async fn run(config: Config) -> Result<()> {
    let settings = &config.session;
    let version = settings.protocol;

    let dispatch = DispatchSettings {
        unattended_budget: settings.unattended_budget()?,
        defaults: ArgDefaults {
            uri: settings.default_uri.clone(),
            record_location: settings.record_location.clone(),
        },
    };

    let bus = DbusPlayerBus::connect(settings.bus, version)
        .await
        .map_err(ClientError::ServiceUnavailable)?;
    info!("Connected to media service ({version} protocol)");

    let session = Arc::new(SessionManager::new(Arc::new(bus), version));
    let printer = EventPrinter::start(session.events(), io::stdout());

    if version == ProtocolVersion::Extended {
        if let Err(e) = session.watch_service().await {
            warn!("Metadata updates unavailable: {e}");
        }
    }

    if settings.request_on_start && version != ProtocolVersion::Legacy {
        match session.request_player(PlayerRequest::Attended).await {
            Ok(handle) => println!("Current player: {handle}"),
            Err(e) => eprintln!("{}", format_error(&e.to_string())),
        }
    }

    let registry = MethodRegistry::new(version);
    println!("{}", format_help(&registry));

    let mut dispatcher = Dispatcher::new(
        Arc::clone(&session),
        registry,
        dispatch,
        BufReader::new(io::stdin()),
        io::stdout(),
    );
    let result = dispatcher.run().await;

    drop(printer);
    drop(dispatcher);
    drop(session);
    info!("Media service connection released");

    result.map_err(ClientError::from)
}
