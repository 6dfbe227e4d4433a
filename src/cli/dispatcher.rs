use std::{sync::Arc, time::Duration};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use crate::services::umms::{
    CallOutput, PlayerHandle, PlayerRequest, RecorderSchedule, SessionError, SessionManager,
};

use super::{
    formatting::{format_error, format_help, format_prompt},
    registry::MethodRegistry,
    types::{Action, ArgDefaults, ArgValues, CliError, Command, MethodDescriptor, Shortcut},
};

/// Lifecycle of the command loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Reading and executing commands
    Running,
    /// Quit was requested or input closed
    Terminated,
}

/// Values the dispatcher fills in on the user's behalf.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    /// Budget used by the `u` shortcut
    pub unattended_budget: Duration,
    /// Fallbacks for empty argument input
    pub defaults: ArgDefaults,
}

/// Read-eval loop over a line-oriented input.
///
/// Each line carries one command token. Tokens are resolved through the
/// [`MethodRegistry`], arguments are prompted for one per line, and the
/// outcome is written to the output. Errors are reported and the loop
/// carries on; only `q` or the end of input stops it.
pub struct Dispatcher<R, W> {
    session: Arc<SessionManager>,
    registry: MethodRegistry,
    settings: DispatchSettings,
    input: R,
    output: W,
    state: DispatcherState,
}

enum Collected {
    Values(ArgValues),
    InputClosed,
}

/// One line of input with its terminator removed.
enum Line {
    Text(String),
    /// Bytes that are not UTF-8, shown with replacement characters.
    NotUtf8(String),
}

impl<R, W> Dispatcher<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a dispatcher in the `Running` state.
    pub fn new(
        session: Arc<SessionManager>,
        registry: MethodRegistry,
        settings: DispatchSettings,
        input: R,
        output: W,
    ) -> Self {
        Self {
            session,
            registry,
            settings,
            input,
            output,
            state: DispatcherState::Running,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Consume the dispatcher, returning its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until `q` or end of input, then stop the session's listeners.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Io` if the input cannot be read or the output
    /// cannot be written. Listeners are stopped in either case.
    #[instrument(skip(self), fields(protocol = %self.registry.version()))]
    pub async fn run(&mut self) -> Result<(), CliError> {
        info!("Command loop started");
        let result = self.read_eval_loop().await;

        self.state = DispatcherState::Terminated;
        self.session.shutdown().await;
        info!("Command loop terminated");

        result
    }

    async fn read_eval_loop(&mut self) -> Result<(), CliError> {
        while self.state == DispatcherState::Running {
            self.write_prompt("> ").await?;

            match self.read_line().await? {
                None => {
                    debug!("Input closed");
                    self.state = DispatcherState::Terminated;
                }
                Some(Line::Text(line)) => self.step(&line).await?,
                Some(Line::NotUtf8(shown)) => {
                    warn!("Ignoring input line that is not UTF-8");
                    let message = format!("Malformed command: '{shown}' is not valid UTF-8");
                    self.say(&format_error(&message)).await?;
                }
            }
        }
        Ok(())
    }

    /// Execute one input line and report its outcome.
    ///
    /// Blank lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Io` only; every other failure is reported on the
    /// output and swallowed.
    pub async fn step(&mut self, line: &str) -> Result<(), CliError> {
        let token = line.trim();
        if token.is_empty() {
            return Ok(());
        }

        match self.execute(token).await {
            Ok(()) => Ok(()),
            Err(CliError::Io(e)) => Err(CliError::Io(e)),
            Err(e) => self.report(e).await,
        }
    }

    #[instrument(skip(self))]
    async fn execute(&mut self, token: &str) -> Result<(), CliError> {
        match self.registry.lookup(token)? {
            Command::Shortcut(shortcut) => self.run_shortcut(shortcut).await,
            Command::Method(method) => self.run_method(method).await,
        }
    }

    async fn run_shortcut(&mut self, shortcut: Shortcut) -> Result<(), CliError> {
        debug!("Shortcut {shortcut:?}");
        match shortcut {
            Shortcut::Quit => {
                self.state = DispatcherState::Terminated;
                Ok(())
            }
            Shortcut::Help => {
                let help = format_help(&self.registry);
                self.say(&help).await
            }
            Shortcut::RequestAttended => self.request(PlayerRequest::Attended).await,
            Shortcut::RequestUnattended => {
                let budget = self.settings.unattended_budget;
                self.request(PlayerRequest::Unattended(budget)).await
            }
            Shortcut::RemoveCurrent => self.remove_current().await,
        }
    }

    async fn run_method(&mut self, method: MethodDescriptor) -> Result<(), CliError> {
        debug!("Method {} ({})", method.id, method.name);

        if method.action.needs_player() && self.session.current().is_none() {
            return Err(SessionError::NoActiveSession.into());
        }

        let mut args = match self.collect_args(&method).await? {
            Collected::Values(values) => values,
            Collected::InputClosed => {
                self.state = DispatcherState::Terminated;
                return Ok(());
            }
        };

        match method.action {
            Action::RequestAttended => self.request(PlayerRequest::Attended).await,
            Action::RequestUnattended => {
                let budget = if method.args.is_empty() {
                    self.settings.unattended_budget
                } else {
                    args.duration("budget")?
                };
                self.request(PlayerRequest::Unattended(budget)).await
            }
            Action::RemoveCurrent => self.remove_current().await,
            Action::PlayingContentMetadata => {
                let entries = self.session.playing_content_metadata().await?;
                self.show(method.name, &CallOutput::Metadata(entries)).await
            }
            Action::ScheduleRecorder => {
                let schedule = RecorderSchedule {
                    start: args.duration("start")?,
                    duration: args.duration("duration")?,
                    uri: args.text("uri")?,
                    location: args.text("location")?,
                };
                let handle = self.session.request_scheduled_recorder(&schedule).await?;
                self.announce_handle(&handle).await
            }
            Action::Player(build) => {
                let call = build(&mut args)?;
                let output = self.session.call(&call).await?;
                self.show(method.name, &output).await
            }
            Action::Output(build) => {
                let call = build(&mut args)?;
                let output = self.session.output_call(&call).await?;
                self.show(method.name, &output).await
            }
        }
    }

    async fn collect_args(&mut self, method: &MethodDescriptor) -> Result<Collected, CliError> {
        let mut values = Vec::with_capacity(method.args.len());

        for spec in method.args {
            let mut attempt = 0;
            let value = loop {
                attempt += 1;
                self.write_prompt(&format!("{}: ", spec.prompt)).await?;

                let parsed = match self.read_line().await? {
                    None => return Ok(Collected::InputClosed),
                    Some(Line::Text(line)) => {
                        spec.value_type.parse(&line, &self.settings.defaults)
                    }
                    Some(Line::NotUtf8(_)) => Err("input is not valid UTF-8".to_string()),
                };

                match parsed {
                    Ok(value) => break value,
                    Err(reason) if attempt < 2 => {
                        warn!("Rejected {} input: {reason}", spec.name);
                        self.say(&format_error(&format!("{reason}, try again"))).await?;
                    }
                    Err(reason) => {
                        return Err(CliError::InvalidArgument {
                            name: spec.name,
                            reason,
                        });
                    }
                }
            };
            values.push(value);
        }

        Ok(Collected::Values(ArgValues::new(values)))
    }

    /// Next input line, or `None` at end of input.
    ///
    /// Bytes are read up to the newline so that a line that is not UTF-8
    /// can be reported without ending the loop.
    async fn read_line(&mut self) -> Result<Option<Line>, CliError> {
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        Ok(Some(match String::from_utf8(buf) {
            Ok(text) => Line::Text(text),
            Err(e) => Line::NotUtf8(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }))
    }

    async fn request(&mut self, request: PlayerRequest) -> Result<(), CliError> {
        let handle = self.session.request_player(request).await?;
        self.announce_handle(&handle).await
    }

    async fn announce_handle(&mut self, handle: &PlayerHandle) -> Result<(), CliError> {
        self.say(&format!("Current player: {handle}")).await
    }

    async fn remove_current(&mut self) -> Result<(), CliError> {
        let handle = self.session.remove_current().await?;
        self.say(&format!("Removed player {}", handle.path())).await
    }

    async fn show(&mut self, name: &str, output: &CallOutput) -> Result<(), CliError> {
        let rendered = output
            .render(self.session.version())
            .map_err(SessionError::from)?;

        match rendered {
            Some(text) => self.say(&format!("{name}: {text}")).await,
            None => self.say(&format!("{name}: done")).await,
        }
    }

    async fn report(&mut self, error: CliError) -> Result<(), CliError> {
        self.say(&format_error(&error.to_string())).await?;

        if matches!(
            error,
            CliError::MalformedCommand(_) | CliError::UnsupportedCommand(_)
        ) {
            let help = format_help(&self.registry);
            self.say(&help).await?;
        }
        Ok(())
    }

    async fn write_prompt(&mut self, prompt: &str) -> Result<(), CliError> {
        self.output
            .write_all(format_prompt(prompt).as_bytes())
            .await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn say(&mut self, text: &str) -> Result<(), CliError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await?;
        Ok(())
    }
}
