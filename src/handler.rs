//! Synchronous Teams webhook handler.
//!
//! `TeamsHandler` renders each record through its configured formatter and
//! POSTs the payload to the webhook in the calling thread. One record, one
//! request; nothing is retried or buffered. Failures never propagate out of
//! `emit`: they are routed to an error hook that defaults to a one-line
//! stderr diagnostic.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use ureq::{Agent, AgentBuilder};

use crate::formatter::{FormatError, Formatter};
use crate::level::Level;
use crate::log_record::LogRecord;

/// Error produced by a single delivery attempt.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The record could not be rendered into a payload.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The POST failed below the HTTP layer (DNS, connect, TLS, I/O).
    #[error("failed to reach webhook: {0}")]
    Transport(Box<ureq::Transport>),
}

/// Callback invoked with every emit failure.
pub type ErrorHook = Box<dyn Fn(&EmitError) + Send + Sync>;

/// Default error hook.
///
/// Writes to stderr rather than the `log` facade: the handler may itself be
/// the installed global logger, and logging from its own failure path would
/// recurse.
fn default_error_hook(err: &EmitError) {
    eprintln!("teams-logger: {err}");
}

/// Handler forwarding records to a Teams incoming webhook.
///
/// Records at or above the handler's minimum level are formatted and
/// delivered with exactly one blocking POST each. Implements [`log::Log`],
/// so it can be registered as the process-wide sink via
/// [`TeamsHandler::install`].
pub struct TeamsHandler {
    url: String,
    level: Level,
    formatter: Formatter,
    agent: Agent,
    on_error: ErrorHook,
}

impl TeamsHandler {
    /// Handler posting to `url` with the plain text formatter, forwarding
    /// records at `level` and above.
    pub fn new(url: impl Into<String>, level: Level) -> Self {
        Self::builder(url).with_level(level).build()
    }

    /// Start configuring a handler for `url`.
    pub fn builder(url: impl Into<String>) -> TeamsHandlerBuilder {
        TeamsHandlerBuilder {
            url: url.into(),
            level: Level::Trace,
            formatter: Formatter::default(),
            connect_timeout: None,
            timeout: None,
            on_error: None,
        }
    }

    /// Webhook URL this handler posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Minimum level forwarded to the webhook.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Formatter rendering records into payloads.
    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Format and deliver `record`, routing any failure to the error hook.
    pub fn emit(&self, record: &LogRecord) {
        if let Err(err) = self.try_emit(record) {
            (self.on_error)(&err);
        }
    }

    /// Format and deliver `record` with exactly one POST attempt.
    ///
    /// Delivery succeeds whenever the webhook answers at all: HTTP error
    /// statuses are not emit failures, and the response body is dropped
    /// unread.
    pub fn try_emit(&self, record: &LogRecord) -> Result<(), EmitError> {
        let payload = self.formatter.format(record)?;
        self.post(&payload)
    }

    fn post(&self, payload: &str) -> Result<(), EmitError> {
        let request = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json");
        match request.send_string(payload) {
            Ok(_) | Err(ureq::Error::Status(_, _)) => Ok(()),
            Err(ureq::Error::Transport(err)) => Err(EmitError::Transport(Box::new(err))),
        }
    }

    /// Install this handler as the global `log` sink.
    ///
    /// The global maximum level is set from the handler's own level, so the
    /// facade filters lower records before they reach the handler.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let filter = self.level.to_level_filter();
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(filter);
        Ok(())
    }
}

impl log::Log for TeamsHandler {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        Level::from(metadata.level()) >= self.level
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            self.emit(&LogRecord::from_log(record));
        }
    }

    fn flush(&self) {}
}

impl fmt::Debug for TeamsHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeamsHandler")
            .field("url", &self.url)
            .field("level", &self.level)
            .field("formatter", &self.formatter)
            .finish()
    }
}

/// Builder for [`TeamsHandler`] instances.
///
/// The level defaults to `Trace`, forwarding every record the facade lets
/// through; the formatter defaults to plain text. Timeouts are unset by
/// default, so a POST blocks the emitting thread until the request
/// completes or fails.
pub struct TeamsHandlerBuilder {
    url: String,
    level: Level,
    formatter: Formatter,
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
    on_error: Option<ErrorHook>,
}

impl TeamsHandlerBuilder {
    /// Set the minimum level forwarded to the webhook.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the payload formatter.
    pub fn with_formatter(mut self, formatter: impl Into<Formatter>) -> Self {
        self.formatter = formatter.into();
        self
    }

    /// Limit the time spent establishing a connection.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Limit the total time spent on one request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the default stderr diagnostic with a custom failure hook.
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&EmitError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> TeamsHandler {
        let mut agent = AgentBuilder::new();
        if let Some(timeout) = self.connect_timeout {
            agent = agent.timeout_connect(timeout);
        }
        if let Some(timeout) = self.timeout {
            agent = agent.timeout(timeout);
        }
        TeamsHandler {
            url: self.url,
            level: self.level,
            formatter: self.formatter,
            agent: agent.build(),
            on_error: self
                .on_error
                .unwrap_or_else(|| Box::new(default_error_hook)),
        }
    }
}

impl fmt::Debug for TeamsHandlerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeamsHandlerBuilder")
            .field("url", &self.url)
            .field("level", &self.level)
            .field("formatter", &self.formatter)
            .field("connect_timeout", &self.connect_timeout)
            .field("timeout", &self.timeout)
            .finish()
    }
}
