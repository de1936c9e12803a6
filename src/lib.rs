//! Log handler that posts records to a Microsoft Teams incoming webhook.
//!
//! [`TeamsHandler`] delivers synchronously from the logging thread;
//! [`TeamsQueueHandler`] queues records and delivers them from a single
//! background consumer, preserving emission order. Both implement
//! [`log::Log`], so they can be installed as the process-wide sink or driven
//! directly through their `emit` methods. Payloads are rendered by a
//! [`Formatter`]: plain text by default, or an Office 365 MessageCard with
//! configurable facts via [`CardFormatter`].
//!
//! ```no_run
//! use teams_logger::{Level, TeamsHandler};
//!
//! # fn main() -> Result<(), log::SetLoggerError> {
//! TeamsHandler::new("https://outlook.office.com/webhook/...", Level::Warning).install()?;
//! log::warn!("disk usage at 93%");
//! # Ok(())
//! # }
//! ```
//!
//! Handlers can also be described declaratively in JSON and built at
//! startup; see [`Config`].
//!
//! Delivery is strictly best-effort: one POST per record, no retries, no
//! persistence. Emit-time failures are routed to an overridable error hook
//! that defaults to a stderr diagnostic, and configuration mistakes fail at
//! setup time instead.

pub mod config;
pub mod formatter;
pub mod handler;
pub mod level;
pub mod log_record;
pub mod queue_handler;

pub use config::{CONFIG_VERSION, Config, ConfigError, ConfiguredHandler, FormatterConfig};
pub use formatter::{CardFormatter, Fact, FormatError, Formatter, PlainTextFormatter};
pub use handler::{EmitError, ErrorHook, TeamsHandler, TeamsHandlerBuilder};
pub use level::{Level, ParseLevelError};
pub use log_record::{ExceptionInfo, LogRecord, TraceFrame};
pub use queue_handler::TeamsQueueHandler;
