//! Log record representation.
//!
//! This module defines the `LogRecord` struct that captures one log event
//! together with the context the formatters render: the logger name, source
//! location, and any attached exception information.

use std::fmt;

use crate::level::Level;

/// One frame of a captured backtrace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceFrame {
    /// Source file the frame originated from.
    pub filename: String,
    /// Line number in the source file.
    pub lineno: u32,
    /// Function or method name.
    pub function: String,
}

impl TraceFrame {
    pub fn new(filename: impl Into<String>, lineno: u32, function: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            lineno,
            function: function.into(),
        }
    }
}

/// Structured error context attached to a log record.
///
/// The card formatter renders this as a `<code>`-wrapped traceback appended
/// to the card body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExceptionInfo {
    /// Error type name (e.g. `"Error"` or `"ParseLevelError"`).
    pub type_name: String,
    /// Error message, including any source chain.
    pub message: String,
    /// Backtrace frames from outermost to innermost, if captured.
    pub frames: Vec<TraceFrame>,
}

impl ExceptionInfo {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            frames: Vec::new(),
        }
    }

    /// Attach backtrace frames.
    #[must_use]
    pub fn with_frames(mut self, frames: Vec<TraceFrame>) -> Self {
        self.frames = frames;
        self
    }

    /// Capture an error value, joining its `source()` chain into the message.
    ///
    /// Frames are not captured automatically; callers with location
    /// information attach them via [`ExceptionInfo::with_frames`].
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self {
            type_name: short_type_name::<E>().to_string(),
            message,
            frames: Vec::new(),
        }
    }
}

/// Strip the module path from a type name, leaving generic names intact.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    match full.rfind("::") {
        Some(idx) if !full.contains('<') => &full[idx + 2..],
        _ => full,
    }
}

/// Owned snapshot of one log event.
///
/// Records are immutable once emitted; handlers and formatters only read
/// them. The message is fully interpolated by the time a record is built,
/// so formatters never see format arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    /// Name of the logger that created this record.
    pub logger: String,
    /// Severity of the record.
    pub level: Level,
    /// The log message content.
    pub message: String,
    /// Module path where the log call originated, empty when unknown.
    pub module_path: String,
    /// Line number of the log call, zero when unknown.
    pub line_number: u32,
    /// Error context to render as a traceback, if any.
    pub exception: Option<ExceptionInfo>,
}

impl LogRecord {
    /// Construct a new log record from logger `name`, `level`, and `message`.
    pub fn new(logger: impl Into<String>, level: Level, message: impl Into<String>) -> Self {
        Self {
            logger: logger.into(),
            level,
            message: message.into(),
            module_path: String::new(),
            line_number: 0,
            exception: None,
        }
    }

    /// Attach the source location of the log call.
    #[must_use]
    pub fn with_source(mut self, module_path: impl Into<String>, line_number: u32) -> Self {
        self.module_path = module_path.into();
        self.line_number = line_number;
        self
    }

    /// Attach error context.
    #[must_use]
    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    /// Convert a `log` crate record. The record's target becomes the logger
    /// name and its pre-interpolated arguments become the message.
    pub fn from_log(record: &log::Record<'_>) -> Self {
        Self {
            logger: record.target().to_string(),
            level: Level::from(record.level()),
            message: record.args().to_string(),
            module_path: record.module_path().unwrap_or_default().to_string(),
            line_number: record.line().unwrap_or(0),
            exception: None,
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use thiserror::Error;

    #[rstest]
    fn from_log_carries_target_and_location() {
        // Converted in one expression: the format_args! temporaries only
        // live to the end of the statement.
        let converted = LogRecord::from_log(
            &log::Record::builder()
                .args(format_args!("hello {}", "world"))
                .level(log::Level::Warn)
                .target("app.audit")
                .module_path(Some("app::audit"))
                .file(Some("audit.rs"))
                .line(Some(42))
                .build(),
        );
        assert_eq!(converted.logger, "app.audit");
        assert_eq!(converted.level, Level::Warning);
        assert_eq!(converted.message, "hello world");
        assert_eq!(converted.module_path, "app::audit");
        assert_eq!(converted.line_number, 42);
        assert!(converted.exception.is_none());
    }

    #[rstest]
    fn from_log_defaults_missing_location() {
        let record = log::Record::builder()
            .args(format_args!("bare"))
            .level(log::Level::Info)
            .target("bare")
            .build();

        let converted = LogRecord::from_log(&record);
        assert_eq!(converted.module_path, "");
        assert_eq!(converted.line_number, 0);
    }

    #[derive(Debug, Error)]
    #[error("outer failed")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("inner cause")]
    struct Inner;

    #[rstest]
    fn from_error_joins_source_chain() {
        let info = ExceptionInfo::from_error(&Outer(Inner));
        assert_eq!(info.type_name, "Outer");
        assert_eq!(info.message, "outer failed: inner cause");
        assert!(info.frames.is_empty());
    }

    #[rstest]
    fn builders_attach_source_and_exception() {
        let record = LogRecord::new("logger", Level::Error, "boom")
            .with_source("app::job", 7)
            .with_exception(ExceptionInfo::new("JobError", "boom"));

        assert_eq!(record.module_path, "app::job");
        assert_eq!(record.line_number, 7);
        assert_eq!(
            record.exception.as_ref().map(|e| e.type_name.as_str()),
            Some("JobError")
        );
    }
}
