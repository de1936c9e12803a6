//! Payload formatters for the Teams webhook.
//!
//! A formatter renders a [`LogRecord`] into the JSON body POSTed to the
//! webhook. The shape is chosen at configuration time and dispatched through
//! the [`Formatter`] enum, so handlers never inspect formatter types at
//! runtime. Payloads are built from serde structs; correct escaping of
//! messages comes from `serde_json`, never from string assembly.

use serde::Serialize;
use thiserror::Error;

use crate::log_record::LogRecord;

mod card;

pub use card::{CardFormatter, Fact};

/// Error produced while rendering a record into a payload.
#[derive(Debug, Error)]
#[error("failed to serialise webhook payload: {0}")]
pub struct FormatError(#[from] serde_json::Error);

/// Payload shape selected for a handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Formatter {
    /// Minimal `{"text": ...}` payload.
    PlainText(PlainTextFormatter),
    /// MessageCard payload with title, facts, and theme colour.
    Card(CardFormatter),
}

impl Formatter {
    /// Render `record` into the JSON body to POST.
    pub fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        match self {
            Formatter::PlainText(inner) => inner.format(record),
            Formatter::Card(inner) => inner.format(record),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::PlainText(PlainTextFormatter)
    }
}

impl From<PlainTextFormatter> for Formatter {
    fn from(inner: PlainTextFormatter) -> Self {
        Self::PlainText(inner)
    }
}

impl From<CardFormatter> for Formatter {
    fn from(inner: CardFormatter) -> Self {
        Self::Card(inner)
    }
}

/// Renders the record message as Teams' simplest payload.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PlainTextFormatter;

#[derive(Serialize)]
struct TextPayload<'a> {
    text: &'a str,
}

impl PlainTextFormatter {
    pub fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        let payload = TextPayload {
            text: &record.message,
        };
        Ok(serde_json::to_string(&payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use rstest::rstest;

    #[rstest]
    fn plain_text_wraps_message() {
        let record = LogRecord::new("app", Level::Info, "hello world");
        let body = Formatter::default().format(&record).unwrap();
        assert_eq!(body, r#"{"text":"hello world"}"#);
    }

    #[rstest]
    fn plain_text_escapes_json_metacharacters() {
        let record = LogRecord::new("app", Level::Info, "say \"hi\"\nnew line");
        let body = PlainTextFormatter.format(&record).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["text"], "say \"hi\"\nnew line");
    }

    #[rstest]
    fn default_formatter_is_plain_text() {
        assert_eq!(Formatter::default(), Formatter::PlainText(PlainTextFormatter));
    }
}
