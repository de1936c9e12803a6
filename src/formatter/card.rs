//! MessageCard formatter.
//!
//! Builds the legacy Office 365 connector card the Teams webhook renders:
//! a titled card with the message body, an optional facts table, a severity
//! theme colour, and a `<code>`-wrapped traceback when the record carries
//! exception information.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use super::FormatError;
use crate::level::Level;
use crate::log_record::{ExceptionInfo, LogRecord};

const CARD_CONTEXT: &str = "https://schema.org/extensions";
const CARD_TYPE: &str = "MessageCard";

/// Record attribute that may be exposed as a card fact.
///
/// The set of facts a card shows is configured from this allow-list;
/// requesting anything else by name is silently ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fact {
    /// Logger name, key `"name"`.
    Name,
    /// Upper-case level name, key `"levelname"`.
    LevelName,
    /// Numeric level, key `"levelno"`.
    LevelNo,
    /// Source line number, key `"lineno"`.
    LineNo,
}

impl Fact {
    /// Every fact a card can show.
    pub const ALL: [Fact; 4] = [Fact::Name, Fact::LevelName, Fact::LevelNo, Fact::LineNo];

    /// Key under which the fact appears in the card.
    pub fn key(self) -> &'static str {
        match self {
            Fact::Name => "name",
            Fact::LevelName => "levelname",
            Fact::LevelNo => "levelno",
            Fact::LineNo => "lineno",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Fact::Name),
            "levelname" => Some(Fact::LevelName),
            "levelno" => Some(Fact::LevelNo),
            "lineno" => Some(Fact::LineNo),
            _ => None,
        }
    }

    fn value(self, record: &LogRecord) -> Value {
        match self {
            Fact::Name => Value::from(record.logger.as_str()),
            Fact::LevelName => Value::from(record.level.name()),
            Fact::LevelNo => Value::from(record.level.number()),
            Fact::LineNo => Value::from(record.line_number),
        }
    }
}

/// Theme colour for a severity. Levels outside the classic five fall back
/// to green.
fn theme_color(level: Level) -> &'static str {
    match level {
        Level::Debug => "#0000FF",
        Level::Warning => "#FFA500",
        Level::Error => "#FF0000",
        Level::Critical => "#8B0000",
        Level::Info | Level::Trace => "#008000",
    }
}

#[derive(Serialize)]
struct CardPayload<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    card_type: &'static str,
    title: String,
    summary: &'a str,
    sections: Vec<CardSection>,
    #[serde(rename = "themeColor")]
    theme_color: &'static str,
    text: String,
}

#[derive(Serialize)]
struct CardSection {
    facts: Vec<CardFact>,
}

#[derive(Serialize)]
struct CardFact {
    name: &'static str,
    value: Value,
}

/// Formatter producing the MessageCard payload.
///
/// Facts are held as a set: output order is unspecified and not part of the
/// wire contract, so consumers sort facts by name before comparing cards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CardFormatter {
    facts: BTreeSet<Fact>,
}

impl CardFormatter {
    /// Card showing the given facts.
    pub fn new(facts: impl IntoIterator<Item = Fact>) -> Self {
        Self {
            facts: facts.into_iter().collect(),
        }
    }

    /// Card selecting facts by key name. Unrecognised names are dropped.
    pub fn with_fact_names<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self {
            facts: names
                .into_iter()
                .filter_map(|name| Fact::from_name(name.as_ref()))
                .collect(),
        }
    }

    /// Facts configured for this card, in key order.
    pub fn facts(&self) -> impl Iterator<Item = Fact> + '_ {
        self.facts.iter().copied()
    }

    pub fn format(&self, record: &LogRecord) -> Result<String, FormatError> {
        // The module path scopes the title; fall back to the logger name for
        // records without source information.
        let scope = if record.module_path.is_empty() {
            record.logger.as_str()
        } else {
            record.module_path.as_str()
        };

        let mut text = record.message.clone();
        if let Some(exception) = &record.exception {
            text.push_str("\n\n");
            text.push_str(&render_traceback(exception));
        }

        let payload = CardPayload {
            context: CARD_CONTEXT,
            card_type: CARD_TYPE,
            title: format!("{} in {}", record.level.capitalized(), scope),
            summary: &record.message,
            sections: vec![CardSection {
                facts: self
                    .facts
                    .iter()
                    .map(|fact| CardFact {
                        name: fact.key(),
                        value: fact.value(record),
                    })
                    .collect(),
            }],
            theme_color: theme_color(record.level),
            text,
        };
        Ok(serde_json::to_string(&payload)?)
    }
}

/// Render exception info as a `<code>`-wrapped traceback block: one line per
/// frame, then the error header, then a closing newline.
fn render_traceback(exception: &ExceptionInfo) -> String {
    let mut block = String::from("<code>");
    for frame in &exception.frames {
        block.push_str(&format!(
            "  at {}:{} in {}\n",
            frame.filename, frame.lineno, frame.function
        ));
    }
    block.push_str(&format!(
        "{}: {}\n",
        exception.type_name, exception.message
    ));
    block.push_str("</code>");
    block
}
