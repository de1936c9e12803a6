//! Declarative configuration.
//!
//! JSON rendition of dict-style logger configuration: a version header plus
//! a map of named handler definitions. Parsing is strict, so a misspelled
//! key or an unknown level fails at setup time, before any record has been
//! emitted and lost. Building a queue handler is the explicit start of its
//! consumer thread.
//!
//! ```json
//! {
//!     "version": 1,
//!     "handlers": {
//!         "teams": {
//!             "class": "teams_logger::TeamsHandler",
//!             "url": "https://outlook.office.com/webhook/...",
//!             "level": "WARNING",
//!             "formatter": {"type": "card", "facts": ["name", "levelname"]}
//!         }
//!     }
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::formatter::{CardFormatter, Formatter, PlainTextFormatter};
use crate::handler::TeamsHandler;
use crate::level::Level;
use crate::queue_handler::TeamsQueueHandler;

/// The only schema version [`Config::from_json`] accepts.
pub const CONFIG_VERSION: u8 = 1;

/// Errors raised while parsing or building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON or does not match the schema.
    #[error("invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration schema version is unsupported.
    #[error("unsupported configuration version: {0}")]
    UnsupportedVersion(u8),
    /// A handler named a class this crate does not provide.
    #[error("unknown handler class: {0}")]
    UnknownHandlerClass(String),
}

/// Top-level configuration document.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    version: u8,
    #[serde(default)]
    handlers: BTreeMap<String, HandlerConfig>,
}

/// One named handler definition.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerConfig {
    class: String,
    url: String,
    level: Level,
    #[serde(default)]
    formatter: Option<FormatterConfig>,
}

/// Formatter selection for a handler. Defaults to plain text when absent.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FormatterConfig {
    /// Plain `{"text": ...}` payload.
    Text,
    /// MessageCard payload, optionally selecting facts by name.
    Card {
        #[serde(default)]
        facts: Vec<String>,
    },
}

/// Handler classes addressable from a configuration document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HandlerClass {
    Teams,
    Queue,
}

impl HandlerClass {
    /// Accepts the fully qualified path or the bare type name.
    fn parse(class: &str) -> Option<Self> {
        match class {
            "teams_logger::TeamsHandler" | "TeamsHandler" => Some(Self::Teams),
            "teams_logger::TeamsQueueHandler" | "TeamsQueueHandler" => Some(Self::Queue),
            _ => None,
        }
    }
}

impl Config {
    /// Parse a JSON document and validate its schema version.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        if config.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(config.version));
        }
        Ok(config)
    }

    /// Schema version declared by the document.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Build every configured handler, keyed by its configured name.
    pub fn build(&self) -> Result<BTreeMap<String, ConfiguredHandler>, ConfigError> {
        self.handlers
            .iter()
            .map(|(name, handler)| Ok((name.clone(), handler.build()?)))
            .collect()
    }
}

impl HandlerConfig {
    fn build(&self) -> Result<ConfiguredHandler, ConfigError> {
        let class = HandlerClass::parse(&self.class)
            .ok_or_else(|| ConfigError::UnknownHandlerClass(self.class.clone()))?;
        let formatter = match &self.formatter {
            None => Formatter::default(),
            Some(FormatterConfig::Text) => Formatter::PlainText(PlainTextFormatter),
            Some(FormatterConfig::Card { facts }) => {
                Formatter::Card(CardFormatter::with_fact_names(facts))
            }
        };
        let inner = TeamsHandler::builder(self.url.as_str())
            .with_level(self.level)
            .with_formatter(formatter)
            .build();
        Ok(match class {
            HandlerClass::Teams => ConfiguredHandler::Teams(inner),
            HandlerClass::Queue => ConfiguredHandler::Queue(TeamsQueueHandler::start(inner)),
        })
    }
}

/// Handler produced by [`Config::build`].
///
/// Wraps either handler kind behind one type so configured handlers can be
/// inspected, registered, and installed uniformly.
#[derive(Debug)]
pub enum ConfiguredHandler {
    Teams(TeamsHandler),
    Queue(TeamsQueueHandler),
}

impl ConfiguredHandler {
    pub fn url(&self) -> &str {
        match self {
            Self::Teams(handler) => handler.url(),
            Self::Queue(handler) => handler.url(),
        }
    }

    pub fn level(&self) -> Level {
        match self {
            Self::Teams(handler) => handler.level(),
            Self::Queue(handler) => handler.level(),
        }
    }

    /// Install the built handler as the global `log` sink.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        match self {
            Self::Teams(handler) => handler.install(),
            Self::Queue(handler) => handler.install(),
        }
    }
}

impl log::Log for ConfiguredHandler {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        match self {
            Self::Teams(handler) => handler.enabled(metadata),
            Self::Queue(handler) => handler.enabled(metadata),
        }
    }

    fn log(&self, record: &log::Record<'_>) {
        match self {
            Self::Teams(handler) => handler.log(record),
            Self::Queue(handler) => handler.log(record),
        }
    }

    fn flush(&self) {
        match self {
            Self::Teams(handler) => handler.flush(),
            Self::Queue(handler) => log::Log::flush(handler),
        }
    }
}
