//! Golden payload tests for the webhook formatters.

use proptest::prelude::*;
use rstest::rstest;
use serde_json::{Value, json};
use teams_logger::{
    CardFormatter, ExceptionInfo, Fact, Formatter, Level, LogRecord, PlainTextFormatter,
    TraceFrame,
};

/// Parse a card body and sort its facts by name; fact order is not part of
/// the wire contract.
fn parse_sorted(body: &str) -> Value {
    let mut card: Value = serde_json::from_str(body).expect("card body is JSON");
    if let Some(facts) = card["sections"][0]["facts"].as_array_mut() {
        facts.sort_by_key(|fact| fact["name"].as_str().unwrap_or_default().to_string());
    }
    card
}

fn located_record() -> LogRecord {
    LogRecord::new("logger", Level::Info, "hello world").with_source("app", 1)
}

#[rstest]
fn plain_text_produces_minimal_payload() {
    let body = Formatter::default().format(&located_record()).unwrap();
    assert_eq!(body, r#"{"text":"hello world"}"#);
}

#[rstest]
fn card_matches_expected_document() {
    let formatter = CardFormatter::new([Fact::Name]);
    let body = formatter.format(&located_record()).unwrap();

    let expected = json!({
        "@context": "https://schema.org/extensions",
        "@type": "MessageCard",
        "title": "Info in app",
        "summary": "hello world",
        "sections": [{"facts": [{"name": "name", "value": "logger"}]}],
        "themeColor": "#008000",
        "text": "hello world",
    });
    assert_eq!(parse_sorted(&body), expected);
}

#[rstest]
fn card_renders_every_configured_fact() {
    let formatter = CardFormatter::with_fact_names(["name", "levelname", "lineno"]);
    let card = parse_sorted(&formatter.format(&located_record()).unwrap());

    assert_eq!(
        card["sections"][0]["facts"],
        json!([
            {"name": "levelname", "value": "INFO"},
            {"name": "lineno", "value": 1},
            {"name": "name", "value": "logger"},
        ])
    );
}

#[rstest]
fn unrecognised_fact_names_do_not_change_output() {
    let strict = CardFormatter::with_fact_names(["name"]);
    let sloppy = CardFormatter::with_fact_names(["name", "created", "exc_text"]);
    let record = located_record();

    assert_eq!(
        strict.format(&record).unwrap(),
        sloppy.format(&record).unwrap()
    );
}

#[rstest]
fn card_without_facts_keeps_empty_section() {
    let card = parse_sorted(&CardFormatter::default().format(&located_record()).unwrap());
    assert_eq!(card["sections"], json!([{"facts": []}]));
}

#[rstest]
fn title_uses_logger_name_when_module_is_unknown() {
    let record = LogRecord::new("app.audit", Level::Warning, "spike");
    let card = parse_sorted(&CardFormatter::default().format(&record).unwrap());
    assert_eq!(card["title"], "Warning in app.audit");
}

#[rstest]
fn exception_appends_code_block_to_text_only() {
    let exception = ExceptionInfo::new("TimeoutError", "no response after 30s")
        .with_frames(vec![TraceFrame::new("src/fetch.rs", 42, "poll_upstream")]);
    let record = LogRecord::new("logger", Level::Error, "sync failed")
        .with_source("app::sync", 7)
        .with_exception(exception);
    let card = parse_sorted(&CardFormatter::default().format(&record).unwrap());

    assert_eq!(card["summary"], "sync failed");
    assert_eq!(
        card["text"],
        "sync failed\n\n<code>  at src/fetch.rs:42 in poll_upstream\nTimeoutError: no response after 30s\n</code>"
    );
}

#[rstest]
fn exception_without_frames_renders_header_only() {
    let record = LogRecord::new("logger", Level::Critical, "boom")
        .with_exception(ExceptionInfo::new("PanicInfo", "unreachable state"));
    let card = parse_sorted(&CardFormatter::default().format(&record).unwrap());

    assert_eq!(
        card["text"],
        "boom\n\n<code>PanicInfo: unreachable state\n</code>"
    );
    assert_eq!(card["themeColor"], "#8B0000");
    assert_eq!(card["title"], "Critical in logger");
}

proptest! {
    #[test]
    fn plain_text_round_trips_any_message(message in ".*") {
        let record = LogRecord::new("app", Level::Info, message.as_str());
        let body = PlainTextFormatter.format(&record).unwrap();
        let parsed: Value = serde_json::from_str(&body).unwrap();
        prop_assert_eq!(parsed["text"].as_str(), Some(message.as_str()));
    }

    #[test]
    fn card_text_round_trips_any_message(message in ".*") {
        let record = LogRecord::new("app", Level::Warning, message.as_str());
        let body = CardFormatter::new(Fact::ALL).format(&record).unwrap();
        let parsed: Value = serde_json::from_str(&body).unwrap();
        prop_assert_eq!(parsed["summary"].as_str(), Some(message.as_str()));
        prop_assert_eq!(parsed["text"].as_str(), Some(message.as_str()));
    }
}
