//! Integration tests for the logging setup

use std::sync::Arc;

use bridge_traits::logging::{LogLevel, MemoryLogger};
use core_runtime::logging::{
    init_logging, mask_number, redact_if_sensitive, LogFormat, LoggerSinkLayer, LoggingConfig,
};
use tracing_subscriber::layer::SubscriberExt;

#[test]
fn test_logging_config_defaults() {
    let config = LoggingConfig::default();

    assert_eq!(config.level, LogLevel::Info);
    assert!(config.redact_pii);
    assert!(config.filter.is_none());
    assert!(config.logger_sink.is_none());

    #[cfg(debug_assertions)]
    assert_eq!(config.format, LogFormat::Pretty);
    #[cfg(not(debug_assertions))]
    assert_eq!(config.format, LogFormat::Json);
}

#[test]
fn test_message_content_never_forwarded() {
    for field in ["body", "subject", "smil", "lastMessageSubject"] {
        assert_eq!(redact_if_sensitive(field, "hello there"), "[REDACTED]");
    }
}

#[test]
fn test_phone_numbers_masked() {
    assert_eq!(redact_if_sensitive("sender", "+33612345678"), "+*********78");
    assert_eq!(redact_if_sensitive("participants", "0612"), "**12");
    assert_eq!(mask_number("+1 (555) 010-9999"), "+* (***) ***-**99");
}

#[test]
fn test_identifiers_pass_through() {
    assert_eq!(redact_if_sensitive("message_id", "1234"), "1234");
    assert_eq!(redact_if_sensitive("service", "moz-mobile-message-shim"), "moz-mobile-message-shim");
}

#[test]
fn test_sink_receives_span_name() {
    let sink = Arc::new(MemoryLogger::new());
    let subscriber =
        tracing_subscriber::registry().with(LoggerSinkLayer::new(Some(sink.clone()), true));

    tracing::subscriber::with_default(subscriber, || {
        let span = tracing::info_span!("get_threads");
        let _entered = span.enter();
        tracing::error!(collection = "threads", "Reading the database. Error: UnknownError");
    });

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].span.as_deref(), Some("get_threads"));
    assert_eq!(entries[0].message, "Reading the database. Error: UnknownError");
    assert_eq!(entries[0].fields.get("collection"), Some(&"threads".to_string()));
}

#[test]
fn test_layer_without_sink_is_inert() {
    let subscriber = tracing_subscriber::registry().with(LoggerSinkLayer::new(None, true));
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("nobody listens");
    });
}

#[test]
fn test_init_logging_only_once() {
    let sink = Arc::new(MemoryLogger::new());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_logger_sink(sink);

    assert!(init_logging(config.clone()).is_ok());
    assert!(init_logging(config).is_err());
}
