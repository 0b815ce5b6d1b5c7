//! Error Extension Tests

use kiln_domain::{Error, Result};
use kiln_infrastructure::error_ext::ErrorContext;
use std::error::Error as _;
use std::io;

/// Test context keeps the foreign error as the source chain
#[test]
fn test_context_keeps_source() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");

    let err = Err::<(), _>(io_error).context("failed to read file").unwrap_err();
    assert!(err.to_string().contains("failed to read file"));
    assert!(err.to_string().contains("file not found"));
    match err {
        Error::Generic(inner) => assert!(inner.source().is_some()),
        other => panic!("Expected Generic error, got {other}"),
    }
}

/// Test with_context evaluates lazily
#[test]
fn test_with_context_is_lazy() {
    let ok: Result<u8> = Ok::<u8, io::Error>(1).with_context(|| -> String {
        panic!("context must not be built on success")
    });
    assert_eq!(ok.unwrap(), 1);
}

/// Test config_context produces a configuration error
#[test]
fn test_config_context() {
    let parse = "abc".parse::<u64>();
    let err = parse.config_context("stop_timeout_ms").unwrap_err();

    match err {
        Error::Configuration { message, source } => {
            assert!(message.starts_with("stop_timeout_ms"));
            assert!(source.is_some());
        }
        other => panic!("Expected Configuration error, got {other}"),
    }
}
