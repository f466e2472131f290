//! Integration tests for CORS origin configuration.
//!
//! Tests verify:
//! - Unset or empty `CORS_ORIGIN` falls back to the frontend default
//! - Comma-separated lists parse with surrounding whitespace trimmed
//! - Invalid entries are skipped without dropping the valid ones

use std::sync::Mutex;

use quill_api::parse_allowed_origins;

// parse_allowed_origins reads CORS_ORIGIN, and cargo runs tests in parallel
// within one process. Every test takes this lock before touching the variable.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn with_cors_origin<R>(value: Option<&str>, f: impl FnOnce() -> R) -> R {
    let _guard = ENV_LOCK.lock().unwrap();
    let previous = std::env::var("CORS_ORIGIN").ok();
    match value {
        Some(v) => std::env::set_var("CORS_ORIGIN", v),
        None => std::env::remove_var("CORS_ORIGIN"),
    }
    let result = f();
    match previous {
        Some(v) => std::env::set_var("CORS_ORIGIN", v),
        None => std::env::remove_var("CORS_ORIGIN"),
    }
    result
}

#[test]
fn test_unset_variable_uses_default_origin() {
    let origins = with_cors_origin(None, parse_allowed_origins);
    assert_eq!(origins.len(), 1);
    assert_eq!(origins[0].to_str().unwrap(), "http://localhost:3000");
}

#[test]
fn test_empty_variable_uses_default_origin() {
    let origins = with_cors_origin(Some("   "), parse_allowed_origins);
    assert_eq!(origins.len(), 1);
    assert_eq!(origins[0].to_str().unwrap(), "http://localhost:3000");
}

#[test]
fn test_single_origin() {
    let origins = with_cors_origin(Some("https://notes.example.com"), parse_allowed_origins);
    assert_eq!(origins.len(), 1);
    assert_eq!(origins[0].to_str().unwrap(), "https://notes.example.com");
}

#[test]
fn test_comma_separated_origins_with_whitespace() {
    let origins = with_cors_origin(
        Some("https://notes.example.com, http://localhost:3000 , https://staging.example.com"),
        parse_allowed_origins,
    );
    assert_eq!(origins.len(), 3);
    assert_eq!(origins[0].to_str().unwrap(), "https://notes.example.com");
    assert_eq!(origins[1].to_str().unwrap(), "http://localhost:3000");
    assert_eq!(origins[2].to_str().unwrap(), "https://staging.example.com");
}

#[test]
fn test_invalid_entries_are_skipped() {
    // A newline cannot appear in a header value, so the middle entry drops.
    let origins = with_cors_origin(
        Some("https://valid.example.com,bad\nvalue,http://localhost:3000"),
        parse_allowed_origins,
    );
    assert_eq!(origins.len(), 2);
    assert_eq!(origins[0].to_str().unwrap(), "https://valid.example.com");
    assert_eq!(origins[1].to_str().unwrap(), "http://localhost:3000");
}

#[test]
fn test_trailing_comma_is_ignored() {
    let origins = with_cors_origin(Some("https://notes.example.com,"), parse_allowed_origins);
    assert_eq!(origins.len(), 1);
}
