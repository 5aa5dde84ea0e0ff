//! Custom Test Assertions
//!
//! Provides assertion helpers for documents and port errors that give more
//! meaningful failure messages than bare `assert!`.

use core_kernel::{Document, PortError};
use serde_json::Value;

/// Asserts that a port error is a conflict
pub fn assert_conflict(error: &PortError) {
    assert!(error.is_conflict(), "Expected a conflict, got: {}", error);
}

/// Asserts that a document field holds the expected value
pub fn assert_field_eq(document: &Document, field: &str, expected: impl Into<Value>) {
    let expected = expected.into();
    let actual = document.fields.get(field).unwrap_or(&Value::Null);
    assert_eq!(
        actual, &expected,
        "{} {}: field '{}' is {}, expected {}",
        document.doctype, document.name, field, actual, expected
    );
}

/// Asserts that a field is missing or null
pub fn assert_field_absent(document: &Document, field: &str) {
    assert!(
        document.get(field).is_none(),
        "{} {}: expected '{}' to be empty, found {}",
        document.doctype,
        document.name,
        field,
        document.fields.get(field).unwrap_or(&Value::Null)
    );
}

/// Asserts that a document was not written between two reads
pub fn assert_unchanged(before: &Document, after: &Document) {
    assert_eq!(
        before.version, after.version,
        "{} {} was written: version {} -> {}",
        before.doctype, before.name, before.version, after.version
    );
    assert_eq!(
        before.fields, after.fields,
        "{} {} fields changed",
        before.doctype, before.name
    );
}
