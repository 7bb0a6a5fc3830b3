//! Validates `column_type` strings against the supported ClickHouse type
//! grammar at the API boundary. This never talks to ClickHouse; it is a
//! pure string-grammar check so a misconfigured pipeline fails fast with a
//! 422 instead of at sink runtime.

use once_cell::sync::Lazy;
use regex::Regex;

const SCALAR_TYPES: &[&str] = &[
    "UInt8", "UInt16", "UInt32", "UInt64", "UInt128", "UInt256",
    "Int8", "Int16", "Int32", "Int64", "Int128", "Int256",
    "Float32", "Float64",
    "String", "UUID", "Date", "Date32", "DateTime", "Bool",
    "IPv4", "IPv6",
];

static DATETIME64: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^DateTime64\(\s*[0-9]+\s*(,\s*'[A-Za-z_/]+'\s*)?\)$").unwrap());
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Decimal(32|64|128|256)?\(\s*[0-9]+\s*(,\s*[0-9]+\s*)?\)$").unwrap());
static FIXED_STRING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^FixedString\(\s*[0-9]+\s*\)$").unwrap());
static NULLABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Nullable\((.+)\)$").unwrap());
static ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Array\((.+)\)$").unwrap());
static LOW_CARDINALITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^LowCardinality\((.+)\)$").unwrap());

/// Returns `true` when `type_str` is a ClickHouse column type this sink
/// supports. Supports nested `Nullable(...)`, `Array(...)` and
/// `LowCardinality(...)` wrappers recursively.
pub fn is_supported_column_type(type_str: &str) -> bool {
    let t = type_str.trim();
    if t.is_empty() {
        return false;
    }
    if SCALAR_TYPES.contains(&t) {
        return true;
    }
    if DATETIME64.is_match(t) || DECIMAL.is_match(t) || FIXED_STRING.is_match(t) {
        return true;
    }
    if let Some(caps) = NULLABLE.captures(t) {
        return is_supported_column_type(&caps[1]);
    }
    if let Some(caps) = ARRAY.captures(t) {
        return is_supported_column_type(&caps[1]);
    }
    if let Some(caps) = LOW_CARDINALITY.captures(t) {
        return is_supported_column_type(&caps[1]);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_scalars() {
        for t in ["UUID", "String", "UInt64", "Bool", "DateTime", "Float64"] {
            assert!(is_supported_column_type(t), "{t} should be supported");
        }
    }

    #[test]
    fn accepts_parameterized_types() {
        assert!(is_supported_column_type("DateTime64(3)"));
        assert!(is_supported_column_type("DateTime64(3, 'UTC')"));
        assert!(is_supported_column_type("Decimal(18, 4)"));
        assert!(is_supported_column_type("FixedString(16)"));
    }

    #[test]
    fn accepts_nested_wrappers() {
        assert!(is_supported_column_type("Nullable(UUID)"));
        assert!(is_supported_column_type("Array(String)"));
        assert!(is_supported_column_type("LowCardinality(String)"));
        assert!(is_supported_column_type("Array(Nullable(UInt32))"));
    }

    #[test]
    fn rejects_unknown_or_malformed_types() {
        for t in ["", "Varchar", "Integer", "Nullable()", "Array(Bogus)", "Decimal(x, y)"] {
            assert!(!is_supported_column_type(t), "{t} should be rejected");
        }
    }
}
