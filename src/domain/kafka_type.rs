//! Normalizes the free-form type strings clients send (field types, dedup
//! key types) into the small canonical vocabulary the wiring graph uses
//! internally, before anything is persisted.

const CANONICAL: &[&str] = &[
    "string", "int32", "int64", "float32", "float64", "bool", "bytes", "timestamp",
];

/// Maps a free-form type name to one of the canonical names above. Unknown
/// input is passed through lower-cased so a later validation step can still
/// report the original, recognizable token rather than silently coercing it.
pub fn normalize_to_basic_kafka_type(raw: &str) -> String {
    let lower = raw.trim().to_ascii_lowercase();
    match lower.as_str() {
        "string" | "str" | "text" | "varchar" => "string",
        "int" | "integer" | "int32" | "i32" => "int32",
        "long" | "int64" | "i64" | "bigint" => "int64",
        "float" | "float32" | "f32" => "float32",
        "double" | "float64" | "f64" => "float64",
        "bool" | "boolean" => "bool",
        "bytes" | "binary" => "bytes",
        "timestamp" | "datetime" | "time" => "timestamp",
        other => {
            if CANONICAL.contains(&other) {
                other
            } else {
                return lower;
            }
        }
    }
    .to_string()
}
