//! Tool-call fingerprinting: identical `(name, arguments)` pairs within a
//! single request are detected so a model stuck repeating the same call
//! can be short-circuited rather than burning the iteration budget.

use serde_json::Value;

/// `serde_json::Value`'s default map is a `BTreeMap`, so this serialization
/// is key-order-stable without any extra canonicalization step.
pub fn fingerprint(tool_name: &str, arguments: &Value) -> String {
    let canonical = serde_json::to_string(arguments).unwrap_or_default();
    format!("{tool_name}:{canonical}")
}
