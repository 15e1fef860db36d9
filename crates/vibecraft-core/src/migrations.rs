use serde_json::{Map, Value};

pub const CURRENT_VERSION: &str = "0.4.0";

/// Bring a raw manifest object up to [`CURRENT_VERSION`] in place.
///
/// Runs before typed deserialization so that falsy values (`null`, `""`)
/// can be repaired. Returns whether anything changed.
pub fn migrate_manifest(doc: &mut Map<String, Value>) -> bool {
    let version = doc
        .get("version")
        .and_then(Value::as_str)
        .unwrap_or("0.3.0")
        .to_string();

    match version.as_str() {
        "0.3.0" => migrate_0_3_to_0_4(doc),
        _ => false,
    }
}

/// 0.3.0 manifests have no `mode` and no `version`.
fn migrate_0_3_to_0_4(doc: &mut Map<String, Value>) -> bool {
    let mut changed = false;

    let mode_missing = match doc.get("mode") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    };
    if mode_missing {
        doc.insert("mode".to_string(), Value::String("simple".to_string()));
        changed = true;
    }

    if !doc.contains_key("version") {
        doc.insert(
            "version".to_string(),
            Value::String(CURRENT_VERSION.to_string()),
        );
        changed = true;
    }
    changed
}
