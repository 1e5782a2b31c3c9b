//! Structured-to-text rendering for scoring prompts.
//!
//! Stored records are serialized into human-readable `field: value` lines
//! before being embedded in the prompt. Keeping this behind its own module
//! lets the record field sets evolve without touching the parsing side of
//! the pipeline.

use serde::Serialize;
use serde_json::Value;

/// Renders a serializable record as one `field: value` line per field.
///
/// Field order follows serde_json's map ordering (alphabetical), so the
/// output is deterministic for identical inputs. Every field is rendered,
/// including nulls, so the text is lossless with respect to the record.
pub fn render_record<T: Serialize>(record: &T) -> String {
    let value = serde_json::to_value(record).unwrap_or(Value::Null);
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, val)| format!("{}: {}", key, render_value(val)))
            .collect::<Vec<_>>()
            .join("\n"),
        other => render_value(&other),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        // Nested objects stay as compact JSON
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_flat_object() {
        let record = json!({
            "first_name": "Marie",
            "monthly_income": 4200,
            "pets": ["Cat", "Dog"],
            "phone": null,
            "smoking": false
        });

        let text = render_record(&record);

        // Alphabetical field order, one line per field
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "first_name: Marie",
                "monthly_income: 4200",
                "pets: Cat, Dog",
                "phone: null",
                "smoking: false",
            ]
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let record = json!({
            "b": 1,
            "a": "x",
            "c": [1, 2, 3]
        });

        assert_eq!(render_record(&record), render_record(&record));
    }

    #[test]
    fn test_nested_objects_stay_json() {
        let record = json!({
            "attributes": {"rooms": 3, "surface": "62m2"}
        });

        let text = render_record(&record);
        assert!(text.starts_with("attributes: {"));
        assert!(text.contains("\"rooms\":3"));
    }
}
