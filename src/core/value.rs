use serde_json::Value;
use thiserror::Error;

use super::path::{step, SegmentError, LIST_KEY, RESULT_KEY};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("cannot take `{key}` from a {kind} result")]
    Unsupported { key: String, kind: &'static str },
    #[error("cannot take `{key}` from result: {reason}")]
    Missing { key: String, reason: SegmentError },
}

pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Text used when a value is spliced into a path template.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Pulls the part of a process's return value named by an output key.
///
/// Scalar results have nothing to index into, so any key yields the
/// scalar itself.
pub fn extract_result(result: &Value, key: &str) -> Result<Value, ExtractError> {
    if key == RESULT_KEY {
        return Ok(result.clone());
    }
    match result {
        Value::Array(_) if key == LIST_KEY => Ok(result.clone()),
        Value::Object(_) if key == LIST_KEY => Err(ExtractError::Unsupported {
            key: key.to_string(),
            kind: kind(result),
        }),
        Value::Array(_) | Value::Object(_) => {
            step(result, key)
                .cloned()
                .map_err(|reason| ExtractError::Missing {
                    key: key.to_string(),
                    reason,
                })
        }
        scalar => Ok(scalar.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_by_shape() {
        let mapping = json!({ "mean": 2.5, "n": 4 });
        assert_eq!(extract_result(&mapping, "n").unwrap(), json!(4));
        assert_eq!(extract_result(&mapping, RESULT_KEY).unwrap(), mapping);

        let list = json!([10, 20, 30]);
        assert_eq!(extract_result(&list, "1").unwrap(), json!(20));
        assert_eq!(extract_result(&list, LIST_KEY).unwrap(), list);

        assert_eq!(extract_result(&json!(4), "result").unwrap(), json!(4));
    }

    #[test]
    fn rejects_mismatched_keys() {
        let list = json!([10, 20, 30]);
        assert!(matches!(
            extract_result(&list, "x"),
            Err(ExtractError::Missing { reason: SegmentError::NotAnIndex(_), .. })
        ));
        assert!(matches!(
            extract_result(&json!({ "a": 1 }), LIST_KEY),
            Err(ExtractError::Unsupported { kind: "mapping", .. })
        ));
        assert!(extract_result(&json!({ "a": 1 }), "b").is_err());
    }

    #[test]
    fn renders_strings_bare() {
        assert_eq!(render(&json!("abc")), "abc");
        assert_eq!(render(&json!(3)), "3");
        assert_eq!(render(&json!(true)), "true");
    }
}
