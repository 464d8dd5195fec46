use serde_json::Value;
use thiserror::Error;

use super::value::kind;

/// Output key meaning "the whole return value".
pub const RESULT_KEY: &str = "_result";
/// Output key meaning "the whole sequence".
pub const LIST_KEY: &str = "_list";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SegmentError {
    #[error("no key `{0}`")]
    MissingKey(String),
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("`{0}` is not an integer index")]
    NotAnIndex(String),
    #[error("cannot look up `{segment}` on a {kind}")]
    NotAContainer { segment: String, kind: &'static str },
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot resolve `{path}` at `{segment}`: {reason}")]
pub struct ResolveError {
    pub path: String,
    pub segment: String,
    pub reason: SegmentError,
}

pub fn split_path(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split('.').collect()
}

pub(crate) fn parse_index(segment: &str, len: usize) -> Result<usize, SegmentError> {
    let index: i64 = segment
        .parse()
        .map_err(|_| SegmentError::NotAnIndex(segment.to_string()))?;
    let resolved = if index < 0 {
        len as i64 + index
    } else {
        index
    };
    if resolved < 0 || resolved as usize >= len {
        return Err(SegmentError::IndexOutOfRange { index, len });
    }
    Ok(resolved as usize)
}

/// Moves one segment down from `current`.
pub fn step<'a>(current: &'a Value, segment: &str) -> Result<&'a Value, SegmentError> {
    match current {
        Value::Object(map) => map
            .get(segment)
            .ok_or_else(|| SegmentError::MissingKey(segment.to_string())),
        Value::Array(items) => {
            let index = parse_index(segment, items.len())?;
            Ok(&items[index])
        }
        other => Err(SegmentError::NotAContainer {
            segment: segment.to_string(),
            kind: kind(other),
        }),
    }
}

fn step_or_sentinel<'a>(current: &'a Value, segment: &str) -> Result<&'a Value, SegmentError> {
    match segment {
        RESULT_KEY => Ok(current),
        LIST_KEY if current.is_array() => Ok(current),
        LIST_KEY => Err(SegmentError::NotAContainer {
            segment: segment.to_string(),
            kind: kind(current),
        }),
        _ => step(current, segment),
    }
}

pub fn resolve_segments<'a, S: AsRef<str>>(
    root: &'a Value,
    path: &str,
    segments: &[S],
) -> Result<&'a Value, ResolveError> {
    let mut current = root;
    for segment in segments {
        let segment = segment.as_ref();
        current = step_or_sentinel(current, segment).map_err(|reason| ResolveError {
            path: path.to_string(),
            segment: segment.to_string(),
            reason,
        })?;
    }
    Ok(current)
}

pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Result<&'a Value, ResolveError> {
    resolve_segments(root, path, &split_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_objects_and_arrays() {
        let root = json!({ "matrix": [[1, 2], [3, 4, 5, 6]], "roo": { "abc": 5 } });
        assert_eq!(resolve_path(&root, "roo.abc").unwrap(), &json!(5));
        assert_eq!(resolve_path(&root, "matrix.1.3").unwrap(), &json!(6));
        assert_eq!(resolve_path(&root, "matrix.-1.0").unwrap(), &json!(3));
        assert_eq!(resolve_path(&root, "").unwrap(), &root);
    }

    #[test]
    fn reports_failing_segment() {
        let root = json!({ "arr": [1, 2, 3], "foo": 1 });
        let err = resolve_path(&root, "arr.3").unwrap_err();
        assert_eq!(err.segment, "3");
        assert_eq!(err.reason, SegmentError::IndexOutOfRange { index: 3, len: 3 });

        let err = resolve_path(&root, "arr.first").unwrap_err();
        assert_eq!(err.reason, SegmentError::NotAnIndex("first".into()));

        let err = resolve_path(&root, "foo.bar").unwrap_err();
        assert!(matches!(err.reason, SegmentError::NotAContainer { kind: "number", .. }));

        let err = resolve_path(&root, "missing").unwrap_err();
        assert_eq!(err.path, "missing");
        assert_eq!(err.reason, SegmentError::MissingKey("missing".into()));
    }

    #[test]
    fn sentinels_short_circuit() {
        let root = json!({ "arr": [1, 2, 3], "foo": 1 });
        assert_eq!(resolve_path(&root, "arr._list").unwrap(), &json!([1, 2, 3]));
        assert_eq!(resolve_path(&root, "foo._result").unwrap(), &json!(1));
        assert!(resolve_path(&root, "foo._list").is_err());
    }
}
