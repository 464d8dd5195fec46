use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::path::{parse_index, split_path, SegmentError};
use super::value::kind;

/// Whether an update may introduce a key the state does not have yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldPolicy {
    /// Fixed field set: every segment, leaf included, must already exist.
    #[default]
    Strict,
    /// The leaf of an object may be a new key.
    Open,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpdateError {
    #[error("state path must not be empty")]
    EmptyPath,
    #[error("cannot update `{path}`: state has no field `{field}`")]
    UnknownField { path: String, field: String },
    #[error("cannot update `{path}` at `{segment}`: {reason}")]
    Segment {
        path: String,
        segment: String,
        reason: SegmentError,
    },
}

/// Returns a copy of `state` with `value` written at the dotted `path`.
pub fn apply(state: &Value, path: &str, value: Value) -> Result<Value, UpdateError> {
    apply_with_policy(state, path, value, FieldPolicy::Strict)
}

pub fn apply_with_policy(
    state: &Value,
    path: &str,
    value: Value,
    policy: FieldPolicy,
) -> Result<Value, UpdateError> {
    let segments = split_path(path);
    if segments.is_empty() {
        return Err(UpdateError::EmptyPath);
    }
    replace_at(state, path, &segments, value, policy)
}

// Rebuilds the addressed spine; siblings are copied across unchanged.
fn replace_at(
    current: &Value,
    path: &str,
    segments: &[&str],
    value: Value,
    policy: FieldPolicy,
) -> Result<Value, UpdateError> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(value);
    };
    match current {
        Value::Object(map) => {
            let replacement = match map.get(*head) {
                Some(child) => replace_at(child, path, rest, value, policy)?,
                None if rest.is_empty() && policy == FieldPolicy::Open => value,
                None => {
                    return Err(UpdateError::UnknownField {
                        path: path.to_string(),
                        field: head.to_string(),
                    })
                }
            };
            let mut next = Map::new();
            let mut replacement = Some(replacement);
            for (key, entry) in map {
                if key == head {
                    next.insert(key.clone(), replacement.take().unwrap_or(Value::Null));
                } else {
                    next.insert(key.clone(), entry.clone());
                }
            }
            if let Some(added) = replacement {
                next.insert(head.to_string(), added);
            }
            Ok(Value::Object(next))
        }
        Value::Array(items) => {
            let index = parse_index(head, items.len()).map_err(|reason| UpdateError::Segment {
                path: path.to_string(),
                segment: head.to_string(),
                reason,
            })?;
            let replacement = replace_at(&items[index], path, rest, value, policy)?;
            let mut replacement = Some(replacement);
            let next = items
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    if i == index {
                        replacement.take().unwrap_or(Value::Null)
                    } else {
                        entry.clone()
                    }
                })
                .collect();
            Ok(Value::Array(next))
        }
        other => Err(UpdateError::Segment {
            path: path.to_string(),
            segment: head.to_string(),
            reason: SegmentError::NotAContainer {
                segment: head.to_string(),
                kind: kind(other),
            },
        }),
    }
}
