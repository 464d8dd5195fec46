//! Value-level building blocks shared by the binder and the reducer: path
//! resolution, path templates, result extraction and copy-on-write updates.
//! All of them operate on `serde_json::Value` and never mutate their inputs.

pub mod object;
pub mod path;
pub mod string;
pub mod value;

pub use object::{apply, apply_with_policy, FieldPolicy, UpdateError};
pub use path::{resolve_path, ResolveError, SegmentError, LIST_KEY, RESULT_KEY};
pub use string::{format_template, TemplateContext, TemplateError};
pub use value::{extract_result, ExtractError};
