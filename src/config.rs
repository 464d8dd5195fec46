use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::binder::MergeOrder;
use crate::core::object::FieldPolicy;

const DEFAULT_SNAPSHOT_LIMIT: usize = 200;
const DEFAULT_SNAPSHOT_EDGE: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid runner options: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("snapshot_edge ({edge}) must be at most half of snapshot_limit ({limit})")]
    SnapshotBounds { limit: usize, edge: usize },
}

/// Knobs of the reducer.
///
/// ```toml
/// merge_order = ["external_state", "config", "parameters", "state", "additional"]
/// field_policy = "strict"
/// snapshot_limit = 200
/// snapshot_edge = 100
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerOptions {
    pub merge_order: MergeOrder,
    pub field_policy: FieldPolicy,
    /// Serialized states longer than this are shortened in error messages.
    pub snapshot_limit: usize,
    /// Characters kept from each end of a shortened state.
    pub snapshot_edge: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            merge_order: MergeOrder::default(),
            field_policy: FieldPolicy::Strict,
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
            snapshot_edge: DEFAULT_SNAPSHOT_EDGE,
        }
    }
}

impl RunnerOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let options: RunnerOptions = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_edge.saturating_mul(2) > self.snapshot_limit {
            return Err(ConfigError::SnapshotBounds {
                limit: self.snapshot_limit,
                edge: self.snapshot_edge,
            });
        }
        Ok(())
    }

    pub fn with_merge_order(mut self, order: MergeOrder) -> Self {
        self.merge_order = order;
        self
    }

    pub fn with_field_policy(mut self, policy: FieldPolicy) -> Self {
        self.field_policy = policy;
        self
    }
}
