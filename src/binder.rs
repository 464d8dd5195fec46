//! Turns a process's input declarations into the concrete arguments it is
//! called with.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::path::{resolve_path, ResolveError};
use crate::core::string::{format_template, TemplateContext, TemplateError};
use crate::process::{Args, Process, I};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[serde(alias = "e_state")]
    ExternalState,
    Config,
    Parameters,
    State,
    Additional,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::ExternalState,
        Source::Config,
        Source::Parameters,
        Source::State,
        Source::Additional,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Source::ExternalState => "external_state",
            Source::Config => "config",
            Source::Parameters => "parameters",
            Source::State => "state",
            Source::Additional => "additional",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeOrderError {
    #[error("merge order lists `{0}` more than once")]
    Duplicate(Source),
    #[error("merge order is missing `{0}`")]
    Missing(Source),
}

/// Order in which sources are merged. Later sources win keyword
/// collisions, and positional values are flattened in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Source>", into = "Vec<Source>")]
pub struct MergeOrder(Vec<Source>);

impl MergeOrder {
    pub fn new(order: Vec<Source>) -> Result<Self, MergeOrderError> {
        for (i, source) in order.iter().enumerate() {
            if order[..i].contains(source) {
                return Err(MergeOrderError::Duplicate(*source));
            }
        }
        if let Some(missing) = Source::ALL.iter().find(|s| !order.contains(*s)) {
            return Err(MergeOrderError::Missing(*missing));
        }
        Ok(Self(order))
    }

    pub fn sources(&self) -> &[Source] {
        &self.0
    }
}

impl Default for MergeOrder {
    fn default() -> Self {
        Self(Source::ALL.to_vec())
    }
}

impl TryFrom<Vec<Source>> for MergeOrder {
    type Error = MergeOrderError;

    fn try_from(order: Vec<Source>) -> Result<Self, Self::Error> {
        Self::new(order)
    }
}

impl From<MergeOrder> for Vec<Source> {
    fn from(order: MergeOrder) -> Self {
        order.0
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// The read-only sources of one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
    pub config: &'a Value,
    pub parameters: &'a Value,
    pub external_state: &'a Value,
}

fn declared_inputs(process: &Process, source: Source) -> &[I] {
    match source {
        Source::ExternalState => process.external_state_inputs.as_slice(),
        Source::Config => process.config_inputs.as_slice(),
        Source::Parameters => process.parameters_inputs.as_slice(),
        Source::State => process.state_inputs.as_slice(),
        Source::Additional => &[],
    }
}

fn bind_declared(
    inputs: &[I],
    root: &Value,
    ctx: &TemplateContext<'_>,
    kwargs: &mut Map<String, Value>,
    positional: &mut Vec<Value>,
) -> Result<(), BindError> {
    for input in inputs {
        let from = format_template(&input.from_, ctx)?;
        let value = resolve_path(root, &from)?.clone();
        match input.keyword() {
            Some(as_) => {
                let key = format_template(as_, ctx)?;
                kwargs.insert(key.into_owned(), value);
            }
            None => positional.push(value),
        }
    }
    Ok(())
}

/// Resolves every declared input of `process` into call arguments.
///
/// The process's fixed `args` come first, followed by the positional
/// values of each source in merge order.
pub fn bind(
    process: &Process,
    state: &Value,
    sources: Sources<'_>,
    order: &MergeOrder,
) -> Result<Args, BindError> {
    let ctx = TemplateContext {
        config: sources.config,
        state,
        parameters: sources.parameters,
        external_state: sources.external_state,
        additional: &process.additional_inputs,
    };

    let mut kwargs = Map::new();
    let mut positional = process.args.clone();
    for source in order.sources() {
        let root = match source {
            Source::ExternalState => sources.external_state,
            Source::Config => sources.config,
            Source::Parameters => sources.parameters,
            Source::State => state,
            Source::Additional => {
                for input in &process.additional_inputs {
                    match input.keyword() {
                        Some(as_) => {
                            kwargs.insert(as_.to_string(), input.value.clone());
                        }
                        None => positional.push(input.value.clone()),
                    }
                }
                continue;
            }
        };
        let inputs = declared_inputs(process, *source);
        bind_declared(inputs, root, &ctx, &mut kwargs, &mut positional)?;
    }

    tracing::trace!(
        process = process.label(),
        positional = positional.len(),
        keywords = kwargs.len(),
        "bound process inputs"
    );
    Ok(Args::new(positional, kwargs))
}
