use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::value::kind;
use crate::registry::ProcessFn;

/// Input or output descriptor.
///
/// As an input, `from_` is a path into one of the sources and `as_` is the
/// keyword the value is passed under; without `as_` the value is passed
/// positionally. As an output, `from_` is a key into the function's return
/// value and `as_` is the state path it is written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DescriptorRepr")]
pub struct I {
    #[serde(rename = "from")]
    pub from_: String,
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub as_: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DescriptorRepr {
    Path(String),
    Binding {
        from: String,
        #[serde(default, rename = "as")]
        as_: Option<String>,
    },
}

impl From<DescriptorRepr> for I {
    fn from(repr: DescriptorRepr) -> Self {
        match repr {
            DescriptorRepr::Path(from) => I::positional(from),
            DescriptorRepr::Binding { from, as_ } => I { from_: from, as_ },
        }
    }
}

impl I {
    pub fn new(from: impl Into<String>, as_: impl Into<String>) -> Self {
        Self {
            from_: from.into(),
            as_: Some(as_.into()),
        }
    }

    pub fn positional(from: impl Into<String>) -> Self {
        Self {
            from_: from.into(),
            as_: None,
        }
    }

    /// The keyword name, treating an empty `as_` as absent.
    pub fn keyword(&self) -> Option<&str> {
        self.as_.as_deref().filter(|name| !name.is_empty())
    }
}

/// A literal argument that is not looked up in any source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInput {
    #[serde(default, rename = "as", skip_serializing_if = "Option::is_none")]
    pub as_: Option<String>,
    pub value: Value,
}

impl AdditionalInput {
    pub fn new(as_: impl Into<String>, value: Value) -> Self {
        Self {
            as_: Some(as_.into()),
            value,
        }
    }

    pub fn positional(value: Value) -> Self {
        Self { as_: None, value }
    }

    pub fn keyword(&self) -> Option<&str> {
        self.as_.as_deref().filter(|name| !name.is_empty())
    }
}

/// Arguments a process function is called with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

impl Args {
    pub fn new(args: Vec<Value>, kwargs: Map<String, Value>) -> Self {
        Self { args, kwargs }
    }

    pub fn positional(args: Vec<Value>) -> Self {
        Self {
            args,
            kwargs: Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Looks a parameter up by keyword first, then by position.
    pub fn value(&self, name: &str, position: usize) -> Option<&Value> {
        self.kwargs.get(name).or_else(|| self.args.get(position))
    }

    pub fn require(&self, name: &str, position: usize) -> Result<&Value> {
        self.value(name, position)
            .ok_or_else(|| anyhow!("missing argument `{name}` (position {position})"))
    }

    pub fn number(&self, name: &str, position: usize) -> Result<f64> {
        let value = self.require(name, position)?;
        value
            .as_f64()
            .ok_or_else(|| anyhow!("argument `{name}` must be a number, got {}", kind(value)))
    }
}

fn short_type_name(full: &str) -> String {
    let mut parts = full.rsplit("::");
    let last = parts.next().unwrap_or(full);
    match parts.next() {
        Some(parent) if last.starts_with('{') => format!("{parent}::{last}"),
        _ => last.to_string(),
    }
}

/// A function plus the declaration of where its inputs come from and where
/// its outputs go.
#[derive(Clone)]
pub struct Process {
    pub func: Arc<dyn ProcessFn>,
    pub name: String,
    pub gate: bool,
    pub comment: String,
    pub config_inputs: Vec<I>,
    pub parameters_inputs: Vec<I>,
    pub external_state_inputs: Vec<I>,
    pub state_inputs: Vec<I>,
    pub additional_inputs: Vec<AdditionalInput>,
    pub state_outputs: Vec<I>,
    pub args: Vec<Value>,
}

impl Process {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Args) -> Result<Value> + Send + Sync + 'static,
    {
        let name = short_type_name(type_name::<F>());
        Self::from_shared(Arc::new(func)).name(name)
    }

    pub fn from_shared(func: Arc<dyn ProcessFn>) -> Self {
        Self {
            func,
            name: String::new(),
            gate: true,
            comment: String::new(),
            config_inputs: Vec::new(),
            parameters_inputs: Vec::new(),
            external_state_inputs: Vec::new(),
            state_inputs: Vec::new(),
            additional_inputs: Vec::new(),
            state_outputs: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn gate(mut self, gate: bool) -> Self {
        self.gate = gate;
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn config_inputs(mut self, inputs: Vec<I>) -> Self {
        self.config_inputs = inputs;
        self
    }

    pub fn parameters_inputs(mut self, inputs: Vec<I>) -> Self {
        self.parameters_inputs = inputs;
        self
    }

    pub fn external_state_inputs(mut self, inputs: Vec<I>) -> Self {
        self.external_state_inputs = inputs;
        self
    }

    pub fn state_inputs(mut self, inputs: Vec<I>) -> Self {
        self.state_inputs = inputs;
        self
    }

    pub fn additional_inputs(mut self, inputs: Vec<AdditionalInput>) -> Self {
        self.additional_inputs = inputs;
        self
    }

    pub fn state_outputs(mut self, outputs: Vec<I>) -> Self {
        self.state_outputs = outputs;
        self
    }

    pub fn args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    /// Name used in logs and errors: the comment, or the function name.
    pub fn label(&self) -> &str {
        if self.comment.is_empty() {
            &self.name
        } else {
            &self.comment
        }
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("name", &self.name)
            .field("gate", &self.gate)
            .field("comment", &self.comment)
            .field("config_inputs", &self.config_inputs)
            .field("parameters_inputs", &self.parameters_inputs)
            .field("external_state_inputs", &self.external_state_inputs)
            .field("state_inputs", &self.state_inputs)
            .field("additional_inputs", &self.additional_inputs)
            .field("state_outputs", &self.state_outputs)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
