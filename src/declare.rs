//! Pipelines written as data: a list of process declarations whose `call`
//! names a function in a [`Registry`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::process::{AdditionalInput, Process, I};
use crate::registry::Registry;

#[derive(Debug, Error)]
pub enum DeclareError {
    #[error("invalid pipeline document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid pipeline document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("function not found: {0}")]
    UnknownFunction(String),
}

fn default_gate() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDecl {
    pub call: String,
    #[serde(default = "default_gate")]
    pub gate: bool,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub config_inputs: Vec<I>,
    #[serde(default)]
    pub parameters_inputs: Vec<I>,
    #[serde(default, alias = "e_state_inputs")]
    pub external_state_inputs: Vec<I>,
    #[serde(default)]
    pub state_inputs: Vec<I>,
    #[serde(default)]
    pub additional_inputs: Vec<AdditionalInput>,
    #[serde(default)]
    pub state_outputs: Vec<I>,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl ProcessDecl {
    pub fn build(&self, registry: &Registry) -> Result<Process, DeclareError> {
        let process = registry
            .process(&self.call)
            .ok_or_else(|| DeclareError::UnknownFunction(self.call.clone()))?;
        Ok(process
            .gate(self.gate)
            .comment(self.comment.clone())
            .config_inputs(self.config_inputs.clone())
            .parameters_inputs(self.parameters_inputs.clone())
            .external_state_inputs(self.external_state_inputs.clone())
            .state_inputs(self.state_inputs.clone())
            .additional_inputs(self.additional_inputs.clone())
            .state_outputs(self.state_outputs.clone())
            .args(self.args.clone()))
    }
}

pub fn parse_pipeline(value: &Value) -> Result<Vec<ProcessDecl>, DeclareError> {
    let decls: Vec<ProcessDecl> = serde_json::from_value(value.clone())?;
    Ok(decls)
}

pub fn parse_pipeline_yaml(text: &str) -> Result<Vec<ProcessDecl>, DeclareError> {
    let decls: Vec<ProcessDecl> = serde_yaml::from_str(text)?;
    Ok(decls)
}

pub fn build_pipeline(
    decls: &[ProcessDecl],
    registry: &Registry,
) -> Result<Vec<Process>, DeclareError> {
    decls.iter().map(|decl| decl.build(registry)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Args;
    use serde_json::json;

    #[test]
    fn defaults_fill_missing_fields() {
        let decls = parse_pipeline(&json!([{ "call": "noop" }])).unwrap();
        let decl = &decls[0];
        assert!(decl.gate);
        assert!(decl.comment.is_empty());
        assert!(decl.state_outputs.is_empty());
    }

    #[test]
    fn build_rejects_unknown_functions() {
        let registry = Registry::new();
        registry.register("noop", |_args: Args| Ok(Value::Null));
        let decls = parse_pipeline(&json!([{ "call": "noop" }, { "call": "missing" }])).unwrap();
        match build_pipeline(&decls, &registry) {
            Err(DeclareError::UnknownFunction(name)) => assert_eq!(name, "missing"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
