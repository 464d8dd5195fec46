use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::binder::{bind, BindError, Sources};
use crate::config::RunnerOptions;
use crate::core::object::{apply_with_policy, UpdateError};
use crate::core::value::{extract_result, ExtractError};
use crate::process::Process;

/// What went wrong inside a single process.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error("process function failed: {0:#}")]
    Function(anyhow::Error),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Update(#[from] UpdateError),
}

/// A process failed; carries its label, the original error and the state
/// it was given.
#[derive(Debug, Error)]
#[error("failed to run {label}: {error}\nstate: {snapshot}")]
pub struct ProcessExecutionError {
    label: String,
    #[source]
    error: StepError,
    state: Value,
    snapshot: String,
}

impl ProcessExecutionError {
    fn new(label: &str, error: StepError, state: Value, options: &RunnerOptions) -> Self {
        let snapshot = truncate_snapshot(
            &state.to_string(),
            options.snapshot_limit,
            options.snapshot_edge,
        );
        Self {
            label: label.to_string(),
            error,
            state,
            snapshot,
        }
    }

    pub fn message(&self) -> String {
        format!("Failed to run {}", self.label)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn error(&self) -> &StepError {
        &self.error
    }

    pub fn into_error(self) -> StepError {
        self.error
    }

    /// The error returned by the process function itself, if that is what
    /// failed.
    pub fn function_error(&self) -> Option<&anyhow::Error> {
        match &self.error {
            StepError::Function(err) => Some(err),
            _ => None,
        }
    }

    /// State the failing process received.
    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }
}

/// Keeps the first and last `edge` characters of `text` when it is longer
/// than `limit`.
pub fn truncate_snapshot(text: &str, limit: usize, edge: usize) -> String {
    let count = text.chars().count();
    if count <= limit {
        return text.to_string();
    }
    let head: String = text.chars().take(edge).collect();
    let tail: String = text.chars().skip(count.saturating_sub(edge)).collect();
    format!("{head}...{tail}")
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Process(#[from] ProcessExecutionError),
    #[error("cannot encode state: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("cannot decode final state: {0}")]
    Decode(#[source] serde_json::Error),
}

// `None` means the process declared no outputs and the state is unchanged.
fn execute(
    state: &Value,
    process: &Process,
    sources: Sources<'_>,
    options: &RunnerOptions,
) -> Result<Option<Value>, StepError> {
    let args = bind(process, state, sources, &options.merge_order)?;
    let result = process.func.call(args).map_err(StepError::Function)?;

    let mut next: Option<Value> = None;
    for output in &process.state_outputs {
        let current = next.as_ref().unwrap_or(state);
        let value = extract_result(&result, &output.from_)?;
        let target = output.keyword().unwrap_or_default();
        next = Some(apply_with_policy(current, target, value, options.field_policy)?);
        tracing::trace!(from = %output.from_, to = target, "applied process output");
    }
    Ok(next)
}

/// Runs one process against `prev_state` and returns its successor.
///
/// A closed gate returns `prev_state` untouched without calling the
/// function.
pub fn run_process(
    prev_state: Value,
    process: &Process,
    sources: Sources<'_>,
    options: &RunnerOptions,
) -> Result<Value, ProcessExecutionError> {
    if !process.gate {
        tracing::debug!(process = process.label(), "gate closed, skipping process");
        return Ok(prev_state);
    }
    match execute(&prev_state, process, sources, options) {
        Ok(next) => {
            tracing::debug!(process = process.label(), "process completed");
            Ok(next.unwrap_or(prev_state))
        }
        Err(error) => {
            tracing::warn!(process = process.label(), error = %error, "process failed");
            Err(ProcessExecutionError::new(
                process.label(),
                error,
                prev_state,
                options,
            ))
        }
    }
}

pub fn run_with_options(
    processes: &[Process],
    initial_state: Value,
    config: &Value,
    parameters: &Value,
    external_state: &Value,
    options: &RunnerOptions,
) -> Result<Value, ProcessExecutionError> {
    let sources = Sources {
        config,
        parameters,
        external_state,
    };
    let final_state =
        processes
            .iter()
            .enumerate()
            .try_fold(initial_state, |state, (index, process)| {
                let span = tracing::debug_span!("process", index, label = process.label());
                let _entered = span.enter();
                run_process(state, process, sources, options)
            })?;
    tracing::debug!(processes = processes.len(), "pipeline finished");
    Ok(final_state)
}

/// Folds `processes` over `initial_state` in declared order.
pub fn run(
    processes: &[Process],
    initial_state: Value,
    config: &Value,
    parameters: &Value,
    external_state: &Value,
) -> Result<Value, ProcessExecutionError> {
    run_with_options(
        processes,
        initial_state,
        config,
        parameters,
        external_state,
        &RunnerOptions::default(),
    )
}

/// Captures a process list once so it can be run against many initial
/// states.
pub fn initialize(
    processes: Vec<Process>,
) -> impl Fn(Value, &Value, &Value, &Value) -> Result<Value, ProcessExecutionError> {
    initialize_with_options(processes, RunnerOptions::default())
}

pub fn initialize_with_options(
    processes: Vec<Process>,
    options: RunnerOptions,
) -> impl Fn(Value, &Value, &Value, &Value) -> Result<Value, ProcessExecutionError> {
    move |initial_state: Value, config: &Value, parameters: &Value, external_state: &Value| {
        run_with_options(
            &processes,
            initial_state,
            config,
            parameters,
            external_state,
            &options,
        )
    }
}

/// Holds the read-only sources so pipelines only need an initial state.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: Value,
    parameters: Value,
    external_state: Value,
    options: RunnerOptions,
}

impl ProcessRunner {
    pub fn new(config: Value, parameters: Value, external_state: Value) -> Self {
        Self {
            config,
            parameters,
            external_state,
            options: RunnerOptions::default(),
        }
    }

    pub fn from_typed<C, P, E>(
        config: &C,
        parameters: &P,
        external_state: &E,
    ) -> Result<Self, serde_json::Error>
    where
        C: Serialize,
        P: Serialize,
        E: Serialize,
    {
        Ok(Self::new(
            serde_json::to_value(config)?,
            serde_json::to_value(parameters)?,
            serde_json::to_value(external_state)?,
        ))
    }

    pub fn with_options(mut self, options: RunnerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    pub fn config(&self) -> &Value {
        &self.config
    }

    pub fn parameters(&self) -> &Value {
        &self.parameters
    }

    pub fn external_state(&self) -> &Value {
        &self.external_state
    }

    pub fn run_processes(
        &self,
        processes: &[Process],
        initial_state: Value,
    ) -> Result<Value, ProcessExecutionError> {
        run_with_options(
            processes,
            initial_state,
            &self.config,
            &self.parameters,
            &self.external_state,
            &self.options,
        )
    }

    pub fn initialize_processes(
        &self,
        processes: Vec<Process>,
    ) -> impl Fn(Value) -> Result<Value, ProcessExecutionError> + '_ {
        move |initial_state: Value| self.run_processes(&processes, initial_state)
    }

    /// Runs a pipeline over a typed state record, going through its serde
    /// representation.
    pub fn run_typed<S>(&self, processes: &[Process], initial_state: &S) -> Result<S, PipelineError>
    where
        S: Serialize + DeserializeOwned,
    {
        let state = serde_json::to_value(initial_state).map_err(PipelineError::Encode)?;
        let final_state = self.run_processes(processes, state)?;
        serde_json::from_value(final_state).map_err(PipelineError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{Args, I};
    use serde_json::json;

    #[test]
    fn truncates_long_snapshots_at_both_ends() {
        let text = "a".repeat(100) + &"b".repeat(50) + &"c".repeat(100);
        let shortened = truncate_snapshot(&text, 200, 100);
        assert_eq!(shortened, "a".repeat(100) + "..." + &"c".repeat(100));
        assert_eq!(truncate_snapshot("short", 200, 100), "short");
    }

    #[test]
    fn outputs_apply_in_sequence() {
        let process = Process::new(|_args: Args| Ok(json!({ "first": 1, "second": 2 })))
            .state_outputs(vec![I::new("first", "a"), I::new("second", "a")]);
        let empty = json!({});
        let sources = Sources {
            config: &empty,
            parameters: &empty,
            external_state: &empty,
        };
        let next = run_process(json!({ "a": 0 }), &process, sources, &RunnerOptions::default())
            .unwrap();
        assert_eq!(next, json!({ "a": 2 }));
    }

    #[test]
    fn output_without_target_is_an_update_error() {
        let process = Process::new(|_args: Args| Ok(json!(1)))
            .comment("no target")
            .state_outputs(vec![I::positional("_result")]);
        let empty = json!({});
        let sources = Sources {
            config: &empty,
            parameters: &empty,
            external_state: &empty,
        };
        let err = run_process(json!({ "a": 0 }), &process, sources, &RunnerOptions::default())
            .unwrap_err();
        assert_eq!(err.label(), "no target");
        assert!(matches!(err.error(), StepError::Update(UpdateError::EmptyPath)));
    }
}
