pub mod binder;
pub mod compose;
pub mod config;
pub mod core;
pub mod declare;
pub mod impls;
pub mod logging;
pub mod process;
pub mod registry;

pub use binder::{bind, BindError, MergeOrder, Source, Sources};
pub use compose::{
    initialize, initialize_with_options, run, run_process, run_with_options, PipelineError,
    ProcessExecutionError, ProcessRunner, StepError,
};
pub use config::{ConfigError, RunnerOptions};
pub use declare::{build_pipeline, parse_pipeline, parse_pipeline_yaml, DeclareError, ProcessDecl};
pub use impls::demo::register_demo_impls;
pub use process::{AdditionalInput, Args, Process, I};
pub use registry::{ProcessFn, Registry};
