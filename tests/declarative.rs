use anyhow::Result;
use proflow_kernel_rs::{
    build_pipeline, parse_pipeline, parse_pipeline_yaml, register_demo_impls, DeclareError,
    ProcessRunner, Registry, I,
};
use serde_json::json;

fn registry() -> Registry {
    let registry = Registry::new();
    register_demo_impls(&registry);
    registry
}

const PIPELINE: &str = r#"
- call: add
  comment: combine config
  config_inputs:
    - { from: foo, as: x }
    - { from: bar, as: y }
  state_outputs:
    - { from: result, as: total }
- call: sum
  state_inputs:
    - { from: "samples.{state.window}", as: values }
  state_outputs:
    - { from: mean, as: stats.mean }
    - { from: count, as: stats.count }
- call: fail
  gate: false
- call: pair
  e_state_inputs:
    - data_a
  additional_inputs:
    - { value: "tail" }
  state_outputs:
    - { from: _list, as: last_pair }
"#;

#[test]
fn yaml_pipeline_runs_against_registry() -> Result<()> {
    let decls = parse_pipeline_yaml(PIPELINE)?;
    assert_eq!(decls.len(), 4);
    assert_eq!(decls[0].config_inputs[0], I::new("foo", "x"));
    assert_eq!(decls[3].external_state_inputs[0], I::positional("data_a"));
    assert!(!decls[2].gate);

    let processes = build_pipeline(&decls, &registry())?;
    assert_eq!(processes[0].label(), "combine config");
    assert_eq!(processes[1].label(), "sum");

    let runner = ProcessRunner::new(
        json!({ "foo": 1, "bar": 3 }),
        json!({}),
        json!({ "data_a": "head" }),
    );
    let final_state = runner.run_processes(
        &processes,
        json!({
            "total": 0,
            "window": 1,
            "samples": [[1, 1], [2, 4, 6]],
            "stats": { "mean": null, "count": 0 },
            "last_pair": []
        }),
    )?;

    assert_eq!(final_state["total"], json!(4));
    assert_eq!(final_state["stats"], json!({ "mean": 4.0, "count": 3 }));
    assert_eq!(final_state["last_pair"], json!(["head", "tail"]));
    Ok(())
}

#[test]
fn json_documents_parse_the_same_shape() -> Result<()> {
    let decls = parse_pipeline(&json!([
        {
            "call": "echo",
            "args": ["hello"],
            "parameters_inputs": ["k", { "from": "arr.0", "as": "first" }],
            "state_outputs": [{ "from": "_result", "as": "seen" }]
        }
    ]))?;
    let processes = build_pipeline(&decls, &registry())?;

    let runner = ProcessRunner::new(json!({}), json!({ "k": 0.5, "arr": [7, 8] }), json!({}));
    let final_state = runner.run_processes(&processes, json!({ "seen": null }))?;
    assert_eq!(
        final_state["seen"],
        json!({ "args": ["hello", 0.5], "kwargs": { "first": 7 } })
    );
    Ok(())
}

#[test]
fn unknown_calls_and_bad_documents_are_rejected() {
    let decls = parse_pipeline(&json!([{ "call": "not_registered" }])).unwrap();
    assert!(matches!(
        build_pipeline(&decls, &registry()),
        Err(DeclareError::UnknownFunction(name)) if name == "not_registered"
    ));

    assert!(matches!(
        parse_pipeline(&json!([{ "gate": true }])),
        Err(DeclareError::Json(_))
    ));
    assert!(matches!(
        parse_pipeline_yaml("- call: [unterminated"),
        Err(DeclareError::Yaml(_))
    ));
}
