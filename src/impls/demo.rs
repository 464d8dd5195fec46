use anyhow::{anyhow, Result};
use serde_json::{json, Number, Value};

use crate::process::Args;
use crate::registry::Registry;

/// `x + y`, staying integral when both operands are integers.
pub fn add(args: Args) -> Result<Value> {
    let x = args.require("x", 0)?;
    let y = args.require("y", 1)?;
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        let total = a
            .checked_add(b)
            .ok_or_else(|| anyhow!("integer overflow adding {a} and {b}"))?;
        return Ok(json!(total));
    }
    let total = args.number("x", 0)? + args.number("y", 1)?;
    Number::from_f64(total)
        .map(Value::Number)
        .ok_or_else(|| anyhow!("sum is not a finite number"))
}

/// Summary statistics of the numbers in `values`.
pub fn sum(args: Args) -> Result<Value> {
    let values = args
        .require("values", 0)?
        .as_array()
        .ok_or_else(|| anyhow!("`values` must be a sequence"))?;
    let mut total = 0.0;
    for value in values {
        total += value
            .as_f64()
            .ok_or_else(|| anyhow!("`values` must only contain numbers"))?;
    }
    let mean = if values.is_empty() {
        Value::Null
    } else {
        json!(total / values.len() as f64)
    };
    Ok(json!({ "total": total, "count": values.len(), "mean": mean }))
}

/// Returns the call arguments as `{ "args": [...], "kwargs": {...} }`.
pub fn echo(args: Args) -> Result<Value> {
    Ok(json!({ "args": args.args, "kwargs": args.kwargs }))
}

pub fn pair(args: Args) -> Result<Value> {
    let x = args.require("x", 0)?.clone();
    let y = args.require("y", 1)?.clone();
    Ok(json!([x, y]))
}

pub fn fail(_args: Args) -> Result<Value> {
    Err(anyhow!("boom"))
}

pub fn noop(_args: Args) -> Result<Value> {
    Ok(Value::Null)
}

pub fn register_demo_impls(registry: &Registry) {
    registry.register("add", add);
    registry.register("sum", sum);
    registry.register("echo", echo);
    registry.register("pair", pair);
    registry.register("fail", fail);
    registry.register("noop", noop);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_keeps_integers_integral() {
        assert_eq!(add(Args::positional(vec![json!(1), json!(3)])).unwrap(), json!(4));
        assert_eq!(add(Args::positional(vec![json!(1), json!(0.5)])).unwrap(), json!(1.5));
        assert!(add(Args::positional(vec![json!(1)])).is_err());
    }

    #[test]
    fn sum_reports_mean() {
        let out = sum(Args::positional(vec![json!([1, 2, 3, 4])])).unwrap();
        assert_eq!(out["mean"], json!(2.5));
        assert_eq!(out["count"], json!(4));
        let out = sum(Args::positional(vec![json!([])])).unwrap();
        assert_eq!(out["mean"], Value::Null);
    }
}
