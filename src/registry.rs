use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::Value;

use crate::process::{Args, Process};

/// A function a process invokes with its bound arguments.
pub trait ProcessFn: Send + Sync {
    fn call(&self, args: Args) -> Result<Value>;
}

impl<F> ProcessFn for F
where
    F: Fn(Args) -> Result<Value> + Send + Sync + 'static,
{
    fn call(&self, args: Args) -> Result<Value> {
        (self)(args)
    }
}

struct RegistryInner {
    funcs: HashMap<String, Arc<dyn ProcessFn>>,
}

impl RegistryInner {
    fn new() -> Self {
        Self {
            funcs: HashMap::new(),
        }
    }
}

/// Named process functions, used to build processes from declarations.
/// Clones share the same table.
pub struct Registry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Registry {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner::new())),
        }
    }

    pub fn register<F>(&self, name: impl Into<String>, func: F)
    where
        F: Fn(Args) -> Result<Value> + Send + Sync + 'static,
    {
        self.register_shared(name, Arc::new(func));
    }

    pub fn register_shared(&self, name: impl Into<String>, func: Arc<dyn ProcessFn>) {
        let mut inner = self.inner.lock().expect("registry poisoned");
        inner.funcs.insert(name.into(), func);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ProcessFn>> {
        let inner = self.inner.lock().expect("registry poisoned");
        inner.funcs.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        let inner = self.inner.lock().expect("registry poisoned");
        inner.funcs.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let inner = self.inner.lock().expect("registry poisoned");
        let mut names: Vec<String> = inner.funcs.keys().cloned().collect();
        names.sort();
        names
    }

    /// A process calling the function registered under `name`, labelled
    /// with that name.
    pub fn process(&self, name: &str) -> Option<Process> {
        self.get(name)
            .map(|func| Process::from_shared(func).name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clones_share_registrations() {
        let registry = Registry::new();
        let cloned = registry.clone();
        cloned.register("double", |args: Args| {
            let x = args.number("x", 0)?;
            Ok(json!(x * 2.0))
        });
        assert!(registry.contains("double"));
        assert_eq!(registry.names(), vec!["double".to_string()]);

        let func = registry.get("double").unwrap();
        let out = func.call(Args::positional(vec![json!(4)])).unwrap();
        assert_eq!(out, json!(8.0));
    }

    #[test]
    fn process_carries_registered_name() {
        let registry = Registry::new();
        registry.register("noop", |_args: Args| Ok(Value::Null));
        let process = registry.process("noop").unwrap();
        assert_eq!(process.label(), "noop");
        assert!(registry.process("missing").is_none());
    }
}
