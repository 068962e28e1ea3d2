//! Shared fixtures for skein-graph integration tests.
#![allow(dead_code)] // each test binary uses a different subset

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use skein_graph::test_utils::TestRuntime;
use skein_graph::{ModuleId, ModuleRecord, Transform, TransformChain, TransformError};

/// Transform that counts invocations and stamps content so its application
/// is observable in records.
#[derive(Debug, Default)]
pub struct CountingTransform {
    calls: AtomicUsize,
}

impl CountingTransform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transform for CountingTransform {
    fn name(&self) -> &str {
        "counting"
    }

    fn apply(&self, _id: &ModuleId, content: &str) -> Result<String, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("/* compiled */\n{content}"))
    }
}

/// Transform that always fails, for abort-path tests.
#[derive(Debug)]
pub struct FailingTransform;

impl Transform for FailingTransform {
    fn name(&self) -> &str {
        "failing"
    }

    fn apply(&self, id: &ModuleId, _content: &str) -> Result<String, TransformError> {
        Err(TransformError::failed("failing", format!("rejected {id}")))
    }
}

pub fn chain_of(transform: Arc<dyn Transform>) -> TransformChain {
    TransformChain::new(vec![transform])
}

pub fn id(path: &str) -> ModuleId {
    ModuleId::from_canonical(path).unwrap()
}

pub fn ids(records: &[ModuleRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

/// The `main -> a -> b` tree from the reference scenario, with bare
/// specifiers resolved relative to the referencing module.
pub fn scenario_runtime() -> TestRuntime {
    TestRuntime::new()
        .with_file("/app/main.js", "var a = require('a');\n")
        .with_file("/app/a.js", "var b = require('b');\n")
        .with_file("/app/b.js", "module.exports = 42;\n")
}
