#![allow(
    clippy::expect_used,
    reason = "test helpers use expect for descriptive failures"
)]

//! Shared helpers for integration tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use girder::graph::{ModelArgs, ModelTarget, NativeTarget, OpaqueTarget, TargetNode};
use girder::rules::{
    CompilationDatabaseSpec, DerivedRule, FactoryError, RuleFactory, RuleHandle,
    SymlinkTreeRule, SymlinkTreeSpec,
};
use girder::target::TargetId;

pub fn id(name: &str) -> TargetId {
    TargetId::new("//test", name)
}

pub fn model_id(name: &str) -> TargetId {
    TargetId::new("//models", name)
}

pub fn native(name: &str, deps: &[&TargetId]) -> TargetNode {
    TargetNode::Native(NativeTarget::new(
        id(name),
        deps.iter().map(|dep| (*dep).clone()),
    ))
}

pub fn opaque(name: &str, deps: &[&TargetId]) -> TargetNode {
    TargetNode::Opaque(OpaqueTarget::new(
        id(name),
        deps.iter().map(|dep| (*dep).clone()),
    ))
}

pub fn model(name: &str, args: ModelArgs) -> TargetNode {
    TargetNode::Model(ModelTarget::new(model_id(name), [], args))
}

/// A stand-in compilation-database handle that remembers its spec.
pub struct FakeDatabaseRule {
    pub spec: CompilationDatabaseSpec,
}

impl DerivedRule for FakeDatabaseRule {
    fn target(&self) -> &TargetId {
        &self.spec.target
    }
}

/// External factory double that counts invocations.
#[derive(Default)]
pub struct RecordingFactory {
    pub symlink_calls: AtomicUsize,
    pub symlink_specs: Mutex<Vec<SymlinkTreeSpec>>,
    pub database_specs: Mutex<Vec<CompilationDatabaseSpec>>,
    pub fail_symlinks: bool,
}

impl RecordingFactory {
    pub fn failing() -> Self {
        Self {
            fail_symlinks: true,
            ..Self::default()
        }
    }

    pub fn symlink_calls(&self) -> usize {
        self.symlink_calls.load(Ordering::SeqCst)
    }

    pub fn last_database_spec(&self) -> CompilationDatabaseSpec {
        self.database_specs
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .expect("a compilation database was materialised")
    }

    pub fn last_symlink_spec(&self) -> SymlinkTreeSpec {
        self.symlink_specs
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .expect("a symlink tree was materialised")
    }
}

impl RuleFactory for RecordingFactory {
    fn symlink_tree(&self, spec: SymlinkTreeSpec) -> Result<RuleHandle, FactoryError> {
        if self.fail_symlinks {
            return Err(FactoryError::Materialise {
                target: spec.target.clone(),
                source: "injected failure".into(),
            });
        }
        self.symlink_calls.fetch_add(1, Ordering::SeqCst);
        self.symlink_specs.lock().expect("lock").push(spec.clone());
        Ok(Arc::new(SymlinkTreeRule::new(spec)))
    }

    fn compilation_database(
        &self,
        spec: CompilationDatabaseSpec,
    ) -> Result<RuleHandle, FactoryError> {
        self.database_specs.lock().expect("lock").push(spec.clone());
        Ok(Arc::new(FakeDatabaseRule { spec }))
    }
}
