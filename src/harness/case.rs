//! One discovered test case and its run contract.

use std::fmt;
use std::time::Duration;

use crate::runtime::{Function, Registry};
use crate::suite::{Suite, SuiteResult};
use crate::timeout;

use super::error::HarnessError;
use super::substitute::{FunctionPatch, ModuleSwap, Substitution};

/// What a case runs. Decided once, at discovery.
#[derive(Clone, Debug)]
pub enum Payload {
    /// A zero-argument callable; any fault it raises is a failure.
    Callable(Function),
    /// A framework-native suite that records its own failures and errors.
    Suite(Suite),
}

/// Result of one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    /// Carries the rendered trace of the first problem.
    Failed(String),
}

impl Outcome {
    /// Failure text, empty for a pass.
    pub fn text(&self) -> &str {
        match self {
            Outcome::Passed => "",
            Outcome::Failed(text) => text,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    pub fn is_failed(&self) -> bool {
        !self.is_passed()
    }
}

/// A discovered, independently runnable test case.
///
/// Cases keep no history between runs, so running one again with the same substitution gives the same
/// outcome for deterministic test logic.
#[derive(Clone)]
pub struct TestCase {
    name: String,
    payload: Payload,
    /// Module the case lives in; reloaded around a module swap.
    module: String,
    registry: Registry,
}

impl TestCase {
    pub fn new(name: impl Into<String>, payload: Payload, module: impl Into<String>, registry: Registry) -> Self {
        Self {
            name: name.into(),
            payload,
            module: module.into(),
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bound every call the case makes into its test logic by `limit`.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.payload = match self.payload {
            Payload::Callable(function) => Payload::Callable(timeout::bound(function, limit)),
            Payload::Suite(suite) => Payload::Suite(suite.with_timeout(limit)),
        };
        self
    }

    /// Run the case once under `substitution`.
    ///
    /// The module swap (if any) is acquired first, so the owning module has been reloaded against the
    /// replacement before a function patch resolves its target. Both are released before returning, on
    /// every path. Errors are setup or restoration problems only; faults from the test logic come back as
    /// [`Outcome::Failed`].
    #[tracing::instrument(skip_all, fields(case = %self.name, module = %self.module))]
    pub fn run(&self, substitution: &Substitution) -> Result<Outcome, HarnessError> {
        let swap = substitution
            .module
            .as_ref()
            .map(|module| ModuleSwap::acquire(&self.registry, module, &self.module))
            .transpose()?;
        let patch = substitution
            .function
            .as_ref()
            .map(|function| FunctionPatch::apply(&self.registry, function))
            .transpose()?;

        let outcome = self.invoke();

        if let Some(patch) = patch {
            patch.release();
        }
        if let Some(swap) = swap {
            swap.release()?;
        }
        tracing::debug!(passed = outcome.is_passed(), "case finished");
        Ok(outcome)
    }

    /// Run with no substitution.
    pub fn run_plain(&self) -> Result<Outcome, HarnessError> {
        self.run(&Substitution::none())
    }

    fn invoke(&self) -> Outcome {
        match &self.payload {
            Payload::Suite(suite) => {
                let mut result = SuiteResult::default();
                suite.run(&mut result);
                match result.first_problem() {
                    Some(text) => Outcome::Failed(text.to_string()),
                    None => Outcome::Passed,
                }
            }
            Payload::Callable(function) => match function.call(&[]) {
                Ok(_) => Outcome::Passed,
                Err(fault) => Outcome::Failed(fault.render()),
            },
        }
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("payload", &self.payload)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}
