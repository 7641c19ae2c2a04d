//! Framework-native suites and their structured results.
//!
//! A [`Suite`] is a pre-built list of test bodies that runs itself against a [`SuiteResult`]. Faults of
//! kind `AssertionError` are recorded as *failures*; any other fault is an *error*. Both keep the full
//! rendered trace.

use std::time::Duration;

use crate::runtime::Function;
use crate::timeout;

/// One test inside a suite.
#[derive(Clone, Debug)]
pub struct SuiteTest {
    pub id: String,
    pub body: Function,
}

#[derive(Clone, Debug, Default)]
pub struct Suite {
    tests: Vec<SuiteTest>,
}

impl Suite {
    pub fn new() -> Self {
        Self::default()
    }

    /// A suite holding exactly one test.
    pub fn single(id: impl Into<String>, body: Function) -> Self {
        Self::new().with_test(id, body)
    }

    pub fn with_test(mut self, id: impl Into<String>, body: Function) -> Self {
        self.push(id, body);
        self
    }

    pub fn push(&mut self, id: impl Into<String>, body: Function) {
        self.tests.push(SuiteTest { id: id.into(), body });
    }

    pub fn tests(&self) -> &[SuiteTest] {
        &self.tests
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Bound every test body by `limit`.
    pub fn with_timeout(self, limit: Duration) -> Self {
        Self {
            tests: self
                .tests
                .into_iter()
                .map(|test| SuiteTest {
                    id: test.id,
                    body: timeout::bound(test.body, limit),
                })
                .collect(),
        }
    }

    /// Run every test in order, recording into `result`.
    pub fn run(&self, result: &mut SuiteResult) {
        for test in &self.tests {
            result.tests_run += 1;
            match test.body.call(&[]) {
                Ok(_) => {}
                Err(fault) if fault.kind().is_failure() => {
                    result.failures.push((test.id.clone(), fault.render()));
                }
                Err(fault) => result.errors.push((test.id.clone(), fault.render())),
            }
        }
    }
}

/// What a suite run recorded: `(test id, rendered trace)` pairs in the order they happened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuiteResult {
    pub tests_run: usize,
    pub failures: Vec<(String, String)>,
    pub errors: Vec<(String, String)>,
}

impl SuiteResult {
    pub fn was_successful(&self) -> bool {
        self.failures.is_empty() && self.errors.is_empty()
    }

    /// Text of the first failure, or of the first error when there are no failures.
    pub fn first_problem(&self) -> Option<&str> {
        self.failures
            .first()
            .or_else(|| self.errors.first())
            .map(|(_, text)| text.as_str())
    }
}
