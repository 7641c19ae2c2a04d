#![forbid(unsafe_code)]
//! gradecase: a test-harness core for automated grading.
//!
//! Test logic is registered as modules on a [`Registry`]. The harness discovers the test cases in a module
//! or class, runs each one (optionally with a function patched or a whole module swapped for the duration
//! of the run) and reports which cases fail.
//!
//! ```no_run
//! use gradecase::{DiscoveryOptions, Registry, Substitution, demo, discover_module, failures};
//!
//! let registry = Registry::global();
//! demo::install(&registry);
//! let cases = discover_module(&registry, "example_tests", &DiscoveryOptions::all())?;
//! let swapped = Substitution::none().with_module("buggy_function", "correct_function");
//! for name in failures(&cases, &swapped)? {
//!     println!("{name}");
//! }
//! # Ok::<(), gradecase::HarnessError>(())
//! ```
//!
//! ## Panic Policy
//!
//! - **Library code**: errors are `Result`s propagated with `?`. The `harness` and `cli` modules enforce
//!   `#![deny(clippy::unwrap_used)]`.
//! - **Test logic**: a panic inside a runtime function is caught at the function boundary and becomes a fault,
//!   so a panicking test is a failing test, not a crashed harness. A panicking module loader is a load error.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod demo;
pub mod harness;
pub mod runtime;
pub mod suite;
pub mod timeout;

pub use gradecase_core::{Conventions, Fault, FaultKind, Value};

pub use harness::{
    DiscoveredSet, DiscoveryOptions, FailureSet, HarnessError, Outcome, Payload, Source, Substitution, TestCase,
    discover, discover_module, failures, run_all,
};
pub use runtime::{Class, Function, Module, Registry, RegistryError};
pub use suite::{Suite, SuiteResult};
