//! Helpers for test logic and helper functions run under the gradecase harness.
//!
//! Test bodies are runtime functions returning `Result<Value, Fault>`; the helpers here build the canonical
//! faults so a failing check reads the same whether it came from a plain test function or a
//! framework-native test method.

#![deny(clippy::unwrap_used)]

pub mod errors;
pub mod testing;

pub use testing::{check, check_eq, check_false, check_ne, check_true, fail};
