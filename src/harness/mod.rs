//! The harness: discovery, the case run contract with scoped substitution, and failure aggregation.
//!
//! ```text
//! source ──discover──▶ DiscoveredSet ──failures──▶ FailureSet
//!                          │
//!                          └── TestCase::run(&Substitution) ──▶ Outcome
//! ```

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod aggregate;
pub mod case;
pub mod discovery;
pub mod error;
pub mod substitute;

pub use aggregate::{FailureSet, failures, run_all};
pub use case::{Outcome, Payload, TestCase};
pub use discovery::{DiscoveredSet, DiscoveryOptions, Source, discover, discover_module};
pub use error::HarnessError;
pub use substitute::{
    FunctionPatch, FunctionSubstitution, ModuleSubstitution, ModuleSwap, Replacement, Substitution,
};
