//! Provide the shared, dependency-free vocabulary of the gradecase harness.
//!
//! Both the harness (`gradecase`) and the helpers test authors call (`gradecase_stdlib`) speak in these
//! types, so the text a failing case produces is the same no matter which side raised it.
//!
//! ## Notes
//!
//! - **No IO** and no global state live here.
//! - [`Fault`] is the runtime's raised error. It accumulates a trace while it unwinds through runtime
//!   functions and renders as a traceback-style block of text.
//! - [`Conventions`] holds the naming rules discovery keys off (`test` / `Test` prefixes, `.` separator).

pub mod conventions;
pub mod faults;
pub mod value;

pub use conventions::Conventions;
pub use faults::{Fault, FaultKind, Frame};
pub use value::Value;
