//! Errors the harness reports to its caller.
//!
//! Faults raised by test logic never appear here; they become failure text on the case's
//! [`Outcome`](super::Outcome). What does appear are problems setting up or undoing a substitution, and
//! discovery requests that cannot be answered.

use miette::Diagnostic;
use thiserror::Error;

use crate::runtime::RegistryError;

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error("cannot discover class '{class}' without an owning module name")]
    #[diagnostic(
        code(gradecase::discovery::missing_module_name),
        help("pass the name of the module the class lives in")
    )]
    MissingModuleName { class: String },
}
