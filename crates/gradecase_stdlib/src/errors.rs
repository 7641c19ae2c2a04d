//! Raise helpers for helper and student functions.
//!
//! `gradecase_core` owns the fault taxonomy and its text. These helpers build the faults with canonical
//! `Kind: message` formatting, either as an `Err` for code that returns `Result`, or as a panic for code
//! that cannot (the runtime converts a panic back into a fault at the next call boundary).

use core::fmt;
use core::fmt::Write as _;

use gradecase_core::{Fault, FaultKind};

/// Return `Err(fault)`.
#[cold]
pub fn raise<T>(fault: Fault) -> Result<T, Fault> {
    Err(fault)
}

/// Return `Err` with a `kind` fault whose message is built from `msg`.
#[cold]
pub fn raise_kind_fmt<T>(kind: FaultKind, msg: fmt::Arguments<'_>) -> Result<T, Fault> {
    Err(Fault::new(kind, msg.to_string()))
}

/// Format a canonical `Kind: ...` string without building a fault.
pub fn error_string_kind_fmt(kind: FaultKind, msg: fmt::Arguments<'_>) -> String {
    let mut out = String::with_capacity(kind.as_str().len() + 2 + 64);
    // Writing to String cannot fail.
    let _ = write!(&mut out, "{}: {}", kind.as_str(), msg);
    out
}

/// Raise a `ValueError`.
#[cold]
pub fn raise_value_error<T>(msg: &str) -> Result<T, Fault> {
    raise(Fault::value_error(msg))
}

/// Raise a `TypeError`.
#[cold]
pub fn raise_type_error<T>(msg: &str) -> Result<T, Fault> {
    raise(Fault::type_error(msg))
}

/// Panic with the canonical text of `kind` and `msg`.
#[cold]
#[track_caller]
pub fn panic_kind(kind: FaultKind, msg: &str) -> ! {
    panic!("{}", error_string_kind_fmt(kind, format_args!("{msg}")));
}
