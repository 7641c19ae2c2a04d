//! Assertion helpers for test bodies.
//!
//! Each helper returns `Ok(())` when the check holds and an `AssertionError` fault otherwise, so test
//! bodies chain them with `?`.

use gradecase_core::{Fault, Value};

/// Check that a condition is true.
pub fn check(condition: bool) -> Result<(), Fault> {
    if condition {
        Ok(())
    } else {
        Err(Fault::assertion("assertion failed"))
    }
}

/// Check that two values are equal.
pub fn check_eq(left: impl Into<Value>, right: impl Into<Value>) -> Result<(), Fault> {
    let (left, right) = (left.into(), right.into());
    if left == right {
        Ok(())
    } else {
        Err(Fault::assertion(format!("{} != {}", left.repr(), right.repr())))
    }
}

/// Check that two values differ.
pub fn check_ne(left: impl Into<Value>, right: impl Into<Value>) -> Result<(), Fault> {
    let (left, right) = (left.into(), right.into());
    if left != right {
        Ok(())
    } else {
        Err(Fault::assertion(format!("{} == {}", left.repr(), right.repr())))
    }
}

/// Check that a value is truthy.
pub fn check_true(value: impl Into<Value>) -> Result<(), Fault> {
    let value = value.into();
    if value.is_truthy() {
        Ok(())
    } else {
        Err(Fault::assertion(format!("{} is not true", value.repr())))
    }
}

/// Check that a value is falsy.
pub fn check_false(value: impl Into<Value>) -> Result<(), Fault> {
    let value = value.into();
    if value.is_truthy() {
        Err(Fault::assertion(format!("{} is not false", value.repr())))
    } else {
        Ok(())
    }
}

/// Fail unconditionally with `msg`.
pub fn fail<T>(msg: impl Into<String>) -> Result<T, Fault> {
    Err(Fault::assertion(msg))
}
