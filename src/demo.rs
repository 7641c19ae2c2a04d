//! A small grading catalog used by the binary and the integration tests.
//!
//! `example_tests` checks two helpers that should return their input unchanged but double it instead:
//! `internal_buggy`, defined in the test module itself, and `external_buggy`, imported from
//! `buggy_function`. Every test is written three ways (plain function, method of a plain test class,
//! method of a framework-native test class), and each has a `passes` variant (input 0, where the bug
//! is invisible) and a `fails` variant.
//!
//! `correct_function` is a drop-in replacement for `buggy_function`; its `correct_function` is a fixed
//! stand-in for `example_tests.internal_buggy`.

use gradecase_core::{Fault, Value};
use gradecase_stdlib::check_eq;

use crate::runtime::{Class, ClassBuilder, Globals, Instance, Registry, arg};

pub const EXAMPLE_TESTS: &str = "example_tests";
pub const BUGGY_FUNCTION: &str = "buggy_function";
pub const CORRECT_FUNCTION: &str = "correct_function";

/// Inputs the sweep tests check, inclusive.
const SWEEP: std::ops::RangeInclusive<i64> = 0..=20;

/// Define the catalog modules on `registry`. Nothing is imported until first use.
pub fn install(registry: &Registry) {
    registry.define(BUGGY_FUNCTION, |m| {
        m.def("external_buggy", |args| {
            Ok(Value::Int(arg("external_buggy", args, 0)?.as_int()? * 2))
        });
        Ok(())
    });

    registry.define(CORRECT_FUNCTION, |m| {
        m.def("external_buggy", |args| Ok(arg("external_buggy", args, 0)?.clone()));
        m.def("correct_function", |args| Ok(arg("correct_function", args, 0)?.clone()));
        Ok(())
    });

    registry.define(EXAMPLE_TESTS, |m| {
        m.import_from(BUGGY_FUNCTION, "external_buggy")?;
        m.def("internal_buggy", |args| {
            Ok(Value::Int(2 * arg("internal_buggy", args, 0)?.as_int()?))
        });

        let g = m.globals();
        m.class("TestPytests", test_class("TestPytests", &g).build());
        m.class("TestUnittests", test_class("TestUnittests", &g).framework().build());

        for (helper, input, name) in CASES {
            m.def_test(name, returns_input(g.clone(), helper, input));
        }
        m.def_test("test_fails_external_sweep", sweep(g.clone(), "external_buggy"));
        m.def_test("test_fails_internal_sweep", sweep(g, "internal_buggy"));
        Ok(())
    });
}

/// `(helper, input, test name)`; input 0 passes against the buggy helpers, 2 does not.
const CASES: [(&str, i64, &str); 4] = [
    ("external_buggy", 0, "test_passes_external_buggy"),
    ("internal_buggy", 0, "test_passes_internal_buggy"),
    ("external_buggy", 2, "test_fails_external_buggy"),
    ("internal_buggy", 2, "test_fails_internal_buggy"),
];

fn test_class(name: &str, g: &Globals) -> ClassBuilder {
    CASES.iter().fold(Class::builder(name), |class, &(helper, input, test)| {
        let body = returns_input(g.clone(), helper, input);
        class.test(test, move |_: &Instance| body())
    })
}

/// A test asserting `helper(input) == input`, resolving `helper` when it runs.
fn returns_input(g: Globals, helper: &'static str, input: i64) -> impl Fn() -> Result<(), Fault> + Send + Sync + 'static {
    move || check_eq(g.call(helper, &[Value::Int(input)])?, input)
}

fn sweep(g: Globals, helper: &'static str) -> impl Fn() -> Result<(), Fault> + Send + Sync + 'static {
    move || {
        for input in SWEEP {
            check_eq(g.call(helper, &[Value::Int(input)])?, input)?;
        }
        Ok(())
    }
}
