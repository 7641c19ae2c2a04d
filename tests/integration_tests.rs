//! Integration tests for discovery, case runs and aggregation over the demo catalog

use std::collections::BTreeSet;
use std::sync::Arc;

use gradecase::harness::{Replacement, discover};
use gradecase::runtime::Member;
use gradecase::{
    Class, DiscoveryOptions, FailureSet, Fault, Function, HarnessError, Outcome, Registry, RegistryError, Source,
    Substitution, Value, demo, discover_module, failures,
};

const FAIL_IDENTIFIER: &str = "_fails_";
const PASS_IDENTIFIER: &str = "_passes_";

fn catalog() -> Registry {
    let registry = Registry::new();
    demo::install(&registry);
    registry
}

fn names(items: &[&str]) -> FailureSet {
    items.iter().map(|s| s.to_string()).collect()
}

fn fixed_internal(registry: &Registry) -> Substitution {
    let correct = registry.resolve_function("correct_function.correct_function").unwrap();
    Substitution::none().with_function("example_tests.internal_buggy", correct)
}

fn swapped_external() -> Substitution {
    Substitution::none().with_module("buggy_function", "correct_function")
}

// =============================================================================
// Discovery
// =============================================================================

#[test]
fn test_plain_only_discovery() {
    let cases = discover_module(&catalog(), demo::EXAMPLE_TESTS, &DiscoveryOptions::plain()).unwrap();
    let keys: BTreeSet<_> = cases.keys().cloned().collect();
    assert_eq!(
        keys,
        names(&[
            "TestPytests.test_passes_external_buggy",
            "TestPytests.test_passes_internal_buggy",
            "TestPytests.test_fails_external_buggy",
            "TestPytests.test_fails_internal_buggy",
            "test_passes_external_buggy",
            "test_passes_internal_buggy",
            "test_fails_external_buggy",
            "test_fails_internal_buggy",
            "test_fails_external_sweep",
            "test_fails_internal_sweep",
        ])
    );
}

#[test]
fn test_native_only_discovery() {
    let cases = discover_module(&catalog(), demo::EXAMPLE_TESTS, &DiscoveryOptions::native()).unwrap();
    let keys: BTreeSet<_> = cases.keys().cloned().collect();
    assert_eq!(
        keys,
        names(&[
            "TestUnittests.test_passes_external_buggy",
            "TestUnittests.test_passes_internal_buggy",
            "TestUnittests.test_fails_external_buggy",
            "TestUnittests.test_fails_internal_buggy",
        ])
    );
}

#[test]
fn test_every_discovered_case_runs_as_named() {
    let cases = discover_module(&catalog(), demo::EXAMPLE_TESTS, &DiscoveryOptions::all()).unwrap();
    assert_eq!(cases.len(), 14);
    let mut checked = 0;
    for (name, case) in &cases {
        let outcome = case.run_plain().unwrap();
        if name.contains(PASS_IDENTIFIER) {
            checked += 1;
            assert_eq!(outcome.text(), "", "{name} should have passed but failed");
        }
        if name.contains(FAIL_IDENTIFIER) {
            checked += 1;
            assert!(!outcome.text().is_empty(), "{name} should have failed but passed");
        }
    }
    assert_eq!(checked, cases.len());
}

#[test]
fn test_discovering_a_class_directly() {
    let registry = catalog();
    let module = registry.import(demo::EXAMPLE_TESTS).unwrap();
    let Some(Member::Class(class)) = module.get("TestPytests") else {
        panic!("TestPytests missing");
    };
    let source = Source::Class(class);

    let cases = discover(&registry, &source, &DiscoveryOptions::plain(), Some(demo::EXAMPLE_TESTS)).unwrap();
    assert_eq!(cases.len(), 4);
    assert!(cases.values().all(|case| case.module() == demo::EXAMPLE_TESTS));

    let err = discover(&registry, &source, &DiscoveryOptions::plain(), None).unwrap_err();
    assert!(matches!(err, HarnessError::MissingModuleName { .. }));
}

// =============================================================================
// Scenarios
// =============================================================================

/// A module with one passing and one failing test discovers both and aggregates the failing one.
#[test]
fn test_scenario_pass_and_fail() {
    let registry = Registry::new();
    registry.define("scenario", |m| {
        m.def_test("test_a", || Ok(()));
        m.def_test("test_b", || gradecase_stdlib::check(false));
        Ok(())
    });
    let cases = discover_module(&registry, "scenario", &DiscoveryOptions::plain()).unwrap();
    assert_eq!(cases.keys().collect::<Vec<_>>(), ["test_a", "test_b"]);
    assert_eq!(failures(&cases, &Substitution::none()).unwrap(), names(&["test_b"]));
}

/// Methods of a test class are flattened under the class name.
#[test]
fn test_scenario_class_flattening() {
    let registry = Registry::new();
    registry.define("scenario", |m| {
        let class = Class::builder("TestFoo")
            .test("test_x", |_| Ok(()))
            .test("test_y", |_| Ok(()))
            .build();
        m.class("TestFoo", class);
        Ok(())
    });
    let cases = discover_module(&registry, "scenario", &DiscoveryOptions::plain()).unwrap();
    assert_eq!(cases.keys().collect::<Vec<_>>(), ["TestFoo.test_x", "TestFoo.test_y"]);
    assert_eq!(cases["TestFoo.test_x"].name(), "TestFoo.test_x");
}

/// Patching the helper a case calls flips its outcome for one run only.
#[test]
fn test_scenario_function_substitution_flips_outcome() {
    let registry = Registry::new();
    registry.define("scenario", |m| {
        m.def("helper", |_| Ok(Value::Int(0)));
        let g = m.globals();
        m.def_test("test_uses_helper", move || {
            gradecase_stdlib::check_eq(g.call("helper", &[])?, 42)
        });
        Ok(())
    });
    let cases = discover_module(&registry, "scenario", &DiscoveryOptions::plain()).unwrap();
    let case = &cases["test_uses_helper"];
    let fixed = Substitution::none().with_function("scenario.helper", Function::new("fixed", |_| Ok(Value::Int(42))));

    assert!(case.run_plain().unwrap().is_failed());
    assert_eq!(case.run(&fixed).unwrap(), Outcome::Passed);
    assert!(case.run_plain().unwrap().is_failed());
}

// =============================================================================
// Aggregation with substitutions
// =============================================================================

#[test]
fn test_failures_without_replacements() {
    let cases = discover_module(&catalog(), demo::EXAMPLE_TESTS, &DiscoveryOptions::all()).unwrap();
    assert_eq!(
        failures(&cases, &Substitution::none()).unwrap(),
        names(&[
            "TestPytests.test_fails_external_buggy",
            "TestPytests.test_fails_internal_buggy",
            "TestUnittests.test_fails_external_buggy",
            "TestUnittests.test_fails_internal_buggy",
            "test_fails_external_buggy",
            "test_fails_internal_buggy",
            "test_fails_external_sweep",
            "test_fails_internal_sweep",
        ])
    );
}

#[test]
fn test_failures_with_correct_internal() {
    let registry = catalog();
    let cases = discover_module(&registry, demo::EXAMPLE_TESTS, &DiscoveryOptions::all()).unwrap();
    assert_eq!(
        failures(&cases, &fixed_internal(&registry)).unwrap(),
        names(&[
            "TestPytests.test_fails_external_buggy",
            "TestUnittests.test_fails_external_buggy",
            "test_fails_external_buggy",
            "test_fails_external_sweep",
        ])
    );
}

#[test]
fn test_failures_with_correct_external() {
    let cases = discover_module(&catalog(), demo::EXAMPLE_TESTS, &DiscoveryOptions::all()).unwrap();
    assert_eq!(
        failures(&cases, &swapped_external()).unwrap(),
        names(&[
            "TestPytests.test_fails_internal_buggy",
            "TestUnittests.test_fails_internal_buggy",
            "test_fails_internal_buggy",
            "test_fails_internal_sweep",
        ])
    );
}

#[test]
fn test_failures_with_both_replacements() {
    let registry = catalog();
    let cases = discover_module(&registry, demo::EXAMPLE_TESTS, &DiscoveryOptions::all()).unwrap();
    let mut both = fixed_internal(&registry);
    both.module = swapped_external().module;
    assert!(failures(&cases, &both).unwrap().is_empty());
}

#[test]
fn test_delegating_replacement_can_call_original() {
    let registry = catalog();
    let cases = discover_module(&registry, demo::EXAMPLE_TESTS, &DiscoveryOptions::plain()).unwrap();
    // Halving the buggy result undoes the doubling.
    let halve = Replacement::delegating(|original, args| Ok(Value::Int(original.call(args)?.as_int()? / 2)));
    let substitution = Substitution::none().with_function("example_tests.internal_buggy", halve);
    assert!(cases["test_fails_internal_buggy"].run(&substitution).unwrap().is_passed());
    assert!(cases["test_fails_internal_sweep"].run(&substitution).unwrap().is_passed());
}

// =============================================================================
// Restoration
// =============================================================================

#[test]
fn test_module_swap_restores_original_by_identity() {
    let registry = catalog();
    let cases = discover_module(&registry, demo::EXAMPLE_TESTS, &DiscoveryOptions::all()).unwrap();
    let original = registry.get(demo::BUGGY_FUNCTION).unwrap();

    for (name, case) in &cases {
        case.run(&swapped_external()).unwrap();
        let registered = registry.get(demo::BUGGY_FUNCTION).unwrap();
        assert!(Arc::ptr_eq(&original, &registered), "{name} leaked the swapped module");
    }

    // The owning module was reloaded against the original again.
    let tests = registry.get(demo::EXAMPLE_TESTS).unwrap();
    assert_eq!(tests.call("external_buggy", &[Value::Int(3)]).unwrap(), Value::Int(6));
}

#[test]
fn test_module_swap_restores_after_faulting_case() {
    let registry = Registry::new();
    registry.define("dep", |m| {
        m.def("value", |_| Ok(Value::Int(1)));
        Ok(())
    });
    registry.define("dep_alt", |m| {
        m.def("value", |_| Ok(Value::Int(2)));
        Ok(())
    });
    registry.define("owner", |m| {
        m.import_from("dep", "value")?;
        m.def_test("test_panics", || {
            let empty: Vec<i64> = Vec::new();
            let _ = empty[1];
            Ok(())
        });
        m.def_test("test_raises", || Err(Fault::value_error("broken")));
        Ok(())
    });
    let cases = discover_module(&registry, "owner", &DiscoveryOptions::plain()).unwrap();
    let original = registry.get("dep").unwrap();
    let swap = Substitution::none().with_module("dep", "dep_alt");

    for case in cases.values() {
        let outcome = case.run(&swap).unwrap();
        assert!(outcome.is_failed());
        assert!(Arc::ptr_eq(&original, &registry.get("dep").unwrap()));
    }
}

#[test]
fn test_setup_errors_propagate() {
    let registry = catalog();
    let cases = discover_module(&registry, demo::EXAMPLE_TESTS, &DiscoveryOptions::plain()).unwrap();
    let case = &cases["test_passes_internal_buggy"];

    let missing_module = Substitution::none().with_module("never_loaded", "correct_function");
    assert!(matches!(
        case.run(&missing_module),
        Err(HarnessError::Registry(RegistryError::NotRegistered { .. }))
    ));

    let missing_symbol = Substitution::none().with_function(
        "example_tests.no_such_helper",
        Function::new("f", |_| Ok(Value::None)),
    );
    assert!(matches!(
        case.run(&missing_symbol),
        Err(HarnessError::Registry(RegistryError::AttributeNotFound { .. }))
    ));

    let missing_replacement = Substitution::none().with_module("buggy_function", "no_such_module");
    assert!(matches!(
        case.run(&missing_replacement),
        Err(HarnessError::Registry(RegistryError::ModuleNotFound { .. }))
    ));
    assert!(registry.is_loaded(demo::BUGGY_FUNCTION));
}

#[test]
fn test_panicking_replacement_module_leaves_registry_intact() {
    let registry = catalog();
    registry.define("buggy_function_broken", |m| {
        let helpers: Vec<i64> = Vec::new();
        m.value("FIRST", helpers[0]);
        Ok(())
    });
    let cases = discover_module(&registry, demo::EXAMPLE_TESTS, &DiscoveryOptions::plain()).unwrap();
    let original = registry.get(demo::BUGGY_FUNCTION).unwrap();
    let before = registry.loaded_names();

    let broken = Substitution::none().with_module(demo::BUGGY_FUNCTION, "buggy_function_broken");
    assert!(matches!(
        cases["test_passes_internal_buggy"].run(&broken),
        Err(HarnessError::Registry(RegistryError::Load { .. }))
    ));
    assert!(Arc::ptr_eq(&original, &registry.get(demo::BUGGY_FUNCTION).unwrap()));
    assert_eq!(registry.loaded_names(), before);
}

#[test]
fn test_swapped_runs_leave_registered_names_unchanged() {
    let registry = catalog();
    let cases = discover_module(&registry, demo::EXAMPLE_TESTS, &DiscoveryOptions::all()).unwrap();
    let before = registry.loaded_names();
    assert!(!before.contains(&demo::CORRECT_FUNCTION.to_string()));

    failures(&cases, &swapped_external()).unwrap();
    assert_eq!(registry.loaded_names(), before);
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_reruns_are_idempotent() {
    let registry = catalog();
    let cases = discover_module(&registry, demo::EXAMPLE_TESTS, &DiscoveryOptions::all()).unwrap();
    let passing = &cases["test_passes_external_buggy"];
    let failing = &cases["TestUnittests.test_fails_internal_buggy"];

    let first = failing.run_plain().unwrap();
    for _ in 0..3 {
        assert_eq!(passing.run_plain().unwrap(), Outcome::Passed);
        assert_eq!(failing.run_plain().unwrap(), first);
        failing.run(&swapped_external()).unwrap();
    }
}

#[test]
fn test_native_failure_text_is_rendered_trace() {
    let cases = discover_module(&catalog(), demo::EXAMPLE_TESTS, &DiscoveryOptions::native()).unwrap();
    let outcome = cases["TestUnittests.test_fails_internal_buggy"].run_plain().unwrap();
    insta::assert_snapshot!(outcome.text().trim_end(), @r"
    Traceback (most recent call last):
      in TestUnittests.test_fails_internal_buggy
    AssertionError: 4 != 2
    ");
}
