//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::time::{Duration, Instant};

use crate::harness::{DiscoveredSet, Substitution, discover_module};
use crate::runtime::Registry;

use super::report::{ConsoleReporter, RunSummary, TestReporter};
use super::{CliError, CliResult, DiscoveryArgs, ExitCode};

/// Everything `gradecase run` was asked to do.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub discovery: DiscoveryArgs,
    pub mock: Option<(String, String)>,
    pub replace_module: Option<(String, String)>,
    pub timeout: Option<f64>,
    pub filter: Option<String>,
    pub verbose: bool,
}

fn discover_cases(registry: &Registry, args: &DiscoveryArgs) -> CliResult<DiscoveredSet> {
    discover_module(registry, &args.module, &args.options()).map_err(CliError::diagnostic)
}

/// Print the qualified name of every discovered case, one per line.
pub fn list_cases(registry: &Registry, args: &DiscoveryArgs) -> CliResult<ExitCode> {
    let cases = discover_cases(registry, args)?;
    for name in cases.keys() {
        println!("{name}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Turn the request's flags into a substitution, resolving the mock replacement by path.
pub fn build_substitution(registry: &Registry, request: &RunRequest) -> CliResult<Substitution> {
    let mut substitution = Substitution::none();
    if let Some((target, replacement)) = &request.mock {
        let function = registry
            .resolve_function(replacement)
            .map_err(CliError::diagnostic)?;
        substitution = substitution.with_function(target.as_str(), function);
    }
    if let Some((target, replacement)) = &request.replace_module {
        substitution = substitution.with_module(target.as_str(), replacement.as_str());
    }
    Ok(substitution)
}

/// Run the discovered cases and report them. Exits with failure when any case failed.
pub fn run_cases(registry: &Registry, request: &RunRequest) -> CliResult<ExitCode> {
    let substitution = build_substitution(registry, request)?;
    let cases = discover_cases(registry, &request.discovery)?;
    let limit = request.timeout.map(Duration::from_secs_f64);

    let mut reporter = ConsoleReporter::new(request.verbose);
    let selected: Vec<_> = cases
        .into_iter()
        .filter(|(name, _)| request.filter.as_deref().is_none_or(|expr| name.contains(expr)))
        .collect();
    reporter.on_collection_complete(selected.len());

    let started = Instant::now();
    let mut summary = RunSummary::default();
    for (name, case) in selected {
        let case = match limit {
            Some(limit) => case.with_timeout(limit),
            None => case,
        };
        reporter.on_case_start(&name);
        let case_started = Instant::now();
        let outcome = case.run(&substitution).map_err(CliError::diagnostic)?;
        reporter.on_case_complete(&name, &outcome, case_started.elapsed());
        summary.record(&outcome);
    }
    summary.duration = started.elapsed();
    reporter.on_run_complete(&summary);

    if summary.failed > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::demo;
    use crate::harness::Replacement;

    fn request(mock: Option<(&str, &str)>, replace_module: Option<(&str, &str)>) -> RunRequest {
        let pair = |(a, b): (&str, &str)| (a.to_string(), b.to_string());
        RunRequest {
            discovery: DiscoveryArgs {
                module: demo::EXAMPLE_TESTS.to_string(),
                native: false,
                plain: false,
            },
            mock: mock.map(pair),
            replace_module: replace_module.map(pair),
            timeout: None,
            filter: None,
            verbose: false,
        }
    }

    #[test]
    fn test_build_substitution_resolves_mock() {
        let registry = Registry::new();
        demo::install(&registry);
        let substitution = build_substitution(
            &registry,
            &request(
                Some(("example_tests.internal_buggy", "correct_function.correct_function")),
                Some(("buggy_function", "correct_function")),
            ),
        )
        .unwrap();
        let function = substitution.function.unwrap();
        assert_eq!(function.target, "example_tests.internal_buggy");
        assert!(matches!(function.replacement, Replacement::Function(ref f) if f.name() == "correct_function.correct_function"));
        assert_eq!(substitution.module.unwrap().replacement, "correct_function");
    }

    #[test]
    fn test_build_substitution_unknown_replacement() {
        let registry = Registry::new();
        demo::install(&registry);
        let err = build_substitution(&registry, &request(Some(("example_tests.internal_buggy", "nowhere.f")), None))
            .unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert!(err.message.contains("nowhere"));
    }

    #[test]
    fn test_run_cases_exit_code_follows_failures() {
        let registry = Registry::new();
        demo::install(&registry);
        let failing = run_cases(&registry, &request(None, None)).unwrap();
        assert_eq!(failing, ExitCode::FAILURE);

        let mut passing = request(None, None);
        passing.filter = Some("passes".to_string());
        assert_eq!(run_cases(&registry, &passing).unwrap(), ExitCode::SUCCESS);
    }
}
