//! Running a whole discovered set.

use std::collections::{BTreeMap, BTreeSet};

use super::case::Outcome;
use super::discovery::DiscoveredSet;
use super::error::HarnessError;
use super::substitute::Substitution;

/// Names of the cases that did not pass.
pub type FailureSet = BTreeSet<String>;

/// Run every case under the same substitution and keep each outcome.
///
/// Each run restores its substitutions before the next starts, so cases do not observe each other.
#[tracing::instrument(skip_all, fields(cases = cases.len()))]
pub fn run_all(
    cases: &DiscoveredSet,
    substitution: &Substitution,
) -> Result<BTreeMap<String, Outcome>, HarnessError> {
    cases
        .iter()
        .map(|(name, case)| Ok((name.clone(), case.run(substitution)?)))
        .collect()
}

/// The names in `cases` whose run under `substitution` failed.
pub fn failures(cases: &DiscoveredSet, substitution: &Substitution) -> Result<FailureSet, HarnessError> {
    let failed: FailureSet = run_all(cases, substitution)?
        .into_iter()
        .filter_map(|(name, outcome)| outcome.is_failed().then_some(name))
        .collect();
    tracing::debug!(failed = failed.len(), "aggregated failures");
    Ok(failed)
}
