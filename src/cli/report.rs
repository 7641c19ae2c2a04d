//! Console reporting for `gradecase run`.

use std::time::Duration;

use crate::harness::Outcome;

/// Receives progress while cases run.
pub trait TestReporter {
    /// Called once discovery has produced the cases to run
    fn on_collection_complete(&mut self, case_count: usize);

    /// Called before a case runs
    fn on_case_start(&mut self, _name: &str) {}

    /// Called when a case has produced an outcome
    fn on_case_complete(&mut self, name: &str, outcome: &Outcome, elapsed: Duration);

    /// Called when all cases have completed
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// Summary of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &Outcome) {
        if outcome.is_passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// The closing `====== 3 passed, 1 failed in 0.01s ======` line, without colors.
    pub fn line(&self) -> String {
        let mut parts = Vec::new();
        if self.passed > 0 {
            parts.push(format!("{} passed", self.passed));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if parts.is_empty() {
            parts.push("no tests ran".to_string());
        }
        format!("====== {} in {:.2}s ======", parts.join(", "), self.duration.as_secs_f64())
    }
}

/// Default console reporter (pytest-style)
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TestReporter for ConsoleReporter {
    fn on_collection_complete(&mut self, case_count: usize) {
        if case_count == 0 {
            eprintln!("No tests collected");
        } else if self.verbose {
            eprintln!("collected {case_count} cases\n");
        }
    }

    fn on_case_start(&mut self, name: &str) {
        if self.verbose {
            eprint!("{name} ... ");
        }
    }

    fn on_case_complete(&mut self, name: &str, outcome: &Outcome, elapsed: Duration) {
        let status = match (outcome, self.verbose) {
            (Outcome::Passed, true) => format!("\x1b[32mPASSED\x1b[0m ({}ms)", elapsed.as_millis()),
            (Outcome::Passed, false) => "\x1b[32m.\x1b[0m".to_string(),
            (Outcome::Failed(_), true) => format!("\x1b[31mFAILED\x1b[0m ({}ms)", elapsed.as_millis()),
            (Outcome::Failed(_), false) => "\x1b[31mF\x1b[0m".to_string(),
        };

        if self.verbose {
            eprintln!("{status}");
        } else {
            eprint!("{status}");
        }

        // Print failure details
        if let Outcome::Failed(text) = outcome {
            eprintln!("\n\x1b[31m{name}\x1b[0m");
            eprintln!("{}", text.trim_end());
        }
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        if !self.verbose {
            eprintln!();
        }
        eprintln!();
        let color = if summary.failed > 0 { "\x1b[31m" } else { "\x1b[32m" };
        eprintln!("{color}{}\x1b[0m", summary.line());
    }
}
