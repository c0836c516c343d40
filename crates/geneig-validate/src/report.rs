//! Validation reports.

use std::fmt::Write;

use serde::Serialize;

use crate::error::Result;

/// One checked quantity.
///
/// Values are complex, stored as `[re, im]`; residual checks expect `[0, 0]`.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub name: String,
    pub expected: [f64; 2],
    pub actual: [f64; 2],
    pub error: f64,
    pub tolerance: f64,
    pub passed: bool,
}

impl Comparison {
    pub fn new(name: impl Into<String>, expected: [f64; 2], actual: [f64; 2], error: f64, tolerance: f64) -> Self {
        Self {
            name: name.into(),
            expected,
            actual,
            error,
            tolerance,
            passed: error <= tolerance,
        }
    }
}

/// Outcome of a validation run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub name: String,
    pub passed: bool,
    pub comparisons: Vec<Comparison>,
}

impl ValidationReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            comparisons: Vec::new(),
        }
    }

    pub fn add(&mut self, comparison: Comparison) {
        if !comparison.passed {
            log::debug!(
                "{}: {} failed (error {:.3e} > {:.3e})",
                self.name,
                comparison.name,
                comparison.error,
                comparison.tolerance
            );
        }
        self.passed &= comparison.passed;
        self.comparisons.push(comparison);
    }

    /// Append every comparison of `other`.
    pub fn merge(&mut self, other: ValidationReport) {
        for comparison in other.comparisons {
            self.add(comparison);
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &Comparison> {
        self.comparisons.iter().filter(|c| !c.passed)
    }

    /// Largest error over all comparisons.
    pub fn max_error(&self) -> f64 {
        self.comparisons.iter().map(|c| c.error).fold(0.0, f64::max)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let status = if self.passed { "PASSED" } else { "FAILED" };
        let _ = writeln!(out, "{}: {}", self.name, status);
        let _ = writeln!(
            out,
            "  {} comparisons, {} failed, max error {:.3e}",
            self.comparisons.len(),
            self.failures().count(),
            self.max_error()
        );

        for c in &self.comparisons {
            let mark = if c.passed { "ok  " } else { "FAIL" };
            let _ = writeln!(
                out,
                "  [{}] {:<14} expected {:>12.6} {:+.6}i  actual {:>12.6} {:+.6}i  error {:.3e}",
                mark, c.name, c.expected[0], c.expected[1], c.actual[0], c.actual[1], c.error
            );
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
