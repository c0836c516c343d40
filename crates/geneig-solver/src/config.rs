//! Solver configuration.

/// Sweeps allowed per unit of matrix order before the QZ iteration gives up.
pub const SWEEPS_PER_ORDER: usize = 30;

/// Unsuccessful sweeps on one block before the ad hoc shift replaces the
/// computed shifts.
pub const AD_HOC_SHIFT_AFTER: usize = 10;

/// Third component of the ad hoc double-shift vector `(0, 1, AD_HOC_SHIFT)`.
pub const AD_HOC_SHIFT: f64 = 1.1605;

/// Configuration for a generalized eigenvalue decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig<T> {
    /// Accumulate the right-hand transformations and back-substitute for
    /// eigenvectors. When false, no transformation matrix is allocated.
    pub compute_eigenvectors: bool,
    /// Relative tolerance for negligible elements. `None` (or a non-positive
    /// value) uses the unit round-off of `T`.
    pub tolerance: Option<T>,
    /// Sweep budget. `None` uses `SWEEPS_PER_ORDER * n`.
    pub max_sweeps: Option<usize>,
}

impl<T> Default for SolverConfig<T> {
    fn default() -> Self {
        Self {
            compute_eigenvectors: true,
            tolerance: None,
            max_sweeps: None,
        }
    }
}

impl<T> SolverConfig<T> {
    /// Configuration that computes eigenvalues only.
    pub fn eigenvalues_only() -> Self {
        Self {
            compute_eigenvectors: false,
            ..Default::default()
        }
    }

    /// Set the negligibility tolerance.
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Set the sweep budget.
    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> Self {
        self.max_sweeps = Some(max_sweeps);
        self
    }

    /// Sweep budget for a pencil of order `n`.
    pub fn sweep_budget(&self, n: usize) -> usize {
        self.max_sweeps.unwrap_or(SWEEPS_PER_ORDER * n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::<f64>::default();
        assert!(config.compute_eigenvectors);
        assert_eq!(config.tolerance, None);
        assert_eq!(config.sweep_budget(4), 120);
    }

    #[test]
    fn test_solver_config_builders() {
        let config = SolverConfig::<f64>::eigenvalues_only()
            .with_tolerance(1e-10)
            .with_max_sweeps(7);
        assert!(!config.compute_eigenvectors);
        assert_eq!(config.tolerance, Some(1e-10));
        assert_eq!(config.sweep_budget(100), 7);
    }
}
