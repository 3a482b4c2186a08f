//! Convergence tracking for the EM loop.

use hmm_common::Diagnostic;
use serde::{Deserialize, Serialize};

/// Records the log-likelihood of each iteration's parameters and decides when
/// to stop.
///
/// Converged means either `n_iter` reports were made or the gain between the
/// last two reports is below `tol`. A decrease larger than
/// `regression_tolerance` is reported as a regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceMonitor {
    pub tol: f64,
    pub n_iter: usize,
    pub regression_tolerance: f64,
    history: Vec<f64>,
}

impl ConvergenceMonitor {
    pub fn new(tol: f64, n_iter: usize, regression_tolerance: f64) -> Self {
        Self {
            tol,
            n_iter,
            regression_tolerance,
            history: Vec::with_capacity(n_iter),
        }
    }

    /// Record one iteration. Returns a regression diagnostic when the
    /// log-likelihood dropped by more than the tolerance.
    pub fn report(&mut self, log_likelihood: f64) -> Option<Diagnostic> {
        let previous = self.history.last().copied();
        self.history.push(log_likelihood);
        match previous {
            Some(previous) if previous - log_likelihood > self.regression_tolerance => {
                Some(Diagnostic::ConvergenceRegression {
                    iteration: self.history.len() - 1,
                    previous,
                    current: log_likelihood,
                })
            }
            _ => None,
        }
    }

    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Gain of the most recent iteration.
    pub fn last_delta(&self) -> Option<f64> {
        match self.history.as_slice() {
            [.., a, b] => Some(b - a),
            _ => None,
        }
    }

    /// The gain fell below `tol`. Two impossible iterations in a row give a
    /// NaN gain, which never counts as converged.
    pub fn reached_tolerance(&self) -> bool {
        self.last_delta()
            .is_some_and(|delta| !delta.is_nan() && delta < self.tol)
    }

    pub fn converged(&self) -> bool {
        self.iterations() >= self.n_iter || self.reached_tolerance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_on_small_gain() {
        let mut monitor = ConvergenceMonitor::new(0.1, 100, 1e-8);
        assert!(monitor.report(-10.0).is_none());
        assert!(!monitor.converged());
        monitor.report(-9.0);
        assert!(!monitor.converged());
        monitor.report(-8.95);
        assert!(monitor.reached_tolerance());
        assert!(monitor.converged());
        assert_eq!(monitor.iterations(), 3);
    }

    #[test]
    fn stops_at_iteration_limit() {
        let mut monitor = ConvergenceMonitor::new(0.0, 2, 1e-8);
        monitor.report(-10.0);
        monitor.report(-5.0);
        assert!(monitor.converged());
        assert!(!monitor.reached_tolerance());
    }

    #[test]
    fn flags_regressions_beyond_tolerance() {
        let mut monitor = ConvergenceMonitor::new(1e-2, 10, 1e-6);
        monitor.report(-10.0);
        assert!(monitor.report(-10.0 - 1e-9).is_none());
        let diag = monitor.report(-11.0).unwrap();
        assert_eq!(
            diag,
            Diagnostic::ConvergenceRegression {
                iteration: 2,
                previous: -10.0 - 1e-9,
                current: -11.0
            }
        );
    }

    #[test]
    fn impossible_plateau_is_not_convergence() {
        let mut monitor = ConvergenceMonitor::new(1e-2, 3, 1e-6);
        assert!(monitor.report(f64::NEG_INFINITY).is_none());
        assert!(monitor.report(f64::NEG_INFINITY).is_none());
        assert!(monitor.last_delta().is_some_and(f64::is_nan));
        assert!(!monitor.reached_tolerance());
        assert!(!monitor.converged());
        monitor.report(f64::NEG_INFINITY);
        assert!(monitor.converged());
        assert!(!monitor.reached_tolerance());
    }
}
