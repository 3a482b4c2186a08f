//! Baum-Welch EM driver.
//!
//! Each iteration pools the expected counts of every sequence under the
//! current parameters, records that log-likelihood in the
//! [`ConvergenceMonitor`], then re-estimates. The loop stops at `n_iter`
//! iterations or once the gain drops below `tol`.

pub mod monitor;

pub use monitor::ConvergenceMonitor;

use crate::inference::categorical::resolve_n_symbols;
use crate::inference::emission::TrainableEmission;
use crate::inference::init::seeded_rng;
use crate::inference::model::{CategoricalHmm, Hmm};
use crate::logging::{event_names, generate_run_id, LogContext};
use chrono::{DateTime, Utc};
use hmm_common::{Diagnostic, Error, Implementation, ParamSet, Result};
use hmm_config::{validate_fit_config, FitConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Outcome of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub implementation: Implementation,
    pub params: ParamSet,
    /// Number of E-steps run.
    pub iterations: usize,
    /// Log-likelihood of the parameters entering each iteration.
    pub history: Vec<f64>,
    /// True when the gain fell below `tol` before the iteration limit.
    pub converged: bool,
    /// Log-likelihood of the fitted parameters.
    pub log_likelihood: f64,
    /// Distinct diagnostics raised during the run.
    pub diagnostics: Vec<Diagnostic>,
}

impl FitReport {
    pub fn has_regression(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_defect)
    }
}

/// Runs Baum-Welch under one validated [`FitConfig`].
#[derive(Debug, Clone)]
pub struct Trainer {
    config: FitConfig,
    context: LogContext,
}

fn push_unique(into: &mut Vec<Diagnostic>, diags: impl IntoIterator<Item = Diagnostic>) {
    for diag in diags {
        if !into.contains(&diag) {
            into.push(diag);
        }
    }
}

impl Trainer {
    pub fn new(config: FitConfig) -> Result<Self> {
        validate_fit_config(&config)?;
        Ok(Self {
            config,
            context: LogContext::new(generate_run_id()),
        })
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    pub fn run_id(&self) -> &str {
        &self.context.run_id
    }

    /// Train `model` in place, starting from its current parameters.
    pub fn fit<E: TrainableEmission>(
        &self,
        model: &mut Hmm<E>,
        sequences: &[&[E::Symbol]],
    ) -> Result<FitReport> {
        let config = &self.config;
        let run_id = self.context.run_id.as_str();
        model.set_implementation(config.implementation);
        model.check_batch(sequences)?;

        let started_at = Utc::now();
        info!(
            event = event_names::FIT_STARTED,
            run_id,
            n_states = model.n_states(),
            n_sequences = sequences.len(),
            n_iter = config.n_iter,
            tol = config.tol,
            implementation = %config.implementation,
            params = %config.params,
            "starting Baum-Welch"
        );

        let mut monitor =
            ConvergenceMonitor::new(config.tol, config.n_iter, config.regression_tolerance);
        let mut diagnostics = Vec::new();

        loop {
            let mut stats = model.new_stats();
            for seq in sequences {
                model.accumulate(&mut stats, seq)?;
            }
            let log_likelihood = stats.log_likelihood;
            push_unique(&mut diagnostics, std::mem::take(&mut stats.diagnostics));

            let unreached = model.reestimate(stats, config.params, config.empty_state_policy);
            push_unique(&mut diagnostics, unreached);

            if let Some(regression) = monitor.report(log_likelihood) {
                warn!(
                    event = event_names::FIT_REGRESSION,
                    run_id,
                    diagnostic = %regression,
                    "log-likelihood decreased"
                );
                if config.strict {
                    if let Diagnostic::ConvergenceRegression {
                        iteration,
                        previous,
                        current,
                    } = regression
                    {
                        return Err(Error::ConvergenceRegression {
                            iteration,
                            previous,
                            current,
                        });
                    }
                }
                diagnostics.push(regression);
            }

            debug!(
                event = event_names::FIT_ITERATION,
                run_id,
                iteration = monitor.iterations(),
                log_likelihood,
                delta = monitor.last_delta().unwrap_or(f64::NAN),
                "EM iteration"
            );

            if monitor.converged() {
                break;
            }
        }

        let mut final_stats = model.new_stats();
        for seq in sequences {
            model.accumulate(&mut final_stats, seq)?;
        }

        let report = FitReport {
            run_id: run_id.to_string(),
            started_at,
            implementation: config.implementation,
            params: config.params,
            iterations: monitor.iterations(),
            history: monitor.history().to_vec(),
            converged: monitor.reached_tolerance(),
            log_likelihood: final_stats.log_likelihood,
            diagnostics,
        };
        info!(
            event = event_names::FIT_CONVERGED,
            run_id,
            iterations = report.iterations,
            converged = report.converged,
            log_likelihood = report.log_likelihood,
            "Baum-Welch finished"
        );
        Ok(report)
    }

    /// Apply `init_params` to an existing categorical model, then train it.
    ///
    /// The model's symbol cardinality is fixed; a configured `n_symbols`
    /// must agree with it.
    pub fn fit_categorical(
        &self,
        model: &mut CategoricalHmm,
        sequences: &[&[usize]],
    ) -> Result<FitReport> {
        if let Some(n_symbols) = self.config.n_symbols {
            if n_symbols != model.n_symbols() {
                return Err(Error::Config(format!(
                    "n_symbols is {} but the model emits {} symbols",
                    n_symbols,
                    model.n_symbols()
                )));
            }
        }
        model.check_n_symbols(sequences)?;
        let mut rng = seeded_rng(self.config.seed);
        model.init_params(self.config.init_params, &mut rng);
        self.fit(model, sequences)
    }

    /// Build a model with `n_states` states from scratch and train it.
    ///
    /// The symbol cardinality is `n_symbols` from the config or, when absent,
    /// one more than the largest symbol in the data.
    pub fn fit_new(
        &self,
        n_states: usize,
        sequences: &[&[usize]],
    ) -> Result<(CategoricalHmm, FitReport)> {
        let n_symbols = resolve_n_symbols(self.config.n_symbols, sequences)?;
        let mut rng = seeded_rng(self.config.seed);
        let mut model =
            CategoricalHmm::initial(n_states, n_symbols, self.config.implementation, &mut rng)?;
        let report = self.fit(&mut model, sequences)?;
        Ok((model, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> Vec<Vec<usize>> {
        vec![
            vec![0, 0, 1, 2, 2, 2, 0, 1, 1, 2, 0, 0],
            vec![2, 2, 1, 0, 0, 0, 1],
        ]
    }

    #[test]
    fn history_is_non_decreasing() {
        let data = data();
        let seqs: Vec<&[usize]> = data.iter().map(Vec::as_slice).collect();
        for implementation in Implementation::ALL {
            let config = FitConfig {
                n_iter: 30,
                tol: 0.0,
                seed: Some(3),
                implementation,
                ..Default::default()
            };
            let (model, report) = Trainer::new(config).unwrap().fit_new(2, &seqs).unwrap();
            assert_eq!(report.iterations, 30);
            for pair in report.history.windows(2) {
                assert!(pair[1] >= pair[0] - 1e-8, "{:?}", pair);
            }
            assert!(report.log_likelihood >= *report.history.last().unwrap() - 1e-8);
            assert!(!report.has_regression());
            model.validate().unwrap();
        }
    }

    #[test]
    fn stops_early_on_tolerance() {
        let data = data();
        let seqs: Vec<&[usize]> = data.iter().map(Vec::as_slice).collect();
        let config = FitConfig {
            n_iter: 1000,
            tol: 1e-1,
            seed: Some(0),
            ..Default::default()
        };
        let (_, report) = Trainer::new(config).unwrap().fit_new(2, &seqs).unwrap();
        assert!(report.converged);
        assert!(report.iterations < 1000);
        assert!(report.run_id.starts_with("run-"));
    }

    #[test]
    fn seeded_fits_are_reproducible() {
        let data = data();
        let seqs: Vec<&[usize]> = data.iter().map(Vec::as_slice).collect();
        let config = FitConfig {
            seed: Some(11),
            ..Default::default()
        };
        let (a, _) = Trainer::new(config.clone()).unwrap().fit_new(3, &seqs).unwrap();
        let (b, _) = Trainer::new(config).unwrap().fit_new(3, &seqs).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = FitConfig {
            n_iter: 0,
            ..Default::default()
        };
        let err = Trainer::new(config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn configured_symbols_must_match_model() {
        let mut model = CategoricalHmm::initial(2, 3, Implementation::Log, &mut seeded_rng(Some(0)))
            .unwrap();
        let config = FitConfig {
            n_symbols: Some(4),
            ..Default::default()
        };
        let err = Trainer::new(config)
            .unwrap()
            .fit_categorical(&mut model, &[&[0, 1, 2]])
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn fixed_parameters_survive_training() {
        let mut model = CategoricalHmm::categorical(
            vec![0.6, 0.4],
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![vec![0.1, 0.4, 0.5], vec![0.6, 0.3, 0.1]],
            Implementation::Log,
        )
        .unwrap();
        let config = FitConfig {
            params: "e".parse().unwrap(),
            init_params: ParamSet::NONE,
            ..Default::default()
        };
        let data = data();
        let seqs: Vec<&[usize]> = data.iter().map(Vec::as_slice).collect();
        Trainer::new(config)
            .unwrap()
            .fit_categorical(&mut model, &seqs)
            .unwrap();
        assert_eq!(model.startprob(), &[0.6, 0.4]);
        assert_eq!(model.transmat()[1], vec![0.4, 0.6]);
    }

    #[test]
    fn impossible_batch_never_reports_finite_likelihood() {
        let mut model = CategoricalHmm::categorical(
            vec![1.0, 0.0],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            Implementation::Log,
        )
        .unwrap();
        let config = FitConfig {
            n_iter: 5,
            init_params: ParamSet::NONE,
            ..Default::default()
        };
        let report = Trainer::new(config)
            .unwrap()
            .fit_categorical(&mut model, &[&[0, 1]])
            .unwrap();
        assert_eq!(report.log_likelihood, f64::NEG_INFINITY);
        assert_eq!(report.iterations, 5);
        assert!(report.history.iter().all(|&ll| ll == f64::NEG_INFINITY));
        assert!(!report.converged);
        assert!(report
            .diagnostics
            .contains(&Diagnostic::ZeroLikelihood { sequence: 0 }));
    }
}
