//! Forward-backward recursion.
//!
//! Produces the forward (alpha) and backward (beta) lattices, the per-step
//! posterior state distribution (gamma) and the total log-likelihood of one
//! observation sequence. Written once against [`ProbabilitySpace`]; the model's
//! [`Implementation`] picks the concrete arithmetic at run time.
//!
//! Recursions, in probability form (the scaled representation additionally
//! divides every alpha row by its sum `c_t` and every beta row by `c_{t+1}`):
//!
//! ```text
//! alpha[0][i] = startprob[i] * b_i(o_0)
//! alpha[t][i] = sum_j alpha[t-1][j] * transmat[j][i] * b_i(o_t)
//! beta[T-1][i] = 1
//! beta[t][i]  = sum_j transmat[i][j] * b_j(o_{t+1}) * beta[t+1][j]
//! gamma[t][i] = alpha[t][i] * beta[t][i] / P(O)
//! ```

use crate::inference::emission::EmissionModel;
use crate::inference::model::Hmm;
use crate::inference::space::{LogSpace, ProbabilitySpace, Scaled};
use hmm_common::{Implementation, Result};
use tracing::trace;

/// Emission likelihoods for every step of a sequence, in one representation.
#[derive(Debug, Clone)]
pub struct FrameTable {
    /// `values[t][i]` ~ P(o_t | state i), possibly rescaled per row.
    pub values: Vec<Vec<f64>>,
    /// Sum of the log factors removed from the rows.
    pub log_offset: f64,
}

/// Model parameters and emissions mapped into one representation.
#[derive(Debug, Clone)]
pub(crate) struct Prepared {
    pub start: Vec<f64>,
    pub trans: Vec<Vec<f64>>,
    pub frames: FrameTable,
}

pub(crate) fn prepare<P: ProbabilitySpace, E: EmissionModel>(
    model: &Hmm<E>,
    observations: &[E::Symbol],
) -> Prepared {
    let n = model.n_states();
    let start = model.startprob().iter().map(|&p| P::from_prob(p)).collect();
    let trans = model
        .transmat()
        .iter()
        .map(|row| row.iter().map(|&p| P::from_prob(p)).collect())
        .collect();

    let mut log_offset = 0.0;
    let values = observations
        .iter()
        .map(|symbol| {
            let mut row = vec![0.0; n];
            model.emission().log_frame(symbol, &mut row);
            log_offset += P::from_log_row(&mut row);
            row
        })
        .collect();

    Prepared {
        start,
        trans,
        frames: FrameTable { values, log_offset },
    }
}

/// Result of one forward-backward pass.
///
/// `alpha` and `beta` are in the representation named by `implementation`
/// (plain scaled probabilities or log-probabilities); `posteriors` are always
/// plain probabilities.
#[derive(Debug, Clone)]
pub struct ForwardBackward {
    pub implementation: Implementation,
    /// log P(observations). NEG_INFINITY when the sequence is impossible.
    pub log_likelihood: f64,
    pub alpha: Vec<Vec<f64>>,
    pub beta: Vec<Vec<f64>>,
    /// `posteriors[t][i]` = P(state i at t | observations).
    pub posteriors: Vec<Vec<f64>>,
    /// Log of the per-step normalisers (all zero in log space).
    pub log_scales: Vec<f64>,
    pub frames: FrameTable,
}

impl ForwardBackward {
    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// True when every state path has zero probability.
    ///
    /// Posterior rows of a degenerate pass are all zero.
    pub fn is_degenerate(&self) -> bool {
        self.log_likelihood == f64::NEG_INFINITY
    }
}

/// Forward lattice and per-step log normalisers.
pub(crate) fn forward<P: ProbabilitySpace>(prepared: &Prepared) -> (Vec<Vec<f64>>, Vec<f64>) {
    let frames = &prepared.frames.values;
    let n = prepared.start.len();
    let steps = frames.len();
    let mut alpha = vec![vec![P::zero(); n]; steps];
    let mut log_scales = vec![0.0; steps];

    for (i, slot) in alpha[0].iter_mut().enumerate() {
        *slot = P::combine(prepared.start[i], frames[0][i]);
    }
    log_scales[0] = P::rescale(&mut alpha[0]);

    let mut terms = vec![P::zero(); n];
    for t in 1..steps {
        let (done, rest) = alpha.split_at_mut(t);
        let prev = &done[t - 1];
        let current = &mut rest[0];
        for (i, slot) in current.iter_mut().enumerate() {
            for (j, term) in terms.iter_mut().enumerate() {
                *term = P::combine(prev[j], prepared.trans[j][i]);
            }
            *slot = P::combine(P::marginalize(&terms), frames[t][i]);
        }
        log_scales[t] = P::rescale(current);
    }

    (alpha, log_scales)
}

/// Backward lattice, scaled with the forward normalisers.
pub(crate) fn backward<P: ProbabilitySpace>(
    prepared: &Prepared,
    log_scales: &[f64],
) -> Vec<Vec<f64>> {
    let frames = &prepared.frames.values;
    let n = prepared.start.len();
    let steps = frames.len();
    let mut beta = vec![vec![P::from_prob(1.0); n]; steps];

    let mut terms = vec![P::zero(); n];
    for t in (0..steps.saturating_sub(1)).rev() {
        let (head, tail) = beta.split_at_mut(t + 1);
        let next = &tail[0];
        let current = &mut head[t];
        for (i, slot) in current.iter_mut().enumerate() {
            for (j, term) in terms.iter_mut().enumerate() {
                *term = P::combine(
                    P::combine(prepared.trans[i][j], frames[t + 1][j]),
                    next[j],
                );
            }
            *slot = P::marginalize(&terms);
        }
        P::unscale(current, log_scales[t + 1]);
    }

    beta
}

/// Posterior state probabilities from the two lattices.
pub(crate) fn posteriors<P: ProbabilitySpace>(
    alpha: &[Vec<f64>],
    beta: &[Vec<f64>],
) -> Vec<Vec<f64>> {
    alpha
        .iter()
        .zip(beta)
        .map(|(a, b)| {
            let mut row: Vec<f64> = a.iter().zip(b).map(|(&x, &y)| P::combine(x, y)).collect();
            if P::normalize(&mut row) == f64::NEG_INFINITY {
                return vec![0.0; row.len()];
            }
            row.into_iter().map(P::to_prob).collect()
        })
        .collect()
}

/// Run the full pass in representation `P`. Inputs are assumed validated.
pub(crate) fn run<P: ProbabilitySpace, E: EmissionModel>(
    model: &Hmm<E>,
    observations: &[E::Symbol],
    implementation: Implementation,
) -> ForwardBackward {
    let prepared = prepare::<P, E>(model, observations);
    let (alpha, log_scales) = forward::<P>(&prepared);
    let beta = backward::<P>(&prepared, &log_scales);
    let posteriors = posteriors::<P>(&alpha, &beta);

    let last = alpha.last().map(|row| P::marginalize(row)).unwrap_or_else(P::zero);
    let log_likelihood =
        log_scales.iter().sum::<f64>() + P::to_log(last) + prepared.frames.log_offset;

    if log_likelihood.is_finite() {
        debug_assert!(
            posteriors
                .iter()
                .all(|row| (row.iter().sum::<f64>() - 1.0).abs() < 1e-8),
            "posterior rows must sum to one"
        );
    }

    trace!(
        space = P::NAME,
        steps = observations.len(),
        log_likelihood,
        "forward-backward pass"
    );

    ForwardBackward {
        implementation,
        log_likelihood,
        alpha,
        beta,
        posteriors,
        log_scales,
        frames: prepared.frames,
    }
}

/// Validate inputs and run the pass with the model's configured arithmetic.
pub fn forward_backward<E: EmissionModel>(
    model: &Hmm<E>,
    observations: &[E::Symbol],
) -> Result<ForwardBackward> {
    model.check_inputs(observations)?;
    Ok(dispatch(model, observations))
}

pub(crate) fn dispatch<E: EmissionModel>(
    model: &Hmm<E>,
    observations: &[E::Symbol],
) -> ForwardBackward {
    match model.implementation() {
        Implementation::Scaling => {
            run::<Scaled, E>(model, observations, Implementation::Scaling)
        }
        Implementation::Log => run::<LogSpace, E>(model, observations, Implementation::Log),
    }
}
