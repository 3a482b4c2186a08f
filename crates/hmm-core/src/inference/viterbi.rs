//! Viterbi decoding: the single most probable state path.
//!
//! Runs in the same representation as the forward pass. In the scaled form
//! each delta row is renormalised and the removed log factor is added to the
//! path score, which leaves every argmax untouched.

use crate::inference::emission::EmissionModel;
use crate::inference::forward_backward::{prepare, Prepared};
use crate::inference::model::Hmm;
use crate::inference::space::{LogSpace, ProbabilitySpace, Scaled};
use hmm_common::{Implementation, Result};
use hmm_math::max_with_index;

/// Best path and its joint log-probability log P(path, observations).
#[derive(Debug, Clone, PartialEq)]
pub struct ViterbiPath {
    pub log_probability: f64,
    pub states: Vec<usize>,
}

pub(crate) fn run<P: ProbabilitySpace>(prepared: &Prepared) -> ViterbiPath {
    let frames = &prepared.frames.values;
    let n = prepared.start.len();
    let steps = frames.len();

    let mut delta: Vec<f64> = (0..n)
        .map(|i| P::combine(prepared.start[i], frames[0][i]))
        .collect();
    let mut log_scale = P::rescale(&mut delta);
    let mut backpointers = vec![vec![0usize; n]; steps];
    let mut next = vec![P::zero(); n];
    let mut terms = vec![P::zero(); n];

    for t in 1..steps {
        for (i, slot) in next.iter_mut().enumerate() {
            for (j, term) in terms.iter_mut().enumerate() {
                *term = P::combine(delta[j], prepared.trans[j][i]);
            }
            let (best, value) = max_with_index(&terms).unwrap_or((0, P::zero()));
            backpointers[t][i] = best;
            *slot = P::combine(value, frames[t][i]);
        }
        std::mem::swap(&mut delta, &mut next);
        log_scale += P::rescale(&mut delta);
    }

    let (last, best) = max_with_index(&delta).unwrap_or((0, P::zero()));
    let log_probability = log_scale + P::to_log(best) + prepared.frames.log_offset;

    let mut states = vec![0usize; steps];
    states[steps - 1] = last;
    for t in (1..steps).rev() {
        states[t - 1] = backpointers[t][states[t]];
    }

    ViterbiPath {
        log_probability,
        states,
    }
}

/// Validate inputs and decode with the model's configured arithmetic.
pub fn viterbi<E: EmissionModel>(model: &Hmm<E>, observations: &[E::Symbol]) -> Result<ViterbiPath> {
    model.check_inputs(observations)?;
    Ok(dispatch(model, observations))
}

pub(crate) fn dispatch<E: EmissionModel>(
    model: &Hmm<E>,
    observations: &[E::Symbol],
) -> ViterbiPath {
    match model.implementation() {
        Implementation::Scaling => run::<Scaled>(&prepare::<Scaled, E>(model, observations)),
        Implementation::Log => run::<LogSpace>(&prepare::<LogSpace, E>(model, observations)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::model::CategoricalHmm;

    fn weather(implementation: Implementation) -> CategoricalHmm {
        CategoricalHmm::categorical(
            vec![0.6, 0.4],
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![vec![0.1, 0.4, 0.5], vec![0.6, 0.3, 0.1]],
            implementation,
        )
        .unwrap()
    }

    #[test]
    fn decodes_reference_path() {
        for implementation in Implementation::ALL {
            let path = viterbi(&weather(implementation), &[0, 1, 2]).unwrap();
            assert_eq!(path.states, vec![1, 0, 0], "{implementation}");
            assert!(
                (path.log_probability.exp() - 0.01344).abs() < 1e-10,
                "{implementation}: {}",
                path.log_probability.exp()
            );
        }
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        for implementation in Implementation::ALL {
            let model = CategoricalHmm::categorical(
                vec![0.5, 0.5],
                vec![vec![0.5, 0.5], vec![0.5, 0.5]],
                vec![vec![0.5, 0.5], vec![0.5, 0.5]],
                implementation,
            )
            .unwrap();
            let path = viterbi(&model, &[0, 1, 1, 0]).unwrap();
            assert_eq!(path.states, vec![0, 0, 0, 0]);
            assert!((path.log_probability - 0.25f64.ln() * 4.0).abs() < 1e-12);
        }
    }

    #[test]
    fn long_sequence_does_not_underflow() {
        let obs: Vec<usize> = (0..5000).map(|t| (t * 7 + t / 3) % 3).collect();
        let scaled = viterbi(&weather(Implementation::Scaling), &obs).unwrap();
        let logged = viterbi(&weather(Implementation::Log), &obs).unwrap();
        assert!(scaled.log_probability.is_finite());
        assert_eq!(scaled.states, logged.states);
        let rel = (scaled.log_probability - logged.log_probability).abs()
            / logged.log_probability.abs();
        assert!(rel < 1e-10);
    }

    #[test]
    fn impossible_sequence_still_returns_a_path() {
        let model = CategoricalHmm::categorical(
            vec![1.0, 0.0],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            Implementation::Scaling,
        )
        .unwrap();
        let path = viterbi(&model, &[0, 1]).unwrap();
        assert_eq!(path.log_probability, f64::NEG_INFINITY);
        assert_eq!(path.states.len(), 2);
    }
}
