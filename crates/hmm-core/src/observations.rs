//! Observation input accepted by the CLI.
//!
//! Three JSON shapes are accepted:
//! - `[[0, 1, 2], [2, 2]]`
//! - `{ "sequences": [[0, 1, 2], [2, 2]] }`
//! - `{ "x": [0, 1, 2, 2, 2], "lengths": [3, 2] }`
//!
//! Values are read as numbers and converted to symbols afterwards, so
//! fractional or negative entries are reported as observation errors rather
//! than JSON errors.

use crate::inference::categorical::symbols_from_f64;
use crate::inference::sequences::split_sequences;
use hmm_common::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ObservationInput {
    Nested(Vec<Vec<f64>>),
    Wrapped {
        sequences: Vec<Vec<f64>>,
    },
    Concatenated {
        x: Vec<f64>,
        #[serde(default)]
        lengths: Option<Vec<usize>>,
    },
}

impl ObservationInput {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Validated symbol sequences, one per entry.
    pub fn into_sequences(self) -> Result<Vec<Vec<usize>>> {
        let sequences = match self {
            ObservationInput::Nested(seqs) | ObservationInput::Wrapped { sequences: seqs } => seqs
                .iter()
                .map(|seq| symbols_from_f64(seq))
                .collect::<Result<Vec<_>>>()?,
            ObservationInput::Concatenated { x, lengths } => {
                let symbols = symbols_from_f64(&x)?;
                split_sequences(&symbols, lengths.as_deref())?
                    .into_iter()
                    .map(<[usize]>::to_vec)
                    .collect()
            }
        };
        if sequences.is_empty() {
            return Err(Error::EmptySequence);
        }
        Ok(sequences)
    }
}
