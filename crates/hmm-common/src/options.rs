//! Engine options shared by the library, configuration files and the CLI.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Arithmetic used by the recursions.
///
/// Both variants produce the same decoded paths and log-likelihoods up to
/// floating-point tolerance; they differ only in how underflow is avoided.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Implementation {
    /// Plain probabilities renormalised at every time step.
    Scaling,
    /// Log-probabilities combined with log-sum-exp.
    #[default]
    Log,
}

impl Implementation {
    pub const ALL: [Implementation; 2] = [Implementation::Scaling, Implementation::Log];

    pub fn as_str(&self) -> &'static str {
        match self {
            Implementation::Scaling => "scaling",
            Implementation::Log => "log",
        }
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Implementation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scaling" | "scaled" => Ok(Implementation::Scaling),
            "log" | "logspace" => Ok(Implementation::Log),
            _ => Err(format!("unknown implementation: {}", s)),
        }
    }
}

/// Decoder used to turn observations into a state sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DecodeAlgorithm {
    /// Single most probable path.
    #[default]
    Viterbi,
    /// Per-step posterior argmax; not guaranteed to be a feasible path.
    Map,
}

impl fmt::Display for DecodeAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeAlgorithm::Viterbi => write!(f, "viterbi"),
            DecodeAlgorithm::Map => write!(f, "map"),
        }
    }
}

impl FromStr for DecodeAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "viterbi" => Ok(DecodeAlgorithm::Viterbi),
            "map" | "posterior" => Ok(DecodeAlgorithm::Map),
            _ => Err(format!("unknown decode algorithm: {}", s)),
        }
    }
}

/// What the M-step does with a state whose expected counts are all zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum EmptyStatePolicy {
    /// Keep the row from the previous iteration.
    #[default]
    KeepPrevious,
    /// Reset the row to a uniform distribution.
    Uniform,
}

/// Subset of model parameters, written as letters: `s` startprob,
/// `t` transmat, `e` emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParamSet {
    pub startprob: bool,
    pub transmat: bool,
    pub emission: bool,
}

impl ParamSet {
    pub const ALL: ParamSet = ParamSet {
        startprob: true,
        transmat: true,
        emission: true,
    };

    pub const NONE: ParamSet = ParamSet {
        startprob: false,
        transmat: false,
        emission: false,
    };

    pub fn is_empty(&self) -> bool {
        !(self.startprob || self.transmat || self.emission)
    }
}

impl Default for ParamSet {
    fn default() -> Self {
        ParamSet::ALL
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.startprob {
            write!(f, "s")?;
        }
        if self.transmat {
            write!(f, "t")?;
        }
        if self.emission {
            write!(f, "e")?;
        }
        Ok(())
    }
}

impl FromStr for ParamSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = ParamSet::NONE;
        for c in s.chars() {
            match c {
                's' => set.startprob = true,
                't' => set.transmat = true,
                'e' => set.emission = true,
                other => return Err(format!("unknown parameter letter '{}' in \"{}\"", other, s)),
            }
        }
        Ok(set)
    }
}

impl TryFrom<String> for ParamSet {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ParamSet> for String {
    fn from(value: ParamSet) -> Self {
        value.to_string()
    }
}
