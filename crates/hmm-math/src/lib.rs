//! Log-domain and probability-simplex math for HMM inference.

pub mod math;

pub use math::simplex::*;
pub use math::stable::*;
