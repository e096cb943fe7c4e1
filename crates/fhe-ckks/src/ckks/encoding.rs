//! Encoding type for the CKKS encryption scheme.

use fhe_traits::FhePlaintextEncoding;
use std::fmt::Display;

/// The fixed-point scale of a CKKS encoding.
///
/// A value `x` is represented by the integer polynomial closest to `x * scale`
/// in the canonical embedding, so larger scales yield finer precision and
/// consume more of the ciphertext modulus. The level selects how many moduli
/// of the chain are dropped from the plaintext.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Encoding {
    pub(crate) scale: f64,
    pub(crate) level: usize,
}

impl Encoding {
    /// An encoding with the given scale, at level 0.
    pub fn with_scale(scale: f64) -> Self {
        Self { scale, level: 0 }
    }

    /// An encoding with the given scale at the given level.
    pub fn with_scale_at_level(scale: f64, level: usize) -> Self {
        Self { scale, level }
    }

    /// Returns the scale of the encoding.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the level of the encoding.
    pub fn level(&self) -> usize {
        self.level
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Encoding {{ scale: 2^{:.2} }}", self.scale.log2())
    }
}

impl FhePlaintextEncoding for Encoding {}
