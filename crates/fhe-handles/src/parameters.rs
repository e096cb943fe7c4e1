//! Encryption parameters: scheme selection and sizing knobs.

use crate::{Error, Result};
use std::fmt::Display;

/// The homomorphic encryption scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeType {
    /// Integer arithmetic modulo a plaintext modulus.
    Bfv,
    /// Approximate arithmetic on real numbers.
    Ckks,
}

impl Display for SchemeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemeType::Bfv => f.write_str("BFV"),
            SchemeType::Ckks => f.write_str("CKKS"),
        }
    }
}

/// Default coefficient-modulus bit sizes targeting 128-bit security for a
/// polynomial modulus degree.
///
/// The totals follow the homomorphic encryption standard (27, 54, 109, 218,
/// 438 and 881 bits). Every modulus is at most 56 bits and at least two moduli
/// are used from degree 2048 onwards, so that relinearization keys can be
/// generated.
pub fn coeff_modulus_128(degree: usize) -> Result<Vec<usize>> {
    let sizes = match degree {
        1024 => vec![27],
        2048 => vec![27, 27],
        4096 => vec![36, 36, 37],
        8192 => vec![43, 43, 44, 44, 44],
        16384 => vec![48, 48, 48, 49, 49, 49, 49, 49, 49],
        32768 => [vec![55; 15], vec![56]].concat(),
        _ => {
            return Err(Error::InvalidParameters(format!(
                "No default coefficient modulus for degree {degree}"
            )))
        }
    };
    Ok(sizes)
}

/// Encryption parameters: the scheme, the polynomial modulus degree, the bit
/// sizes of the coefficient moduli, and for BFV the plaintext modulus.
///
/// No consistency check happens here; a [`Context`](crate::Context) validates
/// the parameters when it is derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionParameters {
    scheme: SchemeType,
    poly_modulus_degree: usize,
    coeff_modulus: Vec<usize>,
    plain_modulus: Option<u64>,
}

impl EncryptionParameters {
    /// Empty parameters for a scheme.
    pub fn new(scheme: SchemeType) -> Self {
        Self {
            scheme,
            poly_modulus_degree: 0,
            coeff_modulus: vec![],
            plain_modulus: None,
        }
    }

    /// Default BFV parameters: degree 2048, the 128-bit coefficient modulus for
    /// that degree, and plaintext modulus 256.
    pub fn bfv_default() -> Self {
        Self {
            scheme: SchemeType::Bfv,
            poly_modulus_degree: 2048,
            coeff_modulus: vec![27, 27],
            plain_modulus: Some(1 << 8),
        }
    }

    /// Default CKKS parameters: degree 8192 and the 128-bit coefficient modulus
    /// for that degree. CKKS encodes directly into the coefficient modulus and
    /// has no plaintext modulus.
    pub fn ckks_default() -> Self {
        Self {
            scheme: SchemeType::Ckks,
            poly_modulus_degree: 8192,
            coeff_modulus: vec![43, 43, 44, 44, 44],
            plain_modulus: None,
        }
    }

    /// Sets the polynomial modulus degree.
    pub fn set_poly_modulus_degree(&mut self, degree: usize) -> &mut Self {
        self.poly_modulus_degree = degree;
        self
    }

    /// Sets the bit sizes of the coefficient moduli.
    pub fn set_coeff_modulus(&mut self, sizes: &[usize]) -> &mut Self {
        sizes.clone_into(&mut self.coeff_modulus);
        self
    }

    /// Sets the plaintext modulus.
    pub fn set_plain_modulus(&mut self, plain_modulus: u64) -> &mut Self {
        self.plain_modulus = Some(plain_modulus);
        self
    }

    /// Returns the scheme.
    pub fn scheme(&self) -> SchemeType {
        self.scheme
    }

    /// Returns the polynomial modulus degree.
    pub fn poly_modulus_degree(&self) -> usize {
        self.poly_modulus_degree
    }

    /// Returns the bit sizes of the coefficient moduli.
    pub fn coeff_modulus(&self) -> &[usize] {
        &self.coeff_modulus
    }

    /// Returns the plaintext modulus, if any.
    pub fn plain_modulus(&self) -> Option<u64> {
        self.plain_modulus
    }
}
