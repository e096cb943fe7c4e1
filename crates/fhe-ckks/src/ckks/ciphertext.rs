//! Ciphertext type in the CKKS encryption scheme.

use crate::ckks::CkksParameters;
use crate::proto::CiphertextProto;
use crate::{Error, Result};
use fhe_math::rq::{Poly, Representation};
use fhe_traits::{
    DeserializeParametrized, DeserializeWithContext, FheCiphertext, FheParametrized, Serialize,
};
use prost::Message;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A ciphertext encrypting a plaintext.
#[derive(Debug, Clone, PartialEq)]
pub struct Ciphertext {
    /// The parameters of the underlying CKKS encryption scheme.
    pub(crate) par: Arc<CkksParameters>,

    /// The ciphertext elements.
    pub(crate) c: Vec<Poly>,

    /// The scale of the encrypted value.
    pub(crate) scale: f64,

    /// The level of the ciphertext, i.e. the number of moduli dropped.
    pub(crate) level: usize,
}

impl Deref for Ciphertext {
    type Target = [Poly];

    fn deref(&self) -> &Self::Target {
        &self.c
    }
}

impl DerefMut for Ciphertext {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.c
    }
}

impl Ciphertext {
    /// Create a ciphertext from a vector of polynomials.
    /// A ciphertext must contain at least two polynomials, and all polynomials
    /// must be in Ntt representation and share the context of one level of
    /// the parameters.
    pub fn new(c: Vec<Poly>, scale: f64, par: &Arc<CkksParameters>) -> Result<Self> {
        if c.len() < 2 {
            return Err(Error::TooFewPolynomials(c.len()));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::UnspecifiedInput(format!(
                "The scale must be positive, found {scale}"
            )));
        }

        let level = par
            .level_of(c[0].ctx())
            .ok_or(Error::MathError(fhe_math::Error::InvalidContext))?;
        for ci in c.iter() {
            if ci.representation() != &Representation::Ntt {
                return Err(Error::MathError(fhe_math::Error::IncorrectRepresentation(
                    ci.representation().clone(),
                    Representation::Ntt,
                )));
            }
            if ci.ctx() != c[0].ctx() {
                return Err(Error::MathError(fhe_math::Error::InvalidContext));
            }
        }

        Ok(Self {
            par: par.clone(),
            c,
            scale,
            level,
        })
    }

    /// Returns the scale of the encrypted value.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the level of the ciphertext.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Divide the ciphertext by the last modulus of its level and drop that
    /// modulus. The scale is divided by the same modulus.
    pub fn rescale_to_next(&mut self) -> Result<()> {
        if self.level >= self.par.max_level() {
            return Err(Error::InvalidLevel(self.level + 1, self.par.max_level()));
        }
        let q_last = self.par.moduli[self.par.moduli.len() - self.level - 1];
        self.c = self
            .c
            .iter()
            .map(|ci| self.par.divide_by_last_modulus(ci, self.level))
            .collect::<Result<Vec<_>>>()?;
        self.scale /= q_last as f64;
        self.level += 1;
        Ok(())
    }

    /// Drop the last modulus of the level without changing the encrypted
    /// value or its scale.
    pub fn mod_switch_to_next_level(&mut self) -> Result<()> {
        if self.level >= self.par.max_level() {
            return Err(Error::InvalidLevel(self.level + 1, self.par.max_level()));
        }
        self.c = self
            .c
            .iter()
            .map(|ci| self.par.drop_to_level(ci, self.level + 1))
            .collect::<Result<Vec<_>>>()?;
        self.level += 1;
        Ok(())
    }
}

impl FheCiphertext for Ciphertext {}

impl FheParametrized for Ciphertext {
    type Parameters = CkksParameters;
}

impl Serialize for Ciphertext {
    fn to_bytes(&self) -> Vec<u8> {
        CiphertextProto {
            c: self.c.iter().map(|ci| ci.to_bytes()).collect(),
            scale: self.scale,
            level: self.level as u32,
        }
        .encode_to_vec()
    }
}

impl DeserializeParametrized for Ciphertext {
    type Error = Error;

    fn from_bytes(bytes: &[u8], par: &Arc<CkksParameters>) -> Result<Self> {
        let ctp = CiphertextProto::decode(bytes).map_err(|_| Error::SerializationError)?;
        let ctx = par
            .ctx_at_level(ctp.level as usize)
            .map_err(|_| Error::SerializationError)?;
        let c = ctp
            .c
            .iter()
            .map(|ci| Poly::from_bytes(ci, ctx).map_err(|_| Error::SerializationError))
            .collect::<Result<Vec<_>>>()?;
        Ciphertext::new(c, ctp.scale, par)
    }
}
