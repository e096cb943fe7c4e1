//! Encrypted values, mutated in place by the evaluator.

use crate::context::SchemeParameters;
use crate::{Context, Result, SchemeType};
use fhe_traits::{DeserializeParametrized, Serialize};

/// Number of polynomials of a BFV ciphertext.
pub(crate) fn bfv_len(ct: &fhe::bfv::Ciphertext) -> usize {
    (0..).take_while(|i| ct.get(*i).is_some()).count()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CiphertextKind {
    Bfv(fhe::bfv::Ciphertext),
    Ckks(fhe_ckks::ckks::Ciphertext),
}

/// An encrypted polynomial bound to the context that produced it.
///
/// Cloning a ciphertext performs a deep copy: the copy shares no storage with
/// the original, so later in-place evaluations of one leave the other intact.
#[derive(Debug, Clone, PartialEq)]
pub struct Ciphertext {
    pub(crate) context: Context,
    pub(crate) kind: CiphertextKind,
}

impl Ciphertext {
    /// Returns the context of this ciphertext.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns the scheme of this ciphertext.
    pub fn scheme(&self) -> SchemeType {
        match self.kind {
            CiphertextKind::Bfv(_) => SchemeType::Bfv,
            CiphertextKind::Ckks(_) => SchemeType::Ckks,
        }
    }

    /// Returns the number of polynomials of this ciphertext: two for a fresh
    /// ciphertext, one more after every multiplication that is not followed by
    /// a relinearization.
    pub fn size(&self) -> usize {
        match &self.kind {
            CiphertextKind::Bfv(ct) => bfv_len(ct),
            CiphertextKind::Ckks(ct) => ct.len(),
        }
    }

    /// Returns the CKKS scale of this ciphertext, if any.
    pub fn scale(&self) -> Option<f64> {
        match &self.kind {
            CiphertextKind::Bfv(_) => None,
            CiphertextKind::Ckks(ct) => Some(ct.scale()),
        }
    }

    /// Returns the CKKS level of this ciphertext, i.e. the number of moduli
    /// dropped by rescaling or modulus switching, if any.
    pub fn level(&self) -> Option<usize> {
        match &self.kind {
            CiphertextKind::Bfv(_) => None,
            CiphertextKind::Ckks(ct) => Some(ct.level()),
        }
    }

    /// Serialize the ciphertext with the format of its scheme.
    pub fn to_bytes(&self) -> Vec<u8> {
        match &self.kind {
            CiphertextKind::Bfv(ct) => ct.to_bytes(),
            CiphertextKind::Ckks(ct) => ct.to_bytes(),
        }
    }

    /// Deserialize a ciphertext of the given context.
    pub fn from_bytes(context: &Context, bytes: &[u8]) -> Result<Self> {
        let kind = match context.scheme_parameters() {
            SchemeParameters::Bfv(par) => {
                CiphertextKind::Bfv(fhe::bfv::Ciphertext::from_bytes(bytes, par)?)
            }
            SchemeParameters::Ckks(par) => {
                CiphertextKind::Ckks(fhe_ckks::ckks::Ciphertext::from_bytes(bytes, par)?)
            }
        };
        Ok(Self {
            context: context.clone(),
            kind,
        })
    }
}
