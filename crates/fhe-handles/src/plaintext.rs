//! Encoded cleartext values.

use crate::{Context, Error, Result, SchemeType};
use fhe::bfv::{BfvParameters, Encoding};
use fhe_traits::FheEncoder;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PlaintextKind {
    /// Polynomial coefficients modulo the plaintext modulus.
    Bfv {
        plain_modulus: u64,
        coefficients: Box<[u64]>,
    },
    /// A CKKS plaintext, tied to the context that encoded it.
    Ckks {
        context: Context,
        value: fhe_ckks::ckks::Plaintext,
    },
}

/// An encoded cleartext polynomial.
///
/// A BFV plaintext only depends on the plaintext modulus and can be used with
/// any context sharing it; a CKKS plaintext is bound to the context of the
/// encoder that produced it. Cloning a plaintext copies it.
#[derive(Debug, Clone, PartialEq)]
pub struct Plaintext {
    pub(crate) kind: PlaintextKind,
}

impl Plaintext {
    pub(crate) fn bfv(plain_modulus: u64, coefficients: Vec<u64>) -> Self {
        Self {
            kind: PlaintextKind::Bfv {
                plain_modulus,
                coefficients: coefficients.into_boxed_slice(),
            },
        }
    }

    pub(crate) fn ckks(context: &Context, value: fhe_ckks::ckks::Plaintext) -> Self {
        Self {
            kind: PlaintextKind::Ckks {
                context: context.clone(),
                value,
            },
        }
    }

    /// Returns the scheme of this plaintext.
    pub fn scheme(&self) -> SchemeType {
        match self.kind {
            PlaintextKind::Bfv { .. } => SchemeType::Bfv,
            PlaintextKind::Ckks { .. } => SchemeType::Ckks,
        }
    }

    /// Returns the CKKS scale of this plaintext, if any.
    pub fn scale(&self) -> Option<f64> {
        match &self.kind {
            PlaintextKind::Bfv { .. } => None,
            PlaintextKind::Ckks { value, .. } => Some(value.scale()),
        }
    }

    /// The BFV coefficients and their plaintext modulus.
    pub(crate) fn as_bfv(&self) -> Result<(u64, &[u64])> {
        match &self.kind {
            PlaintextKind::Bfv {
                plain_modulus,
                coefficients,
            } => Ok((*plain_modulus, coefficients)),
            PlaintextKind::Ckks { .. } => Err(Error::SchemeMismatch {
                found: SchemeType::Ckks,
                expected: SchemeType::Bfv,
            }),
        }
    }

    /// The CKKS plaintext, checked against the context of the caller.
    pub(crate) fn as_ckks(&self, context: &Context) -> Result<&fhe_ckks::ckks::Plaintext> {
        match &self.kind {
            PlaintextKind::Ckks {
                context: owner,
                value,
            } => {
                context.check(owner)?;
                Ok(value)
            }
            PlaintextKind::Bfv { .. } => Err(Error::SchemeMismatch {
                found: SchemeType::Bfv,
                expected: SchemeType::Ckks,
            }),
        }
    }

    /// Convert to a BFV plaintext of the given parameters.
    pub(crate) fn to_fhe(&self, par: &Arc<BfvParameters>) -> Result<fhe::bfv::Plaintext> {
        let (plain_modulus, coefficients) = self.as_bfv()?;
        if plain_modulus != par.plaintext() {
            return Err(Error::InvalidParameters(format!(
                "Plaintext modulus {plain_modulus} does not match the context plaintext modulus {}",
                par.plaintext()
            )));
        }
        Ok(fhe::bfv::Plaintext::try_encode(
            coefficients,
            Encoding::poly(),
            par,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::Plaintext;
    use crate::{Context, EncryptionParameters, Error, SchemeType};
    use std::error::Error as StdError;

    #[test]
    fn bfv_plaintext() -> Result<(), Box<dyn StdError>> {
        let pt = Plaintext::bfv(256, vec![1, 0, 255]);
        assert_eq!(pt.scheme(), SchemeType::Bfv);
        assert_eq!(pt.scale(), None);
        assert_eq!(pt.as_bfv()?, (256, &[1u64, 0, 255] as &[u64]));

        let context = Context::new(&EncryptionParameters::bfv_default())?;
        pt.to_fhe(context.bfv()?)?;

        let mut parameters = EncryptionParameters::bfv_default();
        parameters.set_plain_modulus(1024);
        let other = Context::new(&parameters)?;
        assert!(matches!(
            pt.to_fhe(other.bfv()?),
            Err(Error::InvalidParameters(_))
        ));
        assert!(matches!(
            pt.as_ckks(&context),
            Err(Error::SchemeMismatch { .. })
        ));

        let copy = pt.clone();
        assert_eq!(copy, pt);
        Ok(())
    }
}
