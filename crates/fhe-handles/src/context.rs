//! Validated runtime context shared by every component of a scheme.

use crate::{coeff_modulus_128, EncryptionParameters, Error, Result, SchemeType};
use fhe::bfv::{BfvParameters, BfvParametersBuilder};
use fhe_ckks::ckks::{CkksParameters, CkksParametersBuilder};
use log::{debug, warn};
use std::fmt::Debug;
use std::sync::Arc;

/// The scheme parameters derived from the encryption parameters.
pub(crate) enum SchemeParameters {
    Bfv(Arc<BfvParameters>),
    Ckks(Arc<CkksParameters>),
}

struct ContextInner {
    parameters: EncryptionParameters,
    scheme: SchemeParameters,
}

/// A validated runtime context derived from [`EncryptionParameters`].
///
/// A `Context` is a reference-counted handle: cloning it is cheap and every
/// component built on top of it keeps a clone, so the underlying state lives
/// as long as its longest-lived dependent. Two contexts are equal when they
/// share the same underlying state.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    /// Derive a context from encryption parameters.
    ///
    /// This is the single place where parameter consistency is checked.
    pub fn new(parameters: &EncryptionParameters) -> Result<Self> {
        let degree = parameters.poly_modulus_degree();
        let moduli_sizes = parameters.coeff_modulus();
        if moduli_sizes.is_empty() {
            return Err(Error::InvalidParameters(
                "The coefficient modulus is empty".to_string(),
            ));
        }

        let scheme = match (parameters.scheme(), parameters.plain_modulus()) {
            (SchemeType::Bfv, Some(plain_modulus)) => SchemeParameters::Bfv(
                BfvParametersBuilder::new()
                    .set_degree(degree)
                    .set_plaintext_modulus(plain_modulus)
                    .set_moduli_sizes(moduli_sizes)
                    .build_arc()?,
            ),
            (SchemeType::Bfv, None) => {
                return Err(Error::InvalidParameters(
                    "BFV requires a plaintext modulus".to_string(),
                ))
            }
            (SchemeType::Ckks, None) => SchemeParameters::Ckks(
                CkksParametersBuilder::new()
                    .set_degree(degree)
                    .set_moduli_sizes(moduli_sizes)
                    .build_arc()?,
            ),
            (SchemeType::Ckks, Some(_)) => {
                return Err(Error::InvalidParameters(
                    "CKKS does not use a plaintext modulus".to_string(),
                ))
            }
        };

        let total_bits = moduli_sizes.iter().sum::<usize>();
        if let Ok(bound) = coeff_modulus_128(degree) {
            if total_bits > bound.iter().sum::<usize>() {
                warn!(
                    "{} context of degree {degree} uses a {total_bits}-bit coefficient modulus, \
                     above the 128-bit security bound",
                    parameters.scheme()
                );
            }
        }
        debug!(
            "derived {} context: degree {degree}, coefficient modulus {moduli_sizes:?}, plaintext modulus {:?}",
            parameters.scheme(),
            parameters.plain_modulus()
        );

        Ok(Self {
            inner: Arc::new(ContextInner {
                parameters: parameters.clone(),
                scheme,
            }),
        })
    }

    /// Returns the parameters this context was derived from.
    pub fn parameters(&self) -> &EncryptionParameters {
        &self.inner.parameters
    }

    /// Returns the scheme of this context.
    pub fn scheme(&self) -> SchemeType {
        self.inner.parameters.scheme()
    }

    /// Returns the number of live references to the underlying context,
    /// including the ones held by dependent components.
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub(crate) fn scheme_parameters(&self) -> &SchemeParameters {
        &self.inner.scheme
    }

    pub(crate) fn bfv(&self) -> Result<&Arc<BfvParameters>> {
        match &self.inner.scheme {
            SchemeParameters::Bfv(par) => Ok(par),
            SchemeParameters::Ckks(_) => Err(Error::SchemeMismatch {
                found: SchemeType::Ckks,
                expected: SchemeType::Bfv,
            }),
        }
    }

    pub(crate) fn ckks(&self) -> Result<&Arc<CkksParameters>> {
        match &self.inner.scheme {
            SchemeParameters::Ckks(par) => Ok(par),
            SchemeParameters::Bfv(_) => Err(Error::SchemeMismatch {
                found: SchemeType::Bfv,
                expected: SchemeType::Ckks,
            }),
        }
    }

    /// Fails unless `other` shares this context.
    pub(crate) fn check(&self, other: &Context) -> Result<()> {
        if self == other {
            Ok(())
        } else {
            Err(Error::ContextMismatch)
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Context {}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("parameters", &self.inner.parameters)
            .field("reference_count", &self.reference_count())
            .finish()
    }
}
