//! Key generation and key material.

use crate::context::SchemeParameters;
use crate::{Context, Error, Result};
use log::debug;
use rand::thread_rng;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PublicKeyKind {
    Bfv(fhe::bfv::PublicKey),
    Ckks(fhe_ckks::ckks::PublicKey),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SecretKeyKind {
    Bfv(fhe::bfv::SecretKey),
    Ckks(fhe_ckks::ckks::SecretKey),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RelinKeysKind {
    Bfv(fhe::bfv::RelinearizationKey),
    Ckks(fhe_ckks::ckks::RelinearizationKey),
}

/// A public key, used to encrypt.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicKey {
    pub(crate) context: Context,
    pub(crate) kind: PublicKeyKind,
}

/// A secret key, used to decrypt.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretKey {
    pub(crate) context: Context,
    pub(crate) kind: SecretKeyKind,
}

/// Relinearization keys, used to shrink ciphertexts after a multiplication.
#[derive(Debug, Clone, PartialEq)]
pub struct RelinKeys {
    pub(crate) context: Context,
    pub(crate) decomposition_count: usize,
    pub(crate) kind: RelinKeysKind,
}

impl RelinKeys {
    /// Returns the decomposition count the keys were generated with.
    pub fn decomposition_count(&self) -> usize {
        self.decomposition_count
    }
}

/// A key-derivation session bound to a context.
///
/// The secret and public keys are generated once; the accessors return
/// independent copies, so the generator can be dropped while its keys remain
/// in use.
#[derive(Debug)]
pub struct KeyGenerator {
    context: Context,
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyGenerator {
    /// Generate a fresh key pair for the context.
    pub fn new(context: &Context) -> Result<Self> {
        let mut rng = thread_rng();
        let (secret_key, public_key) = match context.scheme_parameters() {
            SchemeParameters::Bfv(par) => {
                let sk = fhe::bfv::SecretKey::random(par, &mut rng);
                let pk = fhe::bfv::PublicKey::new(&sk, &mut rng);
                (SecretKeyKind::Bfv(sk), PublicKeyKind::Bfv(pk))
            }
            SchemeParameters::Ckks(par) => {
                let sk = fhe_ckks::ckks::SecretKey::random(par, &mut rng)?;
                let pk = fhe_ckks::ckks::PublicKey::new(&sk, &mut rng)?;
                (SecretKeyKind::Ckks(sk), PublicKeyKind::Ckks(pk))
            }
        };
        debug!("generated {} key pair", context.scheme());

        Ok(Self {
            context: context.clone(),
            secret_key: SecretKey {
                context: context.clone(),
                kind: secret_key,
            },
            public_key: PublicKey {
                context: context.clone(),
                kind: public_key,
            },
        })
    }

    /// Returns a copy of the public key.
    pub fn public_key(&self) -> PublicKey {
        self.public_key.clone()
    }

    /// Returns a copy of the secret key.
    pub fn secret_key(&self) -> SecretKey {
        self.secret_key.clone()
    }

    /// Generate relinearization keys for the secret key.
    ///
    /// For CKKS, every RNS residue is further decomposed into
    /// `decomposition_count` digits: a larger count produces larger keys and
    /// less noise after relinearization.
    ///
    /// BFV ignores `decomposition_count` beyond checking that it is positive
    /// and recording it on the keys: BFV keys always use the RNS
    /// decomposition of the coefficient modulus, and require at least two
    /// coefficient moduli.
    pub fn relin_keys(&self, decomposition_count: usize) -> Result<RelinKeys> {
        if decomposition_count == 0 {
            return Err(Error::InvalidParameters(
                "The decomposition count must be positive".to_string(),
            ));
        }

        let mut rng = thread_rng();
        let kind = match &self.secret_key.kind {
            SecretKeyKind::Bfv(sk) => {
                RelinKeysKind::Bfv(fhe::bfv::RelinearizationKey::new(sk, &mut rng)?)
            }
            SecretKeyKind::Ckks(sk) => RelinKeysKind::Ckks(
                fhe_ckks::ckks::RelinearizationKey::new(sk, decomposition_count, &mut rng)?,
            ),
        };
        debug!(
            "generated {} relinearization keys with decomposition count {decomposition_count}",
            self.context.scheme()
        );

        Ok(RelinKeys {
            context: self.context.clone(),
            decomposition_count,
            kind,
        })
    }
}
