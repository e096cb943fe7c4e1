//! Public keys for the CKKS encryption scheme

use crate::ckks::{Ciphertext, CkksParameters, Plaintext, SecretKey};
use crate::{Error, Result};
use fhe_math::rq::{Poly, Representation};
use fhe_traits::{FheEncrypter, FheParametrized};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Public key for the CKKS encryption scheme.
#[derive(Debug, PartialEq, Clone)]
pub struct PublicKey {
    pub(crate) par: Arc<CkksParameters>,
    pub(crate) c: Ciphertext,
}

impl PublicKey {
    /// Generate a new [`PublicKey`] from a [`SecretKey`].
    pub fn new<R: RngCore + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<Self> {
        let zero = Poly::zero(&sk.par.ctx, Representation::Ntt);
        let c = sk.encrypt_poly(&zero, 1.0, rng)?;
        Ok(Self {
            par: sk.par.clone(),
            c,
        })
    }
}

impl FheParametrized for PublicKey {
    type Parameters = CkksParameters;
}

impl FheEncrypter<Plaintext, Ciphertext> for PublicKey {
    type Error = Error;

    fn try_encrypt<R: RngCore + CryptoRng>(
        &self,
        pt: &Plaintext,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        if self.par != pt.par {
            return Err(Error::DefaultError(
                "Incompatible CKKS parameters".to_string(),
            ));
        }

        let ctx = &self.par.ctx;
        let u = Zeroizing::new(Poly::small(ctx, Representation::Ntt, self.par.variance, rng)?);
        let e1 = Zeroizing::new(Poly::small(ctx, Representation::Ntt, self.par.variance, rng)?);
        let e2 = Zeroizing::new(Poly::small(ctx, Representation::Ntt, self.par.variance, rng)?);

        let mut c0 = u.as_ref() * &self.c[0];
        c0 += &e1;
        let mut c1 = u.as_ref() * &self.c[1];
        c1 += &e2;
        if pt.level > 0 {
            c0 = self.par.drop_to_level(&c0, pt.level)?;
            c1 = self.par.drop_to_level(&c1, pt.level)?;
        }
        c0 += &pt.poly_ntt;

        Ok(Ciphertext {
            par: self.par.clone(),
            c: vec![c0, c1],
            scale: pt.scale,
            level: pt.level,
        })
    }
}
