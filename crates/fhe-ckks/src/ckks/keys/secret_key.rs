//! Secret keys for the CKKS encryption scheme

use crate::ckks::{CkksParameters, Ciphertext, Plaintext};
use crate::{Error, Result};
use fhe_math::rq::{traits::TryConvertFrom, Poly, Representation};
use fhe_traits::{FheDecrypter, FheEncrypter, FheParametrized};
use fhe_util::sample_vec_cbd;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Secret key for the CKKS encryption scheme.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SecretKey {
    pub(crate) par: Arc<CkksParameters>,
    pub(crate) coeffs: Box<[i64]>,
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.coeffs.zeroize();
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize()
    }
}

impl ZeroizeOnDrop for SecretKey {}

impl SecretKey {
    /// Generate a random [`SecretKey`].
    pub fn random<R: RngCore + CryptoRng>(par: &Arc<CkksParameters>, rng: &mut R) -> Result<Self> {
        let s_coefficients = sample_vec_cbd(par.degree(), par.variance, rng)
            .map_err(|e| Error::DefaultError(e.to_string()))?;
        Ok(Self {
            par: par.clone(),
            coeffs: s_coefficients.into_boxed_slice(),
        })
    }

    /// The secret key as a polynomial in Ntt representation.
    pub(crate) fn to_ntt(&self) -> Result<Zeroizing<Poly>> {
        self.to_ntt_at_level(0)
    }

    /// The secret key as a polynomial in Ntt representation at a level.
    pub(crate) fn to_ntt_at_level(&self, level: usize) -> Result<Zeroizing<Poly>> {
        let mut s = Zeroizing::new(Poly::try_convert_from(
            self.coeffs.as_ref(),
            self.par.ctx_at_level(level)?,
            false,
            Representation::PowerBasis,
        )?);
        s.change_representation(Representation::Ntt);
        Ok(s)
    }

    /// Encrypt a polynomial in Ntt representation as (-a * s + e + p, a), at
    /// the level of the polynomial.
    pub(crate) fn encrypt_poly<R: RngCore + CryptoRng>(
        &self,
        p: &Poly,
        scale: f64,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        if p.representation() != &Representation::Ntt {
            return Err(Error::MathError(fhe_math::Error::IncorrectRepresentation(
                p.representation().clone(),
                Representation::Ntt,
            )));
        }
        let level = self
            .par
            .level_of(p.ctx())
            .ok_or(Error::MathError(fhe_math::Error::InvalidContext))?;

        let s = self.to_ntt_at_level(level)?;
        let a = Poly::random(p.ctx(), Representation::Ntt, rng);
        let a_s = Zeroizing::new(&a * s.as_ref());

        let mut b = Poly::small(p.ctx(), Representation::Ntt, self.par.variance, rng)?;
        b -= &a_s;
        b += p;

        Ok(Ciphertext {
            par: self.par.clone(),
            c: vec![b, a],
            scale,
            level,
        })
    }
}

impl FheParametrized for SecretKey {
    type Parameters = CkksParameters;
}

impl FheEncrypter<Plaintext, Ciphertext> for SecretKey {
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
        self.encrypt_poly(&pt.poly_ntt, pt.scale, rng)
    }
}

impl FheDecrypter<Plaintext, Ciphertext> for SecretKey {
    type Error = Error;

    fn try_decrypt(&self, ct: &Ciphertext) -> Result<Plaintext> {
        if self.par != ct.par {
            return Err(Error::DefaultError(
                "Incompatible CKKS parameters".to_string(),
            ));
        }

        // c0 + c1 * s + c2 * s^2 + ...
        let s = self.to_ntt_at_level(ct.level)?;
        let mut si = s.clone();
        let mut c = ct.c[0].clone();
        for ci in ct.c.iter().skip(1) {
            let cis = Zeroizing::new(ci * si.as_ref());
            c += &cis;
            *si.as_mut() *= s.as_ref();
        }

        Ok(Plaintext {
            par: self.par.clone(),
            poly_ntt: c,
            scale: ct.scale,
            level: ct.level,
        })
    }
}
