//! Operations over ciphertexts

use super::{scales_match, Ciphertext, Plaintext};
use crate::{Error, Result};
use fhe_math::rq::{Poly, Representation};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::sync::Arc;

impl Ciphertext {
    /// Pad the ciphertext with zero polynomials up to `len` elements.
    fn extend_to(&mut self, len: usize) {
        let ctx = self.c[0].ctx().clone();
        while self.c.len() < len {
            self.c.push(Poly::zero(&ctx, Representation::Ntt));
        }
    }

    /// Check that an operand has the same level and scale.
    fn check_operand(&self, level: usize, scale: f64) -> Result<()> {
        if self.level != level {
            return Err(Error::LevelMismatch(level, self.level));
        }
        if !scales_match(self.scale, scale) {
            return Err(Error::ScaleMismatch(scale, self.scale));
        }
        Ok(())
    }

    /// Add a ciphertext, or return an error if the two ciphertexts are at
    /// different levels or scales.
    pub fn try_add_assign(&mut self, rhs: &Ciphertext) -> Result<()> {
        self.check_operand(rhs.level, rhs.scale)?;
        *self += rhs;
        Ok(())
    }

    /// Subtract a ciphertext, or return an error if the two ciphertexts are
    /// at different levels or scales.
    pub fn try_sub_assign(&mut self, rhs: &Ciphertext) -> Result<()> {
        self.check_operand(rhs.level, rhs.scale)?;
        *self -= rhs;
        Ok(())
    }
}

/// # Panics
///
/// Panics if the ciphertexts have different parameters, levels or scales.
/// See [`Ciphertext::try_add_assign`] for a fallible version.
impl AddAssign<&Ciphertext> for Ciphertext {
    fn add_assign(&mut self, rhs: &Ciphertext) {
        assert!(Arc::ptr_eq(&self.par, &rhs.par));
        assert_eq!(self.level, rhs.level);
        assert!(scales_match(self.scale, rhs.scale));

        self.extend_to(rhs.len());
        self.iter_mut()
            .zip(rhs.iter())
            .for_each(|(c1i, c2i)| *c1i += c2i);
    }
}

impl Add<&Ciphertext> for &Ciphertext {
    type Output = Ciphertext;

    fn add(self, rhs: &Ciphertext) -> Ciphertext {
        let mut self_clone = self.clone();
        self_clone += rhs;
        self_clone
    }
}

/// # Panics
///
/// Panics if the ciphertexts have different parameters, levels or scales.
/// See [`Ciphertext::try_sub_assign`] for a fallible version.
impl SubAssign<&Ciphertext> for Ciphertext {
    fn sub_assign(&mut self, rhs: &Ciphertext) {
        assert!(Arc::ptr_eq(&self.par, &rhs.par));
        assert_eq!(self.level, rhs.level);
        assert!(scales_match(self.scale, rhs.scale));

        self.extend_to(rhs.len());
        self.iter_mut()
            .zip(rhs.iter())
            .for_each(|(c1i, c2i)| *c1i -= c2i);
    }
}

impl Sub<&Ciphertext> for &Ciphertext {
    type Output = Ciphertext;

    fn sub(self, rhs: &Ciphertext) -> Ciphertext {
        let mut self_clone = self.clone();
        self_clone -= rhs;
        self_clone
    }
}

/// # Panics
///
/// Panics if the plaintext has different parameters, level or scale.
impl AddAssign<&Plaintext> for Ciphertext {
    fn add_assign(&mut self, rhs: &Plaintext) {
        assert!(Arc::ptr_eq(&self.par, &rhs.par));
        assert_eq!(self.level, rhs.level);
        assert!(scales_match(self.scale, rhs.scale));
        self[0] += &rhs.poly_ntt;
    }
}

/// # Panics
///
/// Panics if the plaintext has different parameters, level or scale.
impl SubAssign<&Plaintext> for Ciphertext {
    fn sub_assign(&mut self, rhs: &Plaintext) {
        assert!(Arc::ptr_eq(&self.par, &rhs.par));
        assert_eq!(self.level, rhs.level);
        assert!(scales_match(self.scale, rhs.scale));
        self[0] -= &rhs.poly_ntt;
    }
}

/// # Panics
///
/// Panics if the plaintext has different parameters or level.
impl MulAssign<&Plaintext> for Ciphertext {
    fn mul_assign(&mut self, rhs: &Plaintext) {
        assert!(Arc::ptr_eq(&self.par, &rhs.par));
        assert_eq!(self.level, rhs.level);
        self.iter_mut().for_each(|ci| *ci *= &rhs.poly_ntt);
        self.scale *= rhs.scale;
    }
}

impl Neg for &Ciphertext {
    type Output = Ciphertext;

    fn neg(self) -> Ciphertext {
        let c = self.iter().map(|ci| -ci).collect::<Vec<_>>();
        Ciphertext {
            par: self.par.clone(),
            c,
            scale: self.scale,
            level: self.level,
        }
    }
}

impl Neg for Ciphertext {
    type Output = Ciphertext;

    fn neg(mut self) -> Ciphertext {
        self.iter_mut().for_each(|ci| *ci = -&*ci);
        self
    }
}

/// Tensor product of two ciphertexts: a ciphertext of sizes `a` and `b`
/// results in a ciphertext of size `a + b - 1` whose scale is the product of
/// the scales.
///
/// # Panics
///
/// Panics if the ciphertexts have different parameters or levels.
impl Mul<&Ciphertext> for &Ciphertext {
    type Output = Ciphertext;

    fn mul(self, rhs: &Ciphertext) -> Ciphertext {
        assert!(Arc::ptr_eq(&self.par, &rhs.par));
        assert_eq!(self.level, rhs.level);

        let zero = Poly::zero(self.c[0].ctx(), Representation::Ntt);
        let mut c = vec![zero; self.len() + rhs.len() - 1];
        for (i, c1i) in self.iter().enumerate() {
            for (j, c2j) in rhs.iter().enumerate() {
                c[i + j] += &(c1i * c2j);
            }
        }

        Ciphertext {
            par: self.par.clone(),
            c,
            scale: self.scale * rhs.scale,
            level: self.level,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ckks::{Ciphertext, CkksParameters, Encoding, Plaintext, SecretKey};
    use crate::Error as CkksError;
    use fhe_traits::{FheDecoder, FheDecrypter, FheEncoder, FheEncrypter};
    use rand::thread_rng;
    use std::error::Error;

    const SCALE: f64 = 1099511627776.0; // 2^40

    fn decrypt(sk: &SecretKey, ct: &Ciphertext) -> Result<f64, Box<dyn Error>> {
        Ok(f64::try_decode(&sk.try_decrypt(ct)?, None)?)
    }

    #[test]
    fn add_sub_neg() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let params = CkksParameters::default_arc(3, 16);
        let sk = SecretKey::random(&params, &mut rng)?;
        let encoding = Encoding::with_scale(SCALE);

        let pa = Plaintext::try_encode(2.25, encoding, &params)?;
        let pb = Plaintext::try_encode(-7.5, encoding, &params)?;
        let a = sk.try_encrypt(&pa, &mut rng)?;
        let b = sk.try_encrypt(&pb, &mut rng)?;

        assert!((decrypt(&sk, &(&a + &b))? + 5.25).abs() < 1e-6);
        assert!((decrypt(&sk, &(&a - &b))? - 9.75).abs() < 1e-6);
        assert!((decrypt(&sk, &(-&a))? + 2.25).abs() < 1e-6);
        assert!((decrypt(&sk, &(-a.clone()))? + 2.25).abs() < 1e-6);

        let mut c = a.clone();
        c += &pb;
        assert!((decrypt(&sk, &c)? + 5.25).abs() < 1e-6);
        c -= &pb;
        c -= &pa;
        assert!(decrypt(&sk, &c)?.abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn mul() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let params = CkksParameters::default_arc(3, 16);
        let sk = SecretKey::random(&params, &mut rng)?;
        let encoding = Encoding::with_scale(SCALE);

        let pa = Plaintext::try_encode(3.0, encoding, &params)?;
        let pb = Plaintext::try_encode(-0.5, encoding, &params)?;
        let a = sk.try_encrypt(&pa, &mut rng)?;
        let b = sk.try_encrypt(&pb, &mut rng)?;

        let ab = &a * &b;
        assert_eq!(ab.len(), 3);
        assert_eq!(ab.scale(), SCALE * SCALE);
        assert!((decrypt(&sk, &ab)? + 1.5).abs() < 1e-6);

        let mut c = a.clone();
        c *= &pb;
        assert_eq!(c.len(), 2);
        assert!((decrypt(&sk, &c)? + 1.5).abs() < 1e-6);

        // Ciphertexts of different sizes but equal scales can be added.
        let sum = &ab + &c;
        assert_eq!(sum.len(), 3);
        assert!((decrypt(&sk, &sum)? + 3.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    #[should_panic]
    fn add_with_different_scales() {
        let mut rng = thread_rng();
        let params = CkksParameters::default_arc(2, 16);
        let sk = SecretKey::random(&params, &mut rng).unwrap();
        let pa = Plaintext::try_encode(1.0, Encoding::with_scale(1024.0), &params).unwrap();
        let pb = Plaintext::try_encode(1.0, Encoding::with_scale(2048.0), &params).unwrap();
        let mut a = sk.try_encrypt(&pa, &mut rng).unwrap();
        a += &pb;
    }

    #[test]
    fn try_add_sub_reports_mismatches() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let params = CkksParameters::default_arc(2, 16);
        let sk = SecretKey::random(&params, &mut rng)?;
        let pa = Plaintext::try_encode(1.0, Encoding::with_scale(2f64.powi(30)), &params)?;
        let pb = Plaintext::try_encode(1.0, Encoding::with_scale(2f64.powi(31)), &params)?;
        let mut a = sk.try_encrypt(&pa, &mut rng)?;
        let b = sk.try_encrypt(&pb, &mut rng)?;

        assert_eq!(
            a.try_add_assign(&b),
            Err(CkksError::ScaleMismatch(2f64.powi(31), 2f64.powi(30)))
        );
        assert_eq!(
            a.try_sub_assign(&b),
            Err(CkksError::ScaleMismatch(2f64.powi(31), 2f64.powi(30)))
        );

        let mut lower = a.clone();
        lower.mod_switch_to_next_level()?;
        assert_eq!(a.try_add_assign(&lower), Err(CkksError::LevelMismatch(1, 0)));

        let a2 = a.clone();
        a.try_add_assign(&a2)?;
        assert!((decrypt(&sk, &a)? - 2.0).abs() < 1e-6);
        a.try_sub_assign(&a2)?;
        assert!((decrypt(&sk, &a)? - 1.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    #[should_panic]
    fn add_at_different_levels() {
        let mut rng = thread_rng();
        let params = CkksParameters::default_arc(2, 16);
        let sk = SecretKey::random(&params, &mut rng).unwrap();
        let pa = Plaintext::try_encode(1.0, Encoding::with_scale(1024.0), &params).unwrap();
        let mut a = sk.try_encrypt(&pa, &mut rng).unwrap();
        let mut b = a.clone();
        b.mod_switch_to_next_level().unwrap();
        a += &b;
    }
}
