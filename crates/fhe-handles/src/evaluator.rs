//! In-place homomorphic operations.

use crate::ciphertext::{bfv_len, CiphertextKind};
use crate::keys::RelinKeysKind;
use crate::{Ciphertext, Context, Error, Plaintext, RelinKeys, Result};
use fhe::bfv::BfvParameters;
use fhe_math::rq::{Poly, Representation};
use log::trace;
use std::borrow::Cow;
use std::sync::Arc;

/// Performs homomorphic operations on ciphertexts of one context.
///
/// Every operation mutates its first ciphertext operand in place and keeps
/// its identity; to preserve the previous value, clone the ciphertext first.
/// Multiplications grow the ciphertext by one polynomial and consume noise
/// budget. [`Evaluator::relinearize_inplace`] brings the ciphertext back to
/// two polynomials.
///
/// CKKS additions and subtractions require operands of equal scale, and
/// multiplications multiply the scales. Binary CKKS operations require
/// ciphertexts at the same level; plaintexts are brought down to the level of
/// the ciphertext. [`Evaluator::rescale_to_next_inplace`] divides a
/// ciphertext and its scale by the last modulus of its level.
#[derive(Debug, Clone)]
pub struct Evaluator {
    context: Context,
}

/// A copy of a BFV ciphertext padded with zero polynomials up to `len`.
fn padded(
    ct: &fhe::bfv::Ciphertext,
    len: usize,
    par: &Arc<BfvParameters>,
) -> Result<fhe::bfv::Ciphertext> {
    let mut c = (0..bfv_len(ct))
        .filter_map(|i| ct.get(i).cloned())
        .collect::<Vec<_>>();
    let zero = match c.first() {
        Some(c0) => Poly::zero(c0.ctx(), Representation::Ntt),
        None => return Err(Error::Unsupported("Empty BFV ciphertext".to_string())),
    };
    c.resize(len, zero);
    Ok(fhe::bfv::Ciphertext::new(c, par)?)
}

fn check_scales(a: &fhe_ckks::ckks::Ciphertext, b: f64) -> Result<()> {
    if (a.scale() - b).abs() > 16.0 * f64::EPSILON * a.scale().max(b) {
        Err(Error::ScaleMismatch(a.scale(), b))
    } else {
        Ok(())
    }
}

fn check_levels(a: &fhe_ckks::ckks::Ciphertext, b: usize) -> Result<()> {
    if a.level() != b {
        Err(Error::LevelMismatch(a.level(), b))
    } else {
        Ok(())
    }
}

/// The CKKS plaintext at the level of the ciphertext `a`.
fn at_level_of<'a>(
    a: &fhe_ckks::ckks::Ciphertext,
    p: &'a fhe_ckks::ckks::Plaintext,
) -> Result<Cow<'a, fhe_ckks::ckks::Plaintext>> {
    if p.level() == a.level() {
        Ok(Cow::Borrowed(p))
    } else if p.level() < a.level() {
        Ok(Cow::Owned(p.at_level(a.level())?))
    } else {
        Err(Error::LevelMismatch(a.level(), p.level()))
    }
}

/// Add or subtract two BFV ciphertexts of possibly different sizes.
fn bfv_add_sub(
    x: &mut fhe::bfv::Ciphertext,
    y: &fhe::bfv::Ciphertext,
    par: &Arc<BfvParameters>,
    subtract: bool,
) -> Result<()> {
    let (x_len, y_len) = (bfv_len(x), bfv_len(y));
    if x_len < y_len {
        *x = padded(x, y_len, par)?;
    }
    let y = if y_len < x_len {
        Cow::Owned(padded(y, x_len, par)?)
    } else {
        Cow::Borrowed(y)
    };
    if subtract {
        *x -= &*y;
    } else {
        *x += &*y;
    }
    Ok(())
}

impl Evaluator {
    /// Bind an evaluator to a context.
    pub fn new(context: &Context) -> Self {
        Self {
            context: context.clone(),
        }
    }

    fn check(&self, ct: &Ciphertext) -> Result<()> {
        self.context.check(&ct.context)
    }

    /// Negate a ciphertext.
    pub fn negate_inplace(&self, a: &mut Ciphertext) -> Result<()> {
        self.check(a)?;
        match &mut a.kind {
            CiphertextKind::Bfv(x) => *x = -&*x,
            CiphertextKind::Ckks(x) => *x = -&*x,
        }
        Ok(())
    }

    /// Add `b` to `a`.
    pub fn add_inplace(&self, a: &mut Ciphertext, b: &Ciphertext) -> Result<()> {
        self.check(a)?;
        self.check(b)?;
        match (&mut a.kind, &b.kind) {
            (CiphertextKind::Bfv(x), CiphertextKind::Bfv(y)) => {
                bfv_add_sub(x, y, self.context.bfv()?, false)?
            }
            (CiphertextKind::Ckks(x), CiphertextKind::Ckks(y)) => {
                check_levels(x, y.level())?;
                check_scales(x, y.scale())?;
                *x += y;
            }
            _ => return Err(Error::ContextMismatch),
        }
        Ok(())
    }

    /// Subtract `b` from `a`.
    pub fn sub_inplace(&self, a: &mut Ciphertext, b: &Ciphertext) -> Result<()> {
        self.check(a)?;
        self.check(b)?;
        match (&mut a.kind, &b.kind) {
            (CiphertextKind::Bfv(x), CiphertextKind::Bfv(y)) => {
                bfv_add_sub(x, y, self.context.bfv()?, true)?
            }
            (CiphertextKind::Ckks(x), CiphertextKind::Ckks(y)) => {
                check_levels(x, y.level())?;
                check_scales(x, y.scale())?;
                *x -= y;
            }
            _ => return Err(Error::ContextMismatch),
        }
        Ok(())
    }

    /// Add the plaintext `pt` to `a`.
    pub fn add_plain_inplace(&self, a: &mut Ciphertext, pt: &Plaintext) -> Result<()> {
        self.check(a)?;
        match &mut a.kind {
            CiphertextKind::Bfv(x) => *x += &pt.to_fhe(self.context.bfv()?)?,
            CiphertextKind::Ckks(x) => {
                let p = at_level_of(x, pt.as_ckks(&self.context)?)?;
                check_scales(x, p.scale())?;
                *x += &*p;
            }
        }
        Ok(())
    }

    /// Subtract the plaintext `pt` from `a`.
    pub fn sub_plain_inplace(&self, a: &mut Ciphertext, pt: &Plaintext) -> Result<()> {
        self.check(a)?;
        match &mut a.kind {
            CiphertextKind::Bfv(x) => *x -= &pt.to_fhe(self.context.bfv()?)?,
            CiphertextKind::Ckks(x) => {
                let p = at_level_of(x, pt.as_ckks(&self.context)?)?;
                check_scales(x, p.scale())?;
                *x -= &*p;
            }
        }
        Ok(())
    }

    /// Multiply `a` by `b`. The size of `a` becomes the sum of both sizes
    /// minus one.
    pub fn multiply_inplace(&self, a: &mut Ciphertext, b: &Ciphertext) -> Result<()> {
        self.check(a)?;
        self.check(b)?;
        match (&mut a.kind, &b.kind) {
            (CiphertextKind::Bfv(x), CiphertextKind::Bfv(y)) => *x = &*x * y,
            (CiphertextKind::Ckks(x), CiphertextKind::Ckks(y)) => {
                check_levels(x, y.level())?;
                *x = &*x * y
            }
            _ => return Err(Error::ContextMismatch),
        }
        trace!("multiplied ciphertexts into size {}", a.size());
        Ok(())
    }

    /// Multiply `a` by the plaintext `pt`. The size of `a` is unchanged.
    pub fn multiply_plain_inplace(&self, a: &mut Ciphertext, pt: &Plaintext) -> Result<()> {
        self.check(a)?;
        match &mut a.kind {
            CiphertextKind::Bfv(x) => *x *= &pt.to_fhe(self.context.bfv()?)?,
            CiphertextKind::Ckks(x) => {
                let p = at_level_of(x, pt.as_ckks(&self.context)?)?;
                *x *= &*p
            }
        }
        Ok(())
    }

    /// Square `a`.
    pub fn square_inplace(&self, a: &mut Ciphertext) -> Result<()> {
        self.check(a)?;
        match &mut a.kind {
            CiphertextKind::Bfv(x) => *x = &*x * &*x,
            CiphertextKind::Ckks(x) => *x = &*x * &*x,
        }
        trace!("squared ciphertext into size {}", a.size());
        Ok(())
    }

    /// Relinearize a ciphertext of size 3 back to size 2. Ciphertexts of size
    /// 2 are left untouched.
    pub fn relinearize_inplace(&self, a: &mut Ciphertext, relin_keys: &RelinKeys) -> Result<()> {
        self.check(a)?;
        self.context.check(&relin_keys.context)?;
        match a.size() {
            2 => return Ok(()),
            3 => {}
            size => {
                return Err(Error::Unsupported(format!(
                    "Cannot relinearize a ciphertext of size {size}, relinearize after every multiplication"
                )))
            }
        }
        match (&mut a.kind, &relin_keys.kind) {
            (CiphertextKind::Bfv(x), RelinKeysKind::Bfv(rk)) => rk.relinearizes(x)?,
            (CiphertextKind::Ckks(x), RelinKeysKind::Ckks(rk)) => rk.relinearizes(x)?,
            _ => return Err(Error::ContextMismatch),
        }
        Ok(())
    }

    /// Divide a CKKS ciphertext and its scale by the last modulus of its
    /// level, and move the ciphertext to the next level.
    pub fn rescale_to_next_inplace(&self, a: &mut Ciphertext) -> Result<()> {
        self.check(a)?;
        match &mut a.kind {
            CiphertextKind::Bfv(_) => Err(Error::Unsupported(
                "Rescaling is only available for CKKS".to_string(),
            )),
            CiphertextKind::Ckks(x) => {
                x.rescale_to_next()?;
                trace!("rescaled ciphertext to level {} and scale {}", x.level(), x.scale());
                Ok(())
            }
        }
    }

    /// Move a CKKS ciphertext to the next level without changing its value
    /// or its scale.
    pub fn mod_switch_to_next_inplace(&self, a: &mut Ciphertext) -> Result<()> {
        self.check(a)?;
        match &mut a.kind {
            CiphertextKind::Bfv(_) => Err(Error::Unsupported(
                "Modulus switching is only available for CKKS".to_string(),
            )),
            CiphertextKind::Ckks(x) => Ok(x.mod_switch_to_next_level()?),
        }
    }
}
