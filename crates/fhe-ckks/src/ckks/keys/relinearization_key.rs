//! Relinearization keys for the CKKS encryption scheme

use crate::ckks::{Ciphertext, CkksParameters, SecretKey};
use crate::{Error, ParametersError, Result};
use fhe_math::rq::{traits::TryConvertFrom, Context, Poly, Representation};
use fhe_traits::FheParametrized;
use itertools::izip;
use num_bigint::BigUint;
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Relinearization key for the CKKS encryption scheme.
///
/// The key switches s^2 to s. Every residue of the polynomial to switch is
/// further split into `decomposition_count` digits of `base_log` bits, so a
/// larger decomposition count produces a larger key and a smaller
/// key-switching noise.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RelinearizationKey {
    pub(crate) par: Arc<CkksParameters>,

    /// The seed that generated the polynomials c1.
    pub(crate) seed: <ChaCha8Rng as SeedableRng>::Seed,

    /// The key switching elements c0, indexed by modulus then digit.
    pub(crate) c0: Box<[Poly]>,

    /// The key switching elements c1, indexed by modulus then digit.
    pub(crate) c1: Box<[Poly]>,

    decomposition_count: usize,
    base_log: usize,
}

impl FheParametrized for RelinearizationKey {
    type Parameters = CkksParameters;
}

impl RelinearizationKey {
    /// Generate a [`RelinearizationKey`] from a [`SecretKey`], splitting every
    /// residue into `decomposition_count` digits.
    pub fn new<R: RngCore + CryptoRng>(
        sk: &SecretKey,
        decomposition_count: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let max_bits = sk.par.moduli_sizes().iter().copied().max().unwrap_or_default();
        if decomposition_count == 0 || decomposition_count > max_bits {
            return Err(ParametersError::InvalidDecompositionCount(
                decomposition_count,
                max_bits,
            )
            .into());
        }
        let base_log = max_bits.div_ceil(decomposition_count);

        let mut seed = <ChaCha8Rng as SeedableRng>::Seed::default();
        rng.fill(&mut seed);
        let c1 = Self::generate_c1(
            &sk.par.ctx,
            seed,
            sk.par.moduli().len() * decomposition_count,
        );
        let c0 = Self::generate_c0(sk, &c1, decomposition_count, base_log, rng)?;

        Ok(Self {
            par: sk.par.clone(),
            seed,
            c0: c0.into_boxed_slice(),
            c1: c1.into_boxed_slice(),
            decomposition_count,
            base_log,
        })
    }

    /// Returns the number of digits every residue is split into.
    pub fn decomposition_count(&self) -> usize {
        self.decomposition_count
    }

    /// Generate the c1's from the seed
    fn generate_c1(
        ctx: &Arc<Context>,
        seed: <ChaCha8Rng as SeedableRng>::Seed,
        size: usize,
    ) -> Vec<Poly> {
        let mut rng = ChaCha8Rng::from_seed(seed);
        (0..size)
            .map(|_| {
                let mut seed_i = <ChaCha8Rng as SeedableRng>::Seed::default();
                rng.fill(&mut seed_i);
                Poly::random_from_seed(ctx, Representation::Ntt, seed_i)
            })
            .collect()
    }

    /// Generate the c0's from the c1's and the secret key: the element for
    /// modulus i and digit j encrypts g_i * 2^(base_log * j) * s^2, where g_i
    /// is the i-th CRT coefficient.
    fn generate_c0<R: RngCore + CryptoRng>(
        sk: &SecretKey,
        c1: &[Poly],
        decomposition_count: usize,
        base_log: usize,
        rng: &mut R,
    ) -> Result<Vec<Poly>> {
        let s = sk.to_ntt()?;
        let mut s2 = Zeroizing::new(s.as_ref() * s.as_ref());
        s2.change_representation(Representation::PowerBasis);

        c1.iter()
            .enumerate()
            .map(|(k, c1k)| {
                let (i, j) = (k / decomposition_count, k % decomposition_count);
                let factor = &sk.par.garner[i] * (BigUint::from(1u64) << (base_log * j));

                let mut b = Poly::small(&sk.par.ctx, Representation::Ntt, sk.par.variance, rng)?;
                let a_s = Zeroizing::new(c1k * s.as_ref());
                b -= &a_s;
                let mut factor_s2 = Zeroizing::new(&factor * s2.as_ref());
                factor_s2.change_representation(Representation::Ntt);
                b += &factor_s2;
                Ok(b)
            })
            .collect()
    }

    /// Switch a polynomial encrypted under s^2 to a pair of polynomials
    /// encrypted under s, at the given level. Below level 0 the key elements
    /// of the dropped moduli are unused and the others are reduced to the
    /// level.
    fn key_switch(&self, p: &Poly, level: usize) -> Result<(Poly, Poly)> {
        let mut p = p.clone();
        p.change_representation(Representation::PowerBasis);

        let ctx = self.par.ctx_at_level(level)?;
        let mask = (1u64 << self.base_log) - 1;
        let mut c0 = Poly::zero(ctx, Representation::Ntt);
        let mut c1 = Poly::zero(ctx, Representation::Ntt);
        for (residues, c0_i, c1_i) in izip!(
            p.coefficients().outer_iter(),
            self.c0.chunks(self.decomposition_count),
            self.c1.chunks(self.decomposition_count)
        ) {
            for (j, (c0_ij, c1_ij)) in c0_i.iter().zip(c1_i.iter()).enumerate() {
                let (c0_ij, c1_ij) = if level == 0 {
                    (c0_ij.clone(), c1_ij.clone())
                } else {
                    (
                        self.par.drop_to_level(c0_ij, level)?,
                        self.par.drop_to_level(c1_ij, level)?,
                    )
                };
                let shift = self.base_log * j;
                let digits = residues
                    .iter()
                    .map(|r| (*r >> shift) & mask)
                    .collect::<Vec<u64>>();
                let mut d = Poly::try_convert_from(digits, ctx, false, Representation::PowerBasis)?;
                d.change_representation(Representation::Ntt);

                c0 += &(&d * &c0_ij);
                d *= &c1_ij;
                c1 += &d;
            }
        }
        Ok((c0, c1))
    }

    /// Relinearize an "extended" ciphertext (c0, c1, c2) into a [`Ciphertext`]
    pub fn relinearizes(&self, ct: &mut Ciphertext) -> Result<()> {
        if ct.len() != 3 {
            return Err(Error::CiphertextSize(ct.len(), 3));
        }
        if ct.par != self.par {
            return Err(Error::DefaultError(
                "Incompatible CKKS parameters".to_string(),
            ));
        }

        let (c0, c1) = self.key_switch(&ct.c[2], ct.level)?;
        ct.c[0] += &c0;
        ct.c[1] += &c1;
        ct.c.truncate(2);
        Ok(())
    }
}
