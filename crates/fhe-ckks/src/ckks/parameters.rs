//! Create parameters for the CKKS encryption scheme

use crate::{Error, ParametersError, Result};
use fhe_math::{
    rns::RnsContext,
    rq::{traits::TryConvertFrom, Context, Poly, Representation},
    zq::{primes::generate_prime, Modulus},
};
use fhe_traits::FheParameters;
use itertools::izip;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::fmt::Debug;
use std::sync::Arc;

/// Parameters for the CKKS encryption scheme.
#[derive(PartialEq, Eq)]
pub struct CkksParameters {
    /// Number of coefficients in a polynomial.
    polynomial_degree: usize,

    /// Vector of coprime moduli q_i for the ciphertext.
    pub(crate) moduli: Box<[u64]>,

    /// Vector of the sizes of the coprime moduli q_i for the ciphertext.
    moduli_sizes: Box<[usize]>,

    /// Error variance
    pub(crate) variance: usize,

    /// Context for the ciphertext polynomials
    pub(crate) ctx: Arc<Context>,

    /// Contexts of the ciphertexts at every level; level l drops the last l
    /// moduli.
    ctx_levels: Box<[Arc<Context>]>,

    /// For every level l but the last one, the inverse of the last modulus
    /// of the level modulo each of the other moduli.
    inv_last_moduli: Box<[Box<[u64]>]>,

    /// CRT coefficients (q / q_i) * ((q / q_i)^(-1) mod q_i) of the modulus q
    pub(crate) garner: Box<[BigUint]>,
}

impl Debug for CkksParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CkksParameters")
            .field("polynomial_degree", &self.polynomial_degree)
            .field("moduli", &self.moduli)
            .field("variance", &self.variance)
            .finish()
    }
}

impl FheParameters for CkksParameters {}

impl CkksParameters {
    /// Returns the underlying polynomial degree
    pub const fn degree(&self) -> usize {
        self.polynomial_degree
    }

    /// Returns a reference to the ciphertext moduli
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Returns a reference to the ciphertext moduli sizes
    pub fn moduli_sizes(&self) -> &[usize] {
        &self.moduli_sizes
    }

    /// Returns the error variance
    pub const fn variance(&self) -> usize {
        self.variance
    }

    /// Returns the number of bits of the ciphertext modulus q.
    pub fn modulus_bits(&self) -> usize {
        self.ctx.modulus().bits() as usize
    }

    /// Returns the maximum level, at which a single modulus remains.
    pub fn max_level(&self) -> usize {
        self.moduli.len() - 1
    }

    /// Returns the context of the ciphertext polynomials at a level.
    pub fn ctx_at_level(&self, level: usize) -> Result<&Arc<Context>> {
        self.ctx_levels
            .get(level)
            .ok_or(Error::InvalidLevel(level, self.max_level()))
    }

    /// Returns the level of a polynomial context of these parameters.
    pub(crate) fn level_of(&self, ctx: &Arc<Context>) -> Option<usize> {
        self.ctx_levels.iter().position(|c| c == ctx)
    }

    /// Reduce a polynomial modulo the moduli of a deeper level, dropping the
    /// residues of the other moduli.
    pub(crate) fn drop_to_level(&self, p: &Poly, level: usize) -> Result<Poly> {
        let ctx = self.ctx_at_level(level)?;
        let count = self.moduli.len() - level;
        let rows = p.coefficients();
        if rows.nrows() < count {
            return Err(Error::InvalidLevel(level, self.max_level()));
        }
        let coefficients = rows
            .outer_iter()
            .take(count)
            .flat_map(|row| row.to_vec())
            .collect::<Vec<u64>>();
        Ok(Poly::try_convert_from(
            coefficients,
            ctx,
            false,
            p.representation().clone(),
        )?)
    }

    /// Divide a polynomial of the given level by the last modulus of the
    /// level, rounding to the nearest integer, and return it at the next level
    /// in Ntt representation.
    pub(crate) fn divide_by_last_modulus(&self, p: &Poly, level: usize) -> Result<Poly> {
        let inverses = self
            .inv_last_moduli
            .get(level)
            .ok_or(Error::InvalidLevel(level + 1, self.max_level()))?;
        let count = self.moduli.len() - level;
        let q_last = Modulus::new(self.moduli[count - 1])?;
        let half = self.moduli[count - 1] >> 1;

        let mut p = p.clone();
        p.change_representation(Representation::PowerBasis);
        let rows = p.coefficients();
        let last = rows.row(count - 1);

        let mut coefficients = Vec::with_capacity((count - 1) * self.polynomial_degree);
        for (row, qi, inv) in izip!(rows.outer_iter(), self.moduli.iter(), inverses.iter()) {
            let qi = Modulus::new(*qi)?;
            let half_qi = qi.reduce(half);
            // (x + half - ((x + half) mod q_last)) / q_last
            coefficients.extend(izip!(row.iter(), last.iter()).map(|(x, r)| {
                let r = qi.reduce(q_last.add(*r, half));
                qi.mul(qi.sub(qi.add(*x, half_qi), r), *inv)
            }));
        }

        let mut divided = Poly::try_convert_from(
            coefficients,
            self.ctx_at_level(level + 1)?,
            false,
            Representation::PowerBasis,
        )?;
        divided.change_representation(Representation::Ntt);
        Ok(divided)
    }

    #[cfg(test)]
    pub fn default_arc(num_moduli: usize, degree: usize) -> Arc<Self> {
        CkksParametersBuilder::new()
            .set_degree(degree)
            .set_moduli_sizes(&vec![62usize; num_moduli])
            .build_arc()
            .unwrap()
    }
}

/// Builder for parameters for the CKKS encryption scheme.
#[derive(Debug)]
pub struct CkksParametersBuilder {
    degree: usize,
    variance: usize,
    ciphertext_moduli: Vec<u64>,
    ciphertext_moduli_sizes: Vec<usize>,
}

impl CkksParametersBuilder {
    /// Creates a new instance of the builder
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            degree: Default::default(),
            variance: 10,
            ciphertext_moduli: Default::default(),
            ciphertext_moduli_sizes: Default::default(),
        }
    }

    /// Sets the polynomial degree. Building fails if the degree is not
    /// a power of two larger or equal to 8.
    pub fn set_degree(&mut self, degree: usize) -> &mut Self {
        self.degree = degree;
        self
    }

    /// Sets the sizes of the ciphertext moduli.
    /// Only one of `set_moduli_sizes` and `set_moduli`
    /// can be specified.
    pub fn set_moduli_sizes(&mut self, sizes: &[usize]) -> &mut Self {
        sizes.clone_into(&mut self.ciphertext_moduli_sizes);
        self
    }

    /// Sets the ciphertext moduli to use.
    /// Only one of `set_moduli_sizes` and `set_moduli`
    /// can be specified.
    pub fn set_moduli(&mut self, moduli: &[u64]) -> &mut Self {
        moduli.clone_into(&mut self.ciphertext_moduli);
        self
    }

    /// Sets the error variance. Building fails if the variance is not between
    /// one and sixteen.
    pub fn set_variance(&mut self, variance: usize) -> &mut Self {
        self.variance = variance;
        self
    }

    /// Generate distinct NTT-friendly ciphertext moduli with the specified
    /// sizes.
    fn generate_moduli(moduli_sizes: &[usize], degree: usize) -> Result<Vec<u64>> {
        let mut moduli = vec![];
        for size in moduli_sizes {
            if *size > 62 || *size < 10 {
                return Err(ParametersError::InvalidModulusSize(*size, 10, 62).into());
            }

            let mut upper_bound = 1 << size;
            loop {
                if let Some(prime) = generate_prime(*size, 2 * degree as u64, upper_bound) {
                    if !moduli.contains(&prime) {
                        moduli.push(prime);
                        break;
                    } else {
                        upper_bound = prime;
                    }
                } else {
                    return Err(ParametersError::NotEnoughPrimes(*size, degree).into());
                }
            }
        }

        Ok(moduli)
    }

    /// Build a new `CkksParameters` inside an `Arc`.
    pub fn build_arc(&self) -> Result<Arc<CkksParameters>> {
        self.build().map(Arc::new)
    }

    /// Build a new `CkksParameters`.
    pub fn build(&self) -> Result<CkksParameters> {
        if self.degree < 8 || !self.degree.is_power_of_two() {
            return Err(ParametersError::InvalidDegree(self.degree).into());
        }

        if !(1..=16).contains(&self.variance) {
            return Err(ParametersError::InvalidVariance(self.variance).into());
        }

        if !self.ciphertext_moduli.is_empty() && !self.ciphertext_moduli_sizes.is_empty() {
            return Err(ParametersError::TooManySpecified(
                "Only one of `ciphertext_moduli` and `ciphertext_moduli_sizes` can be specified"
                    .to_string(),
            )
            .into());
        } else if self.ciphertext_moduli.is_empty() && self.ciphertext_moduli_sizes.is_empty() {
            return Err(ParametersError::TooFewSpecified(
                "One of `ciphertext_moduli` and `ciphertext_moduli_sizes` must be specified"
                    .to_string(),
            )
            .into());
        }

        let moduli = if self.ciphertext_moduli_sizes.is_empty() {
            self.ciphertext_moduli.clone()
        } else {
            Self::generate_moduli(&self.ciphertext_moduli_sizes, self.degree)?
        };
        let moduli_sizes = moduli
            .iter()
            .map(|m| 64 - m.leading_zeros() as usize)
            .collect::<Vec<_>>();

        let ctx = Arc::new(Context::new(&moduli, self.degree)?);
        let mut ctx_levels = vec![ctx.clone()];
        for count in (1..moduli.len()).rev() {
            ctx_levels.push(Arc::new(Context::new(&moduli[..count], self.degree)?));
        }
        let inv_last_moduli = (1..moduli.len())
            .rev()
            .map(|last| {
                moduli[..last]
                    .iter()
                    .map(|qi| {
                        BigUint::from(moduli[last])
                            .modpow(&BigUint::from(qi - 2), &BigUint::from(*qi))
                            .to_u64()
                            .ok_or_else(|| Error::DefaultError("Invalid modulus".to_string()))
                    })
                    .collect::<Result<Box<[u64]>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        let rns = RnsContext::new(&moduli)?;
        let garner = (0..moduli.len())
            .map(|i| {
                rns.get_garner(i)
                    .cloned()
                    .ok_or_else(|| Error::DefaultError("Missing CRT coefficient".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CkksParameters {
            polynomial_degree: self.degree,
            moduli: moduli.into_boxed_slice(),
            moduli_sizes: moduli_sizes.into_boxed_slice(),
            variance: self.variance,
            ctx,
            ctx_levels: ctx_levels.into_boxed_slice(),
            inv_last_moduli: inv_last_moduli.into_boxed_slice(),
            garner: garner.into_boxed_slice(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CkksParameters, CkksParametersBuilder};
    use crate::{Error, ParametersError};
    use std::error::Error as StdError;

    #[test]
    fn default() {
        let params = CkksParameters::default_arc(1, 16);
        assert_eq!(params.moduli().len(), 1);
        assert_eq!(params.degree(), 16);

        let params = CkksParameters::default_arc(3, 16);
        assert_eq!(params.moduli().len(), 3);
        assert_eq!(params.moduli_sizes(), &[62, 62, 62]);
        assert_eq!(params.variance(), 10);
    }

    #[test]
    fn ciphertext_moduli() -> Result<(), Box<dyn StdError>> {
        let params = CkksParametersBuilder::new()
            .set_degree(16)
            .set_moduli_sizes(&[62, 62, 62, 61, 60, 11])
            .build()?;
        assert_eq!(
            params.moduli.to_vec(),
            &[
                4611686018427387617,
                4611686018427387329,
                4611686018427387073,
                2305843009213693921,
                1152921504606845473,
                2017
            ]
        );

        let params = CkksParametersBuilder::new()
            .set_degree(16)
            .set_moduli(&[
                4611686018427387617,
                4611686018427387329,
                4611686018427387073,
                2305843009213693921,
                1152921504606845473,
                2017,
            ])
            .build()?;
        assert_eq!(params.moduli_sizes.to_vec(), &[62, 62, 62, 61, 60, 11]);
        assert_eq!(params.modulus_bits(), 318);

        Ok(())
    }

    #[test]
    fn invalid_parameters() {
        assert_eq!(
            CkksParametersBuilder::new()
                .set_degree(12)
                .set_moduli_sizes(&[62])
                .build()
                .unwrap_err(),
            Error::ParametersError(ParametersError::InvalidDegree(12))
        );
        assert_eq!(
            CkksParametersBuilder::new()
                .set_degree(16)
                .set_moduli_sizes(&[63])
                .build()
                .unwrap_err(),
            Error::ParametersError(ParametersError::InvalidModulusSize(63, 10, 62))
        );
        assert_eq!(
            CkksParametersBuilder::new()
                .set_degree(16)
                .set_moduli_sizes(&[62])
                .set_variance(0)
                .build()
                .unwrap_err(),
            Error::ParametersError(ParametersError::InvalidVariance(0))
        );
        assert!(matches!(
            CkksParametersBuilder::new().set_degree(16).build(),
            Err(Error::ParametersError(ParametersError::TooFewSpecified(_)))
        ));
        assert!(matches!(
            CkksParametersBuilder::new()
                .set_degree(16)
                .set_moduli(&[2017])
                .set_moduli_sizes(&[62])
                .build(),
            Err(Error::ParametersError(ParametersError::TooManySpecified(_)))
        ));
    }
}
