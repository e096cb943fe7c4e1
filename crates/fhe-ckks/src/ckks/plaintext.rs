//! Plaintext type in the CKKS encryption scheme.

use crate::ckks::{CkksParameters, Encoding};
use crate::{Error, Result};
use fhe_math::rq::{traits::TryConvertFrom, Poly, Representation};
use fhe_traits::{FheDecoder, FheEncoder, FheParametrized, FhePlaintext};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::f64::consts::PI;
use std::sync::Arc;

/// A plaintext object, that encodes a real number at a given scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Plaintext {
    /// The parameters of the underlying CKKS encryption scheme.
    pub(crate) par: Arc<CkksParameters>,
    /// The plaintext as a polynomial.
    pub(crate) poly_ntt: Poly,
    /// The scale of the encoding.
    pub(crate) scale: f64,
    /// The level of the plaintext.
    pub(crate) level: usize,
}

impl FheParametrized for Plaintext {
    type Parameters = CkksParameters;
}

impl FhePlaintext for Plaintext {
    type Encoding = Encoding;
}

impl Plaintext {
    /// Returns the scale of this plaintext.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the level of this plaintext.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Returns the encoding of this plaintext.
    pub fn encoding(&self) -> Encoding {
        Encoding::with_scale_at_level(self.scale, self.level)
    }

    /// Returns this plaintext at a deeper level, with the same value and
    /// scale.
    pub fn at_level(&self, level: usize) -> Result<Self> {
        if level < self.level {
            return Err(Error::LevelMismatch(level, self.level));
        }
        Ok(Self {
            par: self.par.clone(),
            poly_ntt: self.par.drop_to_level(&self.poly_ntt, level)?,
            scale: self.scale,
            level,
        })
    }
}

/// Lift a residue modulo q to its centered representative as a float.
fn centered_to_f64(c: &BigUint, modulus: &BigUint, half: &BigUint) -> f64 {
    if c > half {
        -(modulus - c).to_f64().unwrap_or(f64::INFINITY)
    } else {
        c.to_f64().unwrap_or(f64::INFINITY)
    }
}

impl FheEncoder<f64> for Plaintext {
    type Error = Error;

    /// Encode the value in the first slot of the canonical embedding, every
    /// other slot being zero. With n the degree, the j-th coefficient is
    /// `round(2 * value * scale / n * cos(pi * j / n))`.
    fn try_encode(value: f64, encoding: Encoding, par: &Arc<CkksParameters>) -> Result<Self> {
        let scale = encoding.scale;
        if !value.is_finite() {
            return Err(Error::UnspecifiedInput(format!(
                "Cannot encode the non-finite value {value}"
            )));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::UnspecifiedInput(format!(
                "The scale must be positive, found {scale}"
            )));
        }

        let ctx = par.ctx_at_level(encoding.level)?;
        let n = par.degree();
        let magnitude = 2.0 * value * scale / n as f64;
        if magnitude.abs() >= 2f64.powi(62)
            || magnitude.abs().log2() + 2.0 >= ctx.modulus().bits() as f64
        {
            return Err(Error::ValueOutOfRange { value, scale });
        }

        let coefficients = (0..n)
            .map(|j| (magnitude * (PI * j as f64 / n as f64).cos()).round() as i64)
            .collect::<Vec<_>>();
        let mut poly_ntt = Poly::try_convert_from(
            coefficients.as_slice(),
            ctx,
            false,
            Representation::PowerBasis,
        )?;
        poly_ntt.change_representation(Representation::Ntt);

        Ok(Self {
            par: par.clone(),
            poly_ntt,
            scale,
            level: encoding.level,
        })
    }
}

impl FheDecoder<Plaintext> for f64 {
    type Error = Error;

    /// Evaluate the real part of the plaintext polynomial at the primitive
    /// 2n-th root of unity exp(i * pi / n), and divide by the scale.
    fn try_decode<O>(pt: &Plaintext, encoding: O) -> Result<Self>
    where
        O: Into<Option<Encoding>>,
    {
        let encoding = encoding.into();
        if let Some(encoding) = encoding {
            if !crate::ckks::scales_match(encoding.scale, pt.scale) {
                return Err(Error::ScaleMismatch(encoding.scale, pt.scale));
            }
        }

        let mut p = pt.poly_ntt.clone();
        p.change_representation(Representation::PowerBasis);

        let n = pt.par.degree() as f64;
        let modulus = p.ctx().modulus();
        let half = modulus >> 1usize;
        let value = Vec::<BigUint>::from(&p)
            .iter()
            .enumerate()
            .map(|(j, c)| centered_to_f64(c, modulus, &half) * (PI * j as f64 / n).cos())
            .sum::<f64>();

        Ok(value / pt.scale)
    }
}

#[cfg(test)]
mod tests {
    use crate::ckks::{CkksParameters, Encoding, Plaintext};
    use crate::Error;
    use fhe_traits::{FheDecoder, FheEncoder};
    use proptest::prelude::*;
    use std::error::Error as StdError;

    #[test]
    fn encode_decode() -> Result<(), Box<dyn StdError>> {
        let params = CkksParameters::default_arc(2, 16);
        let encoding = Encoding::with_scale(2f64.powi(30));
        for value in [0.0, 1.0, -1.0, 3.5, -1234.5678, 1e-3] {
            let pt = Plaintext::try_encode(value, encoding, &params)?;
            assert_eq!(pt.scale(), encoding.scale());
            let decoded = f64::try_decode(&pt, encoding)?;
            assert!((decoded - value).abs() < 1e-6, "{decoded} != {value}");
            let decoded = f64::try_decode(&pt, None)?;
            assert!((decoded - value).abs() < 1e-6, "{decoded} != {value}");
        }
        Ok(())
    }

    #[test]
    fn decode_with_wrong_scale() -> Result<(), Box<dyn StdError>> {
        let params = CkksParameters::default_arc(1, 16);
        let pt = Plaintext::try_encode(1.0, Encoding::with_scale(1024.0), &params)?;
        assert_eq!(
            f64::try_decode(&pt, Encoding::with_scale(2048.0)),
            Err(Error::ScaleMismatch(2048.0, 1024.0))
        );
        Ok(())
    }

    #[test]
    fn reject_invalid_values() {
        let params = CkksParameters::default_arc(1, 16);
        let encoding = Encoding::with_scale(2f64.powi(40));
        assert!(matches!(
            Plaintext::try_encode(f64::NAN, encoding, &params),
            Err(Error::UnspecifiedInput(_))
        ));
        assert!(matches!(
            Plaintext::try_encode(1.0, Encoding::with_scale(-1.0), &params),
            Err(Error::UnspecifiedInput(_))
        ));
        assert_eq!(
            Plaintext::try_encode(2f64.powi(30), encoding, &params),
            Err(Error::ValueOutOfRange {
                value: 2f64.powi(30),
                scale: 2f64.powi(40)
            })
        );
    }

    #[test]
    fn encode_at_level() -> Result<(), Box<dyn StdError>> {
        let params = CkksParameters::default_arc(3, 16);
        let encoding = Encoding::with_scale_at_level(2f64.powi(30), 2);
        let pt = Plaintext::try_encode(-12.5, encoding, &params)?;
        assert_eq!(pt.level(), 2);
        assert_eq!(pt.encoding(), encoding);
        assert_eq!(pt.poly_ntt.ctx(), params.ctx_at_level(2)?);
        assert!((f64::try_decode(&pt, encoding)? + 12.5).abs() < 1e-6);

        let pt = Plaintext::try_encode(-12.5, Encoding::with_scale(2f64.powi(30)), &params)?;
        let lowered = pt.at_level(1)?;
        assert_eq!(lowered.level(), 1);
        assert!((f64::try_decode(&lowered, None)? + 12.5).abs() < 1e-6);
        assert_eq!(lowered.at_level(0), Err(Error::LevelMismatch(0, 1)));

        assert_eq!(
            Plaintext::try_encode(1.0, Encoding::with_scale_at_level(1024.0, 3), &params),
            Err(Error::InvalidLevel(3, 2))
        );
        Ok(())
    }

    proptest! {
        #[test]
        fn encode_decode_proptest(value in -1e6f64..1e6) {
            let params = CkksParameters::default_arc(2, 16);
            let encoding = Encoding::with_scale(2f64.powi(40));
            let pt = Plaintext::try_encode(value, encoding, &params).unwrap();
            let decoded = f64::try_decode(&pt, None).unwrap();
            prop_assert!((decoded - value).abs() < 1e-6);
        }
    }
}
