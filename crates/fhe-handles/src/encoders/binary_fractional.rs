//! Fixed-point encoding of real numbers into BFV plaintexts.

use crate::{EncryptionParameters, Error, Plaintext, Result, SchemeType};

/// Encodes real numbers as BFV plaintext polynomials in binary.
///
/// The binary digits of the integer part are the coefficients of `1, x, x^2,
/// ...` up to `integer_coeff_count`. Since `x^n = -1` in the plaintext ring,
/// the fractional digit of weight `2^-i` is stored as the coefficient `-1` of
/// `x^(n - i)`, for `i` up to `fraction_coeff_count`. Negative numbers negate
/// every coefficient modulo the plaintext modulus.
///
/// Additions and multiplications of encodings match the operations on the
/// numbers as long as no coefficient wraps around the plaintext modulus and
/// the fractional part does not grow into the integer part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFractionalEncoder {
    plain_modulus: u64,
    degree: usize,
    integer_coeff_count: usize,
    fraction_coeff_count: usize,
}

impl BinaryFractionalEncoder {
    /// Create an encoder for BFV parameters, with `n/2 - 1` integer and
    /// `n/2 - 1` fractional binary digits.
    pub fn new(parameters: &EncryptionParameters) -> Result<Self> {
        if parameters.scheme() != SchemeType::Bfv {
            return Err(Error::SchemeMismatch {
                found: parameters.scheme(),
                expected: SchemeType::Bfv,
            });
        }
        let plain_modulus = parameters.plain_modulus().ok_or_else(|| {
            Error::InvalidParameters("BFV requires a plaintext modulus".to_string())
        })?;
        if plain_modulus < 3 {
            return Err(Error::InvalidParameters(format!(
                "The plaintext modulus {plain_modulus} cannot represent signed digits"
            )));
        }
        let degree = parameters.poly_modulus_degree();
        if degree < 4 {
            return Err(Error::InvalidParameters(format!(
                "The degree {degree} is too small for a binary fractional encoding"
            )));
        }

        Ok(Self {
            plain_modulus,
            degree,
            integer_coeff_count: degree / 2 - 1,
            fraction_coeff_count: degree / 2 - 1,
        })
    }

    /// Returns the number of binary digits of the integer part.
    pub fn integer_coeff_count(&self) -> usize {
        self.integer_coeff_count
    }

    /// Returns the number of binary digits of the fractional part.
    pub fn fraction_coeff_count(&self) -> usize {
        self.fraction_coeff_count
    }

    /// Encode a real number. The fractional part is truncated after
    /// `fraction_coeff_count` binary digits.
    pub fn encode(&self, value: f64) -> Result<Plaintext> {
        if !value.is_finite() {
            return Err(Error::EncodingOutOfRange(
                value,
                "the value is not finite".to_string(),
            ));
        }

        let (one, minus_one) = if value < 0.0 {
            (self.plain_modulus - 1, 1)
        } else {
            (1, self.plain_modulus - 1)
        };
        let magnitude = value.abs();
        let mut coefficients = vec![0u64; self.degree];

        let mut integer_part = magnitude.trunc();
        let mut i = 0;
        while integer_part >= 1.0 {
            if i == self.integer_coeff_count {
                return Err(Error::EncodingOutOfRange(
                    value,
                    format!(
                        "the integer part needs more than {} bits",
                        self.integer_coeff_count
                    ),
                ));
            }
            if integer_part % 2.0 == 1.0 {
                coefficients[i] = one;
            }
            integer_part = (integer_part / 2.0).trunc();
            i += 1;
        }

        let mut fraction = magnitude - magnitude.trunc();
        for i in 1..=self.fraction_coeff_count {
            if fraction == 0.0 {
                break;
            }
            fraction *= 2.0;
            if fraction >= 1.0 {
                fraction -= 1.0;
                coefficients[self.degree - i] = minus_one;
            }
        }

        Ok(Plaintext::bfv(self.plain_modulus, coefficients))
    }

    /// Decode a plaintext into a real number.
    ///
    /// Only the coefficients of the integer and fractional digits are read.
    /// The coefficients of `x^(n/2 - 1)` and `x^(n/2)`, between the two
    /// parts, are ignored: a product whose digits grow into them decodes
    /// without their contribution.
    pub fn decode(&self, pt: &Plaintext) -> Result<f64> {
        let (plain_modulus, coefficients) = pt.as_bfv()?;
        if plain_modulus != self.plain_modulus {
            return Err(Error::InvalidParameters(format!(
                "Plaintext modulus {plain_modulus} does not match the encoder plaintext modulus {}",
                self.plain_modulus
            )));
        }

        let centered = |index: usize| -> f64 {
            let c = coefficients.get(index).copied().unwrap_or_default();
            if c > self.plain_modulus / 2 {
                -((self.plain_modulus - c) as f64)
            } else {
                c as f64
            }
        };

        let integer_part = (0..self.integer_coeff_count)
            .map(|i| centered(i) * 2f64.powi(i as i32))
            .sum::<f64>();
        let fractional_part = (1..=self.fraction_coeff_count)
            .map(|i| -centered(self.degree - i) * 2f64.powi(-(i as i32)))
            .sum::<f64>();
        Ok(integer_part + fractional_part)
    }
}

#[cfg(test)]
mod tests {
    use super::BinaryFractionalEncoder;
    use crate::plaintext::PlaintextKind;
    use crate::{EncryptionParameters, Error, Plaintext, SchemeType};
    use proptest::prelude::*;
    use std::error::Error as StdError;

    fn coefficients(pt: &Plaintext) -> Vec<u64> {
        match &pt.kind {
            PlaintextKind::Bfv { coefficients, .. } => coefficients.to_vec(),
            PlaintextKind::Ckks { .. } => panic!("not a BFV plaintext"),
        }
    }

    #[test]
    fn layout() -> Result<(), Box<dyn StdError>> {
        let encoder = BinaryFractionalEncoder::new(&EncryptionParameters::bfv_default())?;
        assert_eq!(encoder.integer_coeff_count(), 1023);
        assert_eq!(encoder.fraction_coeff_count(), 1023);

        // 5.75 = 1 + x^2 - x^2047 - x^2046
        let c = coefficients(&encoder.encode(5.75)?);
        assert_eq!(c.len(), 2048);
        assert_eq!(&c[..4], &[1, 0, 1, 0]);
        assert_eq!(&c[2046..], &[255, 255]);
        assert_eq!(c.iter().filter(|ci| **ci != 0).count(), 4);

        // Negative values negate every coefficient.
        let c = coefficients(&encoder.encode(-5.75)?);
        assert_eq!(&c[..4], &[255, 0, 255, 0]);
        assert_eq!(&c[2046..], &[1, 1]);
        Ok(())
    }

    #[test]
    fn encode_decode() -> Result<(), Box<dyn StdError>> {
        let encoder = BinaryFractionalEncoder::new(&EncryptionParameters::bfv_default())?;
        for value in [0.0, 1.0, -1.0, 3.5, -2.25, 1e10 + 0.125, 2f64.powi(-30)] {
            assert_eq!(encoder.decode(&encoder.encode(value)?)?, value);
        }
        Ok(())
    }

    #[test]
    fn ring_arithmetic() -> Result<(), Box<dyn StdError>> {
        // 1.5 * -2 = (1 - x^(n-1)) * -x = -x - 1 = -3
        let encoder = BinaryFractionalEncoder::new(&EncryptionParameters::bfv_default())?;
        let mut c = vec![0u64; 2048];
        c[0] = 255;
        c[1] = 255;
        assert_eq!(encoder.decode(&Plaintext::bfv(256, c))?, -3.0);
        Ok(())
    }

    #[test]
    fn middle_coefficients_are_ignored() -> Result<(), Box<dyn StdError>> {
        let mut parameters = EncryptionParameters::bfv_default();
        parameters.set_poly_modulus_degree(16);
        let encoder = BinaryFractionalEncoder::new(&parameters)?;
        let mut c = coefficients(&encoder.encode(2.5)?);
        c[7] = 1;
        c[8] = 255;
        assert_eq!(encoder.decode(&Plaintext::bfv(256, c.clone()))?, 2.5);

        // The last digits on either side are still read.
        c[6] = 1;
        c[9] = 255;
        assert_eq!(encoder.decode(&Plaintext::bfv(256, c))?, 2.5 + 64.0 + 0.0078125);
        Ok(())
    }

    #[test]
    fn invalid() -> Result<(), Box<dyn StdError>> {
        assert!(matches!(
            BinaryFractionalEncoder::new(&EncryptionParameters::ckks_default()),
            Err(Error::SchemeMismatch { .. })
        ));
        assert!(matches!(
            BinaryFractionalEncoder::new(&EncryptionParameters::new(SchemeType::Bfv)),
            Err(Error::InvalidParameters(_))
        ));

        let mut parameters = EncryptionParameters::bfv_default();
        parameters.set_poly_modulus_degree(16);
        let encoder = BinaryFractionalEncoder::new(&parameters)?;
        assert!(encoder.encode(127.0).is_ok());
        assert!(matches!(
            encoder.encode(128.0),
            Err(Error::EncodingOutOfRange(..))
        ));
        assert!(matches!(
            encoder.encode(f64::INFINITY),
            Err(Error::EncodingOutOfRange(..))
        ));

        let mut parameters = EncryptionParameters::bfv_default();
        parameters.set_plain_modulus(1024);
        let other = BinaryFractionalEncoder::new(&parameters)?;
        let encoder = BinaryFractionalEncoder::new(&EncryptionParameters::bfv_default())?;
        assert!(matches!(
            other.decode(&encoder.encode(1.0)?),
            Err(Error::InvalidParameters(_))
        ));
        Ok(())
    }

    proptest! {
        #[test]
        fn encode_decode_proptest(integer in -1_000_000i64..1_000_000, fraction in 0u32..1024) {
            let encoder = BinaryFractionalEncoder::new(&EncryptionParameters::bfv_default()).unwrap();
            let value = integer as f64 + fraction as f64 / 1024.0;
            prop_assert_eq!(encoder.decode(&encoder.encode(value).unwrap()).unwrap(), value);
        }
    }
}
