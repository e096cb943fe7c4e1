//! Encoding of real numbers into CKKS plaintexts.

use crate::{Context, Plaintext, Result};
use fhe_ckks::ckks::Encoding;
use fhe_traits::{FheDecoder, FheEncoder};

/// Encodes one real number per plaintext at a caller-chosen scale.
#[derive(Debug, Clone)]
pub struct CkksEncoder {
    context: Context,
}

impl CkksEncoder {
    /// Create an encoder for a CKKS context.
    pub fn new(context: &Context) -> Result<Self> {
        context.ckks()?;
        Ok(Self {
            context: context.clone(),
        })
    }

    /// Encode a real number at the given scale. Larger scales give finer
    /// precision and consume more of the coefficient modulus.
    pub fn encode(&self, value: f64, scale: f64) -> Result<Plaintext> {
        let par = self.context.ckks()?;
        let pt = fhe_ckks::ckks::Plaintext::try_encode(value, Encoding::with_scale(scale), par)?;
        Ok(Plaintext::ckks(&self.context, pt))
    }

    /// Decode a plaintext of this context.
    pub fn decode(&self, pt: &Plaintext) -> Result<f64> {
        Ok(f64::try_decode(pt.as_ckks(&self.context)?, None)?)
    }
}
