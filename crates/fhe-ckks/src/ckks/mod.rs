#![warn(missing_docs, unused_imports)]

//! The CKKS encryption scheme.

mod ciphertext;
mod encoding;
mod keys;
mod ops;
mod parameters;
mod plaintext;

pub use ciphertext::Ciphertext;
pub use encoding::Encoding;
pub use keys::{PublicKey, RelinearizationKey, SecretKey};
pub use parameters::{CkksParameters, CkksParametersBuilder};
pub use plaintext::Plaintext;

/// Returns whether two scales are equal up to floating-point rounding.
pub(crate) fn scales_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= 16.0 * f64::EPSILON * a.abs().max(b.abs())
}
