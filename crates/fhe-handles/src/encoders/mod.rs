//! Conversions between real numbers and plaintexts.

mod binary_fractional;
mod ckks;

pub use binary_fractional::BinaryFractionalEncoder;
pub use ckks::CkksEncoder;
