#![crate_name = "fhe_ckks"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! The Cheon-Kim-Kim-Song (CKKS) approximate homomorphic encryption scheme,
//! written against the polynomial arithmetic of `fhe-math` and the object
//! model of `fhe-traits`.
//!
//! Real numbers are encoded in the first slot of the canonical embedding and
//! scaled by a fixed-point factor carried alongside every plaintext and
//! ciphertext. Ciphertexts live at a level of the modulus chain; rescaling
//! divides both the value and the scale by the last modulus of the level.

mod errors;
mod proto;

pub mod ckks;
pub use errors::{Error, ParametersError, Result};
