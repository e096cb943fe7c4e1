#![crate_name = "fhe_handles"]
#![warn(missing_docs, unused_imports)]

//! A handle-based facade over the BFV and CKKS homomorphic encryption
//! schemes.
//!
//! Every object of the scheme (parameters, context, keys, encryptor,
//! decryptor, evaluator, encoders, plaintexts and ciphertexts) is a typed Rust
//! value released on drop. The same objects are exposed to C as opaque
//! handles through the [`capi`] module, where each handle is verified before
//! use.
//!
//! ```
//! use fhe_handles::{
//!     BinaryFractionalEncoder, Context, Decryptor, EncryptionParameters, Encryptor, Evaluator,
//!     KeyGenerator,
//! };
//!
//! # fn main() -> fhe_handles::Result<()> {
//! let parameters = EncryptionParameters::bfv_default();
//! let context = Context::new(&parameters)?;
//! let keygen = KeyGenerator::new(&context)?;
//! let encryptor = Encryptor::new(&context, &keygen.public_key())?;
//! let decryptor = Decryptor::new(&context, &keygen.secret_key())?;
//! let evaluator = Evaluator::new(&context);
//! let encoder = BinaryFractionalEncoder::new(&parameters)?;
//!
//! let mut a = encryptor.encrypt(&encoder.encode(2.0)?)?;
//! let b = encryptor.encrypt(&encoder.encode(3.5)?)?;
//! evaluator.add_inplace(&mut a, &b)?;
//! assert_eq!(encoder.decode(&decryptor.decrypt(&a)?)?, 5.5);
//! # Ok(())
//! # }
//! ```

mod ciphertext;
mod context;
mod encoders;
mod encryptor;
mod errors;
mod evaluator;
mod handle;
mod keys;
mod parameters;
mod plaintext;

pub mod capi;

pub use ciphertext::Ciphertext;
pub use context::Context;
pub use encoders::{BinaryFractionalEncoder, CkksEncoder};
pub use encryptor::{Decryptor, Encryptor};
pub use errors::{Error, Result};
pub use evaluator::Evaluator;
pub use handle::HandleKind;
pub use keys::{KeyGenerator, PublicKey, RelinKeys, SecretKey};
pub use parameters::{coeff_modulus_128, EncryptionParameters, SchemeType};
pub use plaintext::Plaintext;
