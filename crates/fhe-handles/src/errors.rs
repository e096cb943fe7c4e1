use crate::{HandleKind, SchemeType};
use thiserror::Error;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum encapsulating all the possible errors from this library.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Indicates an error from the BFV scheme.
    #[error("{0}")]
    Bfv(fhe::Error),

    /// Indicates an error from the CKKS scheme.
    #[error("{0}")]
    Ckks(fhe_ckks::Error),

    /// Indicates that an object of one scheme was used with the other one.
    #[error("Scheme mismatch: found {found}, expected {expected}")]
    SchemeMismatch {
        /// The scheme of the object.
        found: SchemeType,
        /// The scheme of the component.
        expected: SchemeType,
    },

    /// Indicates that an object was derived from another context.
    #[error("The object belongs to a different context")]
    ContextMismatch,

    /// Indicates that the encryption parameters are inconsistent.
    #[error("Invalid encryption parameters: {0}")]
    InvalidParameters(String),

    /// Indicates that two CKKS operands carry different scales.
    #[error("Scale mismatch: {0} and {1}")]
    ScaleMismatch(f64, f64),

    /// Indicates that two CKKS operands are at different levels.
    #[error("Level mismatch: {0} and {1}")]
    LevelMismatch(usize, usize),

    /// Indicates that a value cannot be represented by an encoder.
    #[error("Cannot encode {0}: {1}")]
    EncodingOutOfRange(f64, String),

    /// Indicates that an operation is not available for a scheme or an input.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Indicates that a null handle was passed across the C surface.
    #[error("Null {0} handle")]
    NullHandle(HandleKind),

    /// Indicates that a handle is not live or is not of the expected kind.
    #[error("Invalid {0} handle")]
    InvalidHandle(HandleKind),

    /// Indicates that a panic was caught at the C surface.
    #[error("Panic: {0}")]
    Panic(String),
}

impl From<fhe::Error> for Error {
    fn from(e: fhe::Error) -> Self {
        Error::Bfv(e)
    }
}

impl From<fhe_ckks::Error> for Error {
    fn from(e: fhe_ckks::Error) -> Self {
        Error::Ckks(e)
    }
}
