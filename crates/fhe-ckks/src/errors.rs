use thiserror::Error;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum encapsulating all the possible errors from this library.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Indicates that an error from the underlying mathematical library was
    /// encountered.
    #[error("{0}")]
    MathError(fhe_math::Error),

    /// Indicates a serialization error.
    #[error("Serialization error")]
    SerializationError,

    /// Indicates that an input is invalid.
    #[error("{0}")]
    UnspecifiedInput(String),

    /// Indicates that two operands carry different scales.
    #[error("Scale mismatch: found {0}, expected {1}")]
    ScaleMismatch(f64, f64),

    /// Indicates that a value cannot be encoded at the requested scale.
    #[error("Value {value} does not fit in the ciphertext modulus at scale {scale}")]
    ValueOutOfRange {
        /// The value to encode.
        value: f64,
        /// The requested scale.
        scale: f64,
    },

    /// Indicates that a ciphertext has an unexpected number of polynomials.
    #[error("Unexpected ciphertext size: found {0}, expected {1}")]
    CiphertextSize(usize, usize),

    /// Indicates that too few polynomials were provided for a ciphertext.
    #[error("Too few polynomials: {0} is below the minimum of 2")]
    TooFewPolynomials(usize),

    /// Indicates a level outside of the modulus chain.
    #[error("Invalid level {0}: the maximum level is {1}")]
    InvalidLevel(usize, usize),

    /// Indicates that two operands are at different levels.
    #[error("Level mismatch: found {0}, expected {1}")]
    LevelMismatch(usize, usize),

    /// Indicates a parameter error.
    #[error("{0}")]
    ParametersError(ParametersError),

    /// Indicates a default error.
    #[error("{0}")]
    DefaultError(String),
}

impl From<fhe_math::Error> for Error {
    fn from(e: fhe_math::Error) -> Self {
        Error::MathError(e)
    }
}

impl From<ParametersError> for Error {
    fn from(e: ParametersError) -> Self {
        Error::ParametersError(e)
    }
}

/// Separate enum to indicate parameters-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParametersError {
    /// Indicates that the degree is invalid.
    #[error("Invalid degree: {0} is not a power of 2 larger than 8")]
    InvalidDegree(usize),

    /// Indicates that the moduli sizes are invalid.
    #[error("Invalid modulus size: {0}, expected an integer between {1} and {2}")]
    InvalidModulusSize(usize, usize, usize),

    /// Indicates that there exists not enough primes of this size.
    #[error("Not enough primes of size {0} for polynomials of degree {1}")]
    NotEnoughPrimes(usize, usize),

    /// Indicates that the error variance is invalid.
    #[error("Invalid variance: {0}, expected an integer between 1 and 16")]
    InvalidVariance(usize),

    /// Indicates that the decomposition count is invalid.
    #[error("Invalid decomposition count: {0}, expected an integer between 1 and {1}")]
    InvalidDecompositionCount(usize, usize),

    /// Indicates that too many parameters were specified.
    #[error("{0}")]
    TooManySpecified(String),

    /// Indicates that too few parameters were specified.
    #[error("{0}")]
    TooFewSpecified(String),
}
