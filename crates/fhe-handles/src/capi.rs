//! Flat C call surface.
//!
//! Every object is exposed as an opaque pointer (a handle) created by an
//! `*_init` function or an accessor, and released by the matching `*_delete`
//! function. Handles are verified against the live-handle registry before
//! use: null, released or wrong-kind handles make the call fail instead of
//! being dereferenced.
//!
//! Failures are reported as a null handle, a non-zero [`FheStatus`], a NaN
//! decoded value or a negative noise budget. The message of the last failure
//! on the calling thread is available from [`fhe_last_error_message`]. Panics
//! are caught at the boundary and reported the same way.
//!
//! Objects are not synchronized: a handle used from several threads must be
//! protected by the caller. Only the registry and the context reference
//! counts are thread-safe.
//!
//! # Safety
//!
//! Every handle argument must be null or a pointer returned by this module.
//! A handle must not be used concurrently with a call that mutates or
//! releases it.

#![allow(clippy::missing_safety_doc)]

use crate::handle::{into_handle, live_count, release, handle_mut, handle_ref, Handled};
use crate::{
    BinaryFractionalEncoder, Ciphertext, CkksEncoder, Context, Decryptor, EncryptionParameters,
    Encryptor, Error, Evaluator, KeyGenerator, Plaintext, PublicKey, RelinKeys, Result,
    SecretKey,
};
use log::debug;
use std::cell::RefCell;
use std::ffi::{c_char, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

/// Status of an operation that returns no handle.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FheStatus {
    /// The operation succeeded.
    Ok = 0,
    /// The operation failed; see [`fhe_last_error_message`].
    Error = 1,
    /// A handle argument was null, released or of the wrong kind.
    InvalidHandle = 2,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn record(error: &Error) {
    debug!("C call failed: {error}");
    let message = CString::new(error.to_string().replace('\0', "")).ok();
    LAST_ERROR.with(|last| *last.borrow_mut() = message);
}

fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(Error::Panic(message))
    })
}

fn new_handle<T: Handled>(f: impl FnOnce() -> Result<T>) -> *mut T {
    match guarded(f) {
        Ok(value) => into_handle(value),
        Err(e) => {
            record(&e);
            ptr::null_mut()
        }
    }
}

fn status(f: impl FnOnce() -> Result<()>) -> FheStatus {
    match guarded(f) {
        Ok(()) => FheStatus::Ok,
        Err(e) => {
            record(&e);
            match e {
                Error::NullHandle(_) | Error::InvalidHandle(_) => FheStatus::InvalidHandle,
                _ => FheStatus::Error,
            }
        }
    }
}

fn value_or<T>(fallback: T, f: impl FnOnce() -> Result<T>) -> T {
    guarded(f).unwrap_or_else(|e| {
        record(&e);
        fallback
    })
}

/// Run a binary in-place operation; `b` may be the same handle as `a`.
unsafe fn with_operands(
    a: *mut Ciphertext,
    b: *const Ciphertext,
    op: impl FnOnce(&mut Ciphertext, &Ciphertext) -> Result<()>,
) -> Result<()> {
    if ptr::eq(a, b) {
        let b = handle_ref(b)?.clone();
        op(handle_mut(a)?, &b)
    } else {
        let b = handle_ref(b)?;
        op(handle_mut(a)?, b)
    }
}

/// Returns the message of the last failed call on this thread, or null. The
/// string is owned by the library and valid until the next failed call on
/// this thread.
#[no_mangle]
pub extern "C" fn fhe_last_error_message() -> *const c_char {
    LAST_ERROR.with(|last| {
        last.borrow()
            .as_ref()
            .map_or(ptr::null(), |message| message.as_ptr())
    })
}

/// Returns the number of live handles of all kinds.
#[no_mangle]
pub extern "C" fn fhe_live_handle_count() -> usize {
    live_count()
}

// Encryption parameters

/// Default BFV parameters.
#[no_mangle]
pub extern "C" fn fhe_encryption_parameters_bfv() -> *mut EncryptionParameters {
    into_handle(EncryptionParameters::bfv_default())
}

/// Default CKKS parameters.
#[no_mangle]
pub extern "C" fn fhe_encryption_parameters_ckks() -> *mut EncryptionParameters {
    into_handle(EncryptionParameters::ckks_default())
}

/// Releases encryption parameters.
#[no_mangle]
pub unsafe extern "C" fn fhe_encryption_parameters_delete(
    parameters: *mut EncryptionParameters,
) -> FheStatus {
    status(|| release(parameters))
}

// Context

/// Derive a context; returns null if the parameters are inconsistent.
#[no_mangle]
pub unsafe extern "C" fn fhe_context_init(parameters: *const EncryptionParameters) -> *mut Context {
    new_handle(|| Context::new(handle_ref(parameters)?))
}

/// Returns a new handle sharing the same context.
#[no_mangle]
pub unsafe extern "C" fn fhe_context_retain(context: *const Context) -> *mut Context {
    new_handle(|| Ok(handle_ref(context)?.clone()))
}

/// Releases one handle; the context is freed with its last handle or
/// dependent.
#[no_mangle]
pub unsafe extern "C" fn fhe_context_delete(context: *mut Context) -> FheStatus {
    status(|| release(context))
}

// Keys

/// Generates a key pair for a context.
#[no_mangle]
pub unsafe extern "C" fn fhe_key_generator_init(context: *const Context) -> *mut KeyGenerator {
    new_handle(|| KeyGenerator::new(handle_ref(context)?))
}

/// Releases a key generator.
#[no_mangle]
pub unsafe extern "C" fn fhe_key_generator_delete(keygen: *mut KeyGenerator) -> FheStatus {
    status(|| release(keygen))
}

/// Returns a new handle to the public key of a key generator.
#[no_mangle]
pub unsafe extern "C" fn fhe_key_generator_public_key(
    keygen: *const KeyGenerator,
) -> *mut PublicKey {
    new_handle(|| Ok(handle_ref(keygen)?.public_key()))
}

/// Returns a new handle to the secret key of a key generator.
#[no_mangle]
pub unsafe extern "C" fn fhe_key_generator_secret_key(
    keygen: *const KeyGenerator,
) -> *mut SecretKey {
    new_handle(|| Ok(handle_ref(keygen)?.secret_key()))
}

/// Generates relinearization keys; CKKS splits every residue into `decomposition_count` digits.
#[no_mangle]
pub unsafe extern "C" fn fhe_key_generator_relin_keys(
    keygen: *const KeyGenerator,
    decomposition_count: usize,
) -> *mut RelinKeys {
    new_handle(|| handle_ref(keygen)?.relin_keys(decomposition_count))
}

/// Releases a public key.
#[no_mangle]
pub unsafe extern "C" fn fhe_public_key_delete(key: *mut PublicKey) -> FheStatus {
    status(|| release(key))
}

/// Releases a secret key.
#[no_mangle]
pub unsafe extern "C" fn fhe_secret_key_delete(key: *mut SecretKey) -> FheStatus {
    status(|| release(key))
}

/// Releases relinearization keys.
#[no_mangle]
pub unsafe extern "C" fn fhe_relin_keys_delete(keys: *mut RelinKeys) -> FheStatus {
    status(|| release(keys))
}

// Encryptor and decryptor

/// Binds an encryptor to a context and a public key.
#[no_mangle]
pub unsafe extern "C" fn fhe_encryptor_init(
    context: *const Context,
    public_key: *const PublicKey,
) -> *mut Encryptor {
    new_handle(|| Encryptor::new(handle_ref(context)?, handle_ref(public_key)?))
}

/// Releases an encryptor.
#[no_mangle]
pub unsafe extern "C" fn fhe_encryptor_delete(encryptor: *mut Encryptor) -> FheStatus {
    status(|| release(encryptor))
}

/// Encrypts a plaintext into a new ciphertext.
#[no_mangle]
pub unsafe extern "C" fn fhe_encryptor_encrypt(
    encryptor: *const Encryptor,
    plaintext: *const Plaintext,
) -> *mut Ciphertext {
    new_handle(|| handle_ref(encryptor)?.encrypt(handle_ref(plaintext)?))
}

/// Binds a decryptor to a context and a secret key.
#[no_mangle]
pub unsafe extern "C" fn fhe_decryptor_init(
    context: *const Context,
    secret_key: *const SecretKey,
) -> *mut Decryptor {
    new_handle(|| Decryptor::new(handle_ref(context)?, handle_ref(secret_key)?))
}

/// Releases a decryptor.
#[no_mangle]
pub unsafe extern "C" fn fhe_decryptor_delete(decryptor: *mut Decryptor) -> FheStatus {
    status(|| release(decryptor))
}

/// Decrypts a ciphertext into a new plaintext.
#[no_mangle]
pub unsafe extern "C" fn fhe_decryptor_decrypt(
    decryptor: *const Decryptor,
    ciphertext: *const Ciphertext,
) -> *mut Plaintext {
    new_handle(|| handle_ref(decryptor)?.decrypt(handle_ref(ciphertext)?))
}

/// Returns the invariant noise budget in bits of a BFV ciphertext, or -1.
#[no_mangle]
pub unsafe extern "C" fn fhe_decryptor_invariant_noise_budget(
    decryptor: *const Decryptor,
    ciphertext: *const Ciphertext,
) -> i64 {
    value_or(-1, || {
        let budget = handle_ref(decryptor)?.invariant_noise_budget(handle_ref(ciphertext)?)?;
        Ok(budget as i64)
    })
}

// Evaluator

/// Binds an evaluator to a context.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_init(context: *const Context) -> *mut Evaluator {
    new_handle(|| Ok(Evaluator::new(handle_ref(context)?)))
}

/// Releases an evaluator.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_delete(evaluator: *mut Evaluator) -> FheStatus {
    status(|| release(evaluator))
}

/// Negates `ciphertext`.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_negate_inplace(
    evaluator: *const Evaluator,
    ciphertext: *mut Ciphertext,
) -> FheStatus {
    status(|| handle_ref(evaluator)?.negate_inplace(handle_mut(ciphertext)?))
}

/// Adds `b` to `a`; `b` may be `a`.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_add_inplace(
    evaluator: *const Evaluator,
    a: *mut Ciphertext,
    b: *const Ciphertext,
) -> FheStatus {
    status(|| {
        let evaluator = handle_ref(evaluator)?;
        with_operands(a, b, |a, b| evaluator.add_inplace(a, b))
    })
}

/// Adds `plaintext` to `ciphertext`.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_add_plain_inplace(
    evaluator: *const Evaluator,
    ciphertext: *mut Ciphertext,
    plaintext: *const Plaintext,
) -> FheStatus {
    status(|| {
        handle_ref(evaluator)?.add_plain_inplace(handle_mut(ciphertext)?, handle_ref(plaintext)?)
    })
}

/// Subtracts `b` from `a`; `b` may be `a`.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_sub_inplace(
    evaluator: *const Evaluator,
    a: *mut Ciphertext,
    b: *const Ciphertext,
) -> FheStatus {
    status(|| {
        let evaluator = handle_ref(evaluator)?;
        with_operands(a, b, |a, b| evaluator.sub_inplace(a, b))
    })
}

/// Subtracts `plaintext` from `ciphertext`.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_sub_plain_inplace(
    evaluator: *const Evaluator,
    ciphertext: *mut Ciphertext,
    plaintext: *const Plaintext,
) -> FheStatus {
    status(|| {
        handle_ref(evaluator)?.sub_plain_inplace(handle_mut(ciphertext)?, handle_ref(plaintext)?)
    })
}

/// Multiplies `a` by `b`; `b` may be `a`.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_multiply_inplace(
    evaluator: *const Evaluator,
    a: *mut Ciphertext,
    b: *const Ciphertext,
) -> FheStatus {
    status(|| {
        let evaluator = handle_ref(evaluator)?;
        with_operands(a, b, |a, b| evaluator.multiply_inplace(a, b))
    })
}

/// Multiplies `ciphertext` by `plaintext`.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_multiply_plain_inplace(
    evaluator: *const Evaluator,
    ciphertext: *mut Ciphertext,
    plaintext: *const Plaintext,
) -> FheStatus {
    status(|| {
        handle_ref(evaluator)?
            .multiply_plain_inplace(handle_mut(ciphertext)?, handle_ref(plaintext)?)
    })
}

/// Squares `ciphertext`.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_square_inplace(
    evaluator: *const Evaluator,
    ciphertext: *mut Ciphertext,
) -> FheStatus {
    status(|| handle_ref(evaluator)?.square_inplace(handle_mut(ciphertext)?))
}

/// Relinearizes `ciphertext` back to size 2.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_relinearize_inplace(
    evaluator: *const Evaluator,
    ciphertext: *mut Ciphertext,
    relin_keys: *const RelinKeys,
) -> FheStatus {
    status(|| {
        handle_ref(evaluator)?.relinearize_inplace(handle_mut(ciphertext)?, handle_ref(relin_keys)?)
    })
}

/// Divides a CKKS `ciphertext` and its scale by the last modulus of its
/// level.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_rescale_to_next_inplace(
    evaluator: *const Evaluator,
    ciphertext: *mut Ciphertext,
) -> FheStatus {
    status(|| handle_ref(evaluator)?.rescale_to_next_inplace(handle_mut(ciphertext)?))
}

/// Drops the last modulus of the level of a CKKS `ciphertext`, keeping its
/// scale.
#[no_mangle]
pub unsafe extern "C" fn fhe_evaluator_mod_switch_to_next_inplace(
    evaluator: *const Evaluator,
    ciphertext: *mut Ciphertext,
) -> FheStatus {
    status(|| handle_ref(evaluator)?.mod_switch_to_next_inplace(handle_mut(ciphertext)?))
}

// Encoders

/// Creates a binary fractional encoder for BFV parameters.
#[no_mangle]
pub unsafe extern "C" fn fhe_binary_fractional_encoder_init(
    parameters: *const EncryptionParameters,
) -> *mut BinaryFractionalEncoder {
    new_handle(|| BinaryFractionalEncoder::new(handle_ref(parameters)?))
}

/// Releases a binary fractional encoder.
#[no_mangle]
pub unsafe extern "C" fn fhe_binary_fractional_encoder_delete(
    encoder: *mut BinaryFractionalEncoder,
) -> FheStatus {
    status(|| release(encoder))
}

/// Encodes a real number; returns null if it does not fit.
#[no_mangle]
pub unsafe extern "C" fn fhe_binary_fractional_encoder_encode(
    encoder: *const BinaryFractionalEncoder,
    value: f64,
) -> *mut Plaintext {
    new_handle(|| handle_ref(encoder)?.encode(value))
}

/// Returns the decoded value, or NaN.
#[no_mangle]
pub unsafe extern "C" fn fhe_binary_fractional_encoder_decode(
    encoder: *const BinaryFractionalEncoder,
    plaintext: *const Plaintext,
) -> f64 {
    value_or(f64::NAN, || handle_ref(encoder)?.decode(handle_ref(plaintext)?))
}

/// Creates a CKKS encoder for a CKKS context.
#[no_mangle]
pub unsafe extern "C" fn fhe_ckks_encoder_init(context: *const Context) -> *mut CkksEncoder {
    new_handle(|| CkksEncoder::new(handle_ref(context)?))
}

/// Releases a CKKS encoder.
#[no_mangle]
pub unsafe extern "C" fn fhe_ckks_encoder_delete(encoder: *mut CkksEncoder) -> FheStatus {
    status(|| release(encoder))
}

/// Encodes a real number at the given scale.
#[no_mangle]
pub unsafe extern "C" fn fhe_ckks_encoder_encode(
    encoder: *const CkksEncoder,
    value: f64,
    scale: f64,
) -> *mut Plaintext {
    new_handle(|| handle_ref(encoder)?.encode(value, scale))
}

/// Returns the decoded value, or NaN.
#[no_mangle]
pub unsafe extern "C" fn fhe_ckks_encoder_decode(
    encoder: *const CkksEncoder,
    plaintext: *const Plaintext,
) -> f64 {
    value_or(f64::NAN, || handle_ref(encoder)?.decode(handle_ref(plaintext)?))
}

// Plaintexts and ciphertexts

/// Releases a plaintext.
#[no_mangle]
pub unsafe extern "C" fn fhe_plaintext_delete(plaintext: *mut Plaintext) -> FheStatus {
    status(|| release(plaintext))
}

/// Returns an independent deep copy of a ciphertext.
#[no_mangle]
pub unsafe extern "C" fn fhe_ciphertext_copy(ciphertext: *const Ciphertext) -> *mut Ciphertext {
    new_handle(|| Ok(handle_ref(ciphertext)?.clone()))
}

/// Returns the number of polynomials of a ciphertext, or 0.
#[no_mangle]
pub unsafe extern "C" fn fhe_ciphertext_size(ciphertext: *const Ciphertext) -> usize {
    value_or(0, || Ok(handle_ref(ciphertext)?.size()))
}

/// Returns the scale of a CKKS ciphertext, or NaN.
#[no_mangle]
pub unsafe extern "C" fn fhe_ciphertext_scale(ciphertext: *const Ciphertext) -> f64 {
    value_or(f64::NAN, || {
        handle_ref(ciphertext)?
            .scale()
            .ok_or_else(|| Error::Unsupported("BFV ciphertexts have no scale".to_string()))
    })
}

/// Returns the level of a CKKS ciphertext, or -1.
#[no_mangle]
pub unsafe extern "C" fn fhe_ciphertext_level(ciphertext: *const Ciphertext) -> i64 {
    value_or(-1, || {
        handle_ref(ciphertext)?
            .level()
            .map(|level| level as i64)
            .ok_or_else(|| Error::Unsupported("BFV ciphertexts have no level".to_string()))
    })
}

/// Releases a ciphertext.
#[no_mangle]
pub unsafe extern "C" fn fhe_ciphertext_delete(ciphertext: *mut Ciphertext) -> FheStatus {
    status(|| release(ciphertext))
}
