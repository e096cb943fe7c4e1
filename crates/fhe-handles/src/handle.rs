//! Registry of the live handles handed out across the C surface.
//!
//! A handle is the address of a boxed object. The registry records the kind
//! of every live handle, so that null, released and wrong-kind handles are
//! reported as errors instead of being dereferenced. An address reused by
//! the allocator for an object of the same kind after a release is
//! indistinguishable from the new object.

use crate::{
    BinaryFractionalEncoder, Ciphertext, CkksEncoder, Context, Decryptor, EncryptionParameters,
    Encryptor, Error, Evaluator, KeyGenerator, Plaintext, PublicKey, RelinKeys, Result,
    SecretKey,
};
use log::{trace, warn};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// The kinds of objects exposed as handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// [`EncryptionParameters`]
    EncryptionParameters,
    /// [`Context`]
    Context,
    /// [`KeyGenerator`]
    KeyGenerator,
    /// [`PublicKey`]
    PublicKey,
    /// [`SecretKey`]
    SecretKey,
    /// [`RelinKeys`]
    RelinKeys,
    /// [`Encryptor`]
    Encryptor,
    /// [`Decryptor`]
    Decryptor,
    /// [`Evaluator`]
    Evaluator,
    /// [`BinaryFractionalEncoder`]
    BinaryFractionalEncoder,
    /// [`CkksEncoder`]
    CkksEncoder,
    /// [`Plaintext`]
    Plaintext,
    /// [`Ciphertext`]
    Ciphertext,
}

impl Display for HandleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Objects that can be boxed behind a handle.
pub(crate) trait Handled: Sized + 'static {
    const KIND: HandleKind;
}

macro_rules! handled {
    ($($t:ident),* $(,)?) => {
        $(impl Handled for $t {
            const KIND: HandleKind = HandleKind::$t;
        })*
    };
}

handled!(
    EncryptionParameters,
    Context,
    KeyGenerator,
    PublicKey,
    SecretKey,
    RelinKeys,
    Encryptor,
    Decryptor,
    Evaluator,
    BinaryFractionalEncoder,
    CkksEncoder,
    Plaintext,
    Ciphertext,
);

fn registry() -> MutexGuard<'static, HashMap<usize, HandleKind>> {
    static LIVE: OnceLock<Mutex<HashMap<usize, HandleKind>>> = OnceLock::new();
    LIVE.get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Box an object behind a new handle.
pub(crate) fn into_handle<T: Handled>(value: T) -> *mut T {
    let handle = Box::into_raw(Box::new(value));
    registry().insert(handle as usize, T::KIND);
    trace!("created {} handle {handle:p}", T::KIND);
    handle
}

fn check<T: Handled>(handle: *const T) -> Result<()> {
    if handle.is_null() {
        warn!("null {} handle", T::KIND);
        return Err(Error::NullHandle(T::KIND));
    }
    match registry().get(&(handle as usize)) {
        Some(kind) if *kind == T::KIND => Ok(()),
        Some(kind) => {
            warn!("{kind} handle {handle:p} used as a {} handle", T::KIND);
            Err(Error::InvalidHandle(T::KIND))
        }
        None => {
            warn!("{} handle {handle:p} is not live", T::KIND);
            Err(Error::InvalidHandle(T::KIND))
        }
    }
}

/// Borrow the object behind a handle.
///
/// # Safety
///
/// No mutable borrow of the same object may be alive.
pub(crate) unsafe fn handle_ref<'a, T: Handled>(handle: *const T) -> Result<&'a T> {
    check(handle)?;
    Ok(&*handle)
}

/// Mutably borrow the object behind a handle.
///
/// # Safety
///
/// No other borrow of the same object may be alive.
pub(crate) unsafe fn handle_mut<'a, T: Handled>(handle: *mut T) -> Result<&'a mut T> {
    check(handle)?;
    Ok(&mut *handle)
}

/// Release a handle and drop the object behind it.
///
/// # Safety
///
/// No borrow of the object may be alive.
pub(crate) unsafe fn release<T: Handled>(handle: *mut T) -> Result<()> {
    let removed = {
        let mut live = registry();
        match live.get(&(handle as usize)) {
            Some(kind) if *kind == T::KIND => live.remove(&(handle as usize)).is_some(),
            _ => false,
        }
    };
    if !removed {
        check(handle)?;
        return Err(Error::InvalidHandle(T::KIND));
    }
    trace!("released {} handle {handle:p}", T::KIND);
    drop(Box::from_raw(handle));
    Ok(())
}

/// Returns the number of live handles.
pub(crate) fn live_count() -> usize {
    registry().len()
}
