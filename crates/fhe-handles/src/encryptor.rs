//! Conversions between plaintexts and ciphertexts.

use crate::ciphertext::CiphertextKind;
use crate::keys::{PublicKeyKind, SecretKeyKind};
use crate::{Ciphertext, Context, Error, Plaintext, PublicKey, Result, SecretKey};
use fhe::bfv::Encoding;
use fhe_traits::{FheDecoder, FheDecrypter, FheEncrypter};
use rand::thread_rng;

/// Encrypts plaintexts under a public key.
#[derive(Debug)]
pub struct Encryptor {
    context: Context,
    public_key: PublicKey,
}

impl Encryptor {
    /// Bind an encryptor to a context and a public key of that context.
    pub fn new(context: &Context, public_key: &PublicKey) -> Result<Self> {
        context.check(&public_key.context)?;
        Ok(Self {
            context: context.clone(),
            public_key: public_key.clone(),
        })
    }

    /// Encrypt a plaintext into a new ciphertext, with fresh randomness.
    pub fn encrypt(&self, pt: &Plaintext) -> Result<Ciphertext> {
        let mut rng = thread_rng();
        let kind = match &self.public_key.kind {
            PublicKeyKind::Bfv(pk) => {
                let pt = pt.to_fhe(self.context.bfv()?)?;
                CiphertextKind::Bfv(pk.try_encrypt(&pt, &mut rng)?)
            }
            PublicKeyKind::Ckks(pk) => {
                CiphertextKind::Ckks(pk.try_encrypt(pt.as_ckks(&self.context)?, &mut rng)?)
            }
        };
        Ok(Ciphertext {
            context: self.context.clone(),
            kind,
        })
    }
}

/// Decrypts ciphertexts with a secret key.
#[derive(Debug)]
pub struct Decryptor {
    context: Context,
    secret_key: SecretKey,
}

impl Decryptor {
    /// Bind a decryptor to a context and a secret key of that context.
    pub fn new(context: &Context, secret_key: &SecretKey) -> Result<Self> {
        context.check(&secret_key.context)?;
        Ok(Self {
            context: context.clone(),
            secret_key: secret_key.clone(),
        })
    }

    /// Decrypt a ciphertext into a new plaintext.
    ///
    /// The result is only meaningful while the noise of the ciphertext is
    /// within its budget; see [`Decryptor::invariant_noise_budget`].
    pub fn decrypt(&self, ct: &Ciphertext) -> Result<Plaintext> {
        self.context.check(&ct.context)?;
        match (&self.secret_key.kind, &ct.kind) {
            (SecretKeyKind::Bfv(sk), CiphertextKind::Bfv(ct)) => {
                let pt = sk.try_decrypt(ct)?;
                let coefficients = Vec::<u64>::try_decode(&pt, Encoding::poly())?;
                Ok(Plaintext::bfv(self.context.bfv()?.plaintext(), coefficients))
            }
            (SecretKeyKind::Ckks(sk), CiphertextKind::Ckks(ct)) => {
                Ok(Plaintext::ckks(&self.context, sk.try_decrypt(ct)?))
            }
            _ => Err(Error::ContextMismatch),
        }
    }

    /// Returns the number of bits of noise a BFV ciphertext can still absorb
    /// before decryption fails, or zero when it is already exhausted.
    ///
    /// The budget is `log2(q) - log2(t) - 1` minus the number of bits of the
    /// noise measured with the secret key. CKKS ciphertexts have no such
    /// budget and are rejected.
    pub fn invariant_noise_budget(&self, ct: &Ciphertext) -> Result<usize> {
        self.context.check(&ct.context)?;
        match (&self.secret_key.kind, &ct.kind) {
            (SecretKeyKind::Bfv(sk), CiphertextKind::Bfv(ct)) => {
                let par = self.context.bfv()?;
                // SAFETY: the measurement is variable time in the noise only.
                let noise = unsafe { sk.measure_noise(ct)? };
                let q_bits = par
                    .moduli()
                    .iter()
                    .map(|qi| 64 - qi.leading_zeros() as usize)
                    .sum::<usize>();
                let t_bits = 64 - par.plaintext().leading_zeros() as usize;
                Ok(q_bits.saturating_sub(t_bits + noise + 1))
            }
            (SecretKeyKind::Ckks(_), CiphertextKind::Ckks(_)) => Err(Error::Unsupported(
                "CKKS ciphertexts have no invariant noise budget".to_string(),
            )),
            _ => Err(Error::ContextMismatch),
        }
    }
}
