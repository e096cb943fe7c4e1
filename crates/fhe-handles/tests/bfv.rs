use fhe_handles::{
    BinaryFractionalEncoder, Ciphertext, Context, Decryptor, EncryptionParameters, Encryptor,
    Error, Evaluator, KeyGenerator, SchemeType,
};
use std::error::Error as StdError;

struct Bfv {
    context: Context,
    keygen: KeyGenerator,
    encryptor: Encryptor,
    decryptor: Decryptor,
    evaluator: Evaluator,
    encoder: BinaryFractionalEncoder,
}

impl Bfv {
    fn new() -> Result<Self, Box<dyn StdError>> {
        let parameters = EncryptionParameters::bfv_default();
        let context = Context::new(&parameters)?;
        let keygen = KeyGenerator::new(&context)?;
        Ok(Self {
            encryptor: Encryptor::new(&context, &keygen.public_key())?,
            decryptor: Decryptor::new(&context, &keygen.secret_key())?,
            evaluator: Evaluator::new(&context),
            encoder: BinaryFractionalEncoder::new(&parameters)?,
            context,
            keygen,
        })
    }

    fn encrypt(&self, value: f64) -> Result<Ciphertext, Box<dyn StdError>> {
        Ok(self.encryptor.encrypt(&self.encoder.encode(value)?)?)
    }

    fn decrypt(&self, ct: &Ciphertext) -> Result<f64, Box<dyn StdError>> {
        Ok(self.encoder.decode(&self.decryptor.decrypt(ct)?)?)
    }
}

#[test]
fn round_trip() -> Result<(), Box<dyn StdError>> {
    let bfv = Bfv::new()?;
    for value in [0.0, 3.5, -7.25, 100.0, 0.0625] {
        let ct = bfv.encrypt(value)?;
        assert_eq!(ct.scheme(), SchemeType::Bfv);
        assert_eq!(ct.size(), 2);
        assert_eq!(ct.scale(), None);
        assert_eq!(bfv.decrypt(&ct)?, value);
    }
    Ok(())
}

#[test]
fn arithmetic() -> Result<(), Box<dyn StdError>> {
    let bfv = Bfv::new()?;
    let relin_keys = bfv.keygen.relin_keys(4)?;

    let mut a = bfv.encrypt(2.0)?;
    let b = bfv.encrypt(3.0)?;
    bfv.evaluator.add_inplace(&mut a, &b)?;
    assert_eq!(bfv.decrypt(&a)?, 5.0);

    bfv.evaluator.sub_inplace(&mut a, &b)?;
    assert_eq!(bfv.decrypt(&a)?, 2.0);

    bfv.evaluator.negate_inplace(&mut a)?;
    assert_eq!(bfv.decrypt(&a)?, -2.0);
    bfv.evaluator.negate_inplace(&mut a)?;

    bfv.evaluator.multiply_inplace(&mut a, &b)?;
    assert_eq!(a.size(), 3);
    assert_eq!(bfv.decrypt(&a)?, 6.0);

    bfv.evaluator.relinearize_inplace(&mut a, &relin_keys)?;
    assert_eq!(a.size(), 2);
    assert_eq!(bfv.decrypt(&a)?, 6.0);

    // Relinearizing a size-2 ciphertext is a no-op.
    bfv.evaluator.relinearize_inplace(&mut a, &relin_keys)?;
    assert_eq!(bfv.decrypt(&a)?, 6.0);

    let mut c = bfv.encrypt(-1.5)?;
    bfv.evaluator.square_inplace(&mut c)?;
    assert_eq!(c.size(), 3);
    assert_eq!(bfv.decrypt(&c)?, 2.25);

    // Operands of different sizes.
    bfv.evaluator.add_inplace(&mut a, &c)?;
    assert_eq!(a.size(), 3);
    assert_eq!(bfv.decrypt(&a)?, 8.25);
    Ok(())
}

#[test]
fn plain_operands() -> Result<(), Box<dyn StdError>> {
    let bfv = Bfv::new()?;
    let two = bfv.encoder.encode(2.0)?;
    let half = bfv.encoder.encode(0.5)?;

    let mut a = bfv.encrypt(3.0)?;
    bfv.evaluator.add_plain_inplace(&mut a, &two)?;
    assert_eq!(bfv.decrypt(&a)?, 5.0);

    bfv.evaluator.sub_plain_inplace(&mut a, &half)?;
    assert_eq!(bfv.decrypt(&a)?, 4.5);

    bfv.evaluator.multiply_plain_inplace(&mut a, &two)?;
    assert_eq!(a.size(), 2);
    assert_eq!(bfv.decrypt(&a)?, 9.0);

    let mut b = bfv.encrypt(3.0)?;
    bfv.evaluator.multiply_inplace(&mut b, &bfv.encrypt(2.0)?)?;
    let mut c = bfv.encrypt(3.0)?;
    bfv.evaluator.multiply_plain_inplace(&mut c, &two)?;
    assert_eq!(bfv.decrypt(&b)?, bfv.decrypt(&c)?);
    Ok(())
}

#[test]
fn plain_operands_match_encrypted_operands() -> Result<(), Box<dyn StdError>> {
    let bfv = Bfv::new()?;
    for (x, y) in [(3.0, 2.0), (-1.25, 0.5), (7.5, -4.75)] {
        let plain = bfv.encoder.encode(y)?;
        let encrypted = bfv.encrypt(y)?;

        let mut with_plain = bfv.encrypt(x)?;
        let mut with_encrypted = bfv.encrypt(x)?;
        bfv.evaluator.add_plain_inplace(&mut with_plain, &plain)?;
        bfv.evaluator.add_inplace(&mut with_encrypted, &encrypted)?;
        assert_eq!(bfv.decrypt(&with_plain)?, bfv.decrypt(&with_encrypted)?);
        assert_eq!(bfv.decrypt(&with_plain)?, x + y);

        let mut with_plain = bfv.encrypt(x)?;
        let mut with_encrypted = bfv.encrypt(x)?;
        bfv.evaluator.sub_plain_inplace(&mut with_plain, &plain)?;
        bfv.evaluator.sub_inplace(&mut with_encrypted, &encrypted)?;
        assert_eq!(bfv.decrypt(&with_plain)?, bfv.decrypt(&with_encrypted)?);
        assert_eq!(bfv.decrypt(&with_plain)?, x - y);
    }
    Ok(())
}

#[test]
fn copies_are_independent() -> Result<(), Box<dyn StdError>> {
    let bfv = Bfv::new()?;
    let a = bfv.encrypt(1.5)?;
    let mut b = a.clone();
    bfv.evaluator.add_inplace(&mut b, &a)?;
    assert_eq!(bfv.decrypt(&a)?, 1.5);
    assert_eq!(bfv.decrypt(&b)?, 3.0);
    Ok(())
}

#[test]
fn noise_budget() -> Result<(), Box<dyn StdError>> {
    let bfv = Bfv::new()?;
    let mut a = bfv.encrypt(2.0)?;
    let fresh = bfv.decryptor.invariant_noise_budget(&a)?;
    assert!(fresh > 0);

    let b = bfv.encrypt(3.0)?;
    bfv.evaluator.multiply_inplace(&mut a, &b)?;
    let after = bfv.decryptor.invariant_noise_budget(&a)?;
    assert!(after < fresh);
    assert_eq!(bfv.decrypt(&a)?, 6.0);
    Ok(())
}

#[test]
fn serialization() -> Result<(), Box<dyn StdError>> {
    let bfv = Bfv::new()?;
    let ct = bfv.encrypt(-4.75)?;
    let bytes = ct.to_bytes();
    let restored = Ciphertext::from_bytes(&bfv.context, &bytes)?;
    assert_eq!(restored.size(), 2);
    assert_eq!(bfv.decrypt(&restored)?, -4.75);
    Ok(())
}

#[test]
fn mismatched_objects() -> Result<(), Box<dyn StdError>> {
    let bfv = Bfv::new()?;
    let other = Bfv::new()?;

    let mut a = bfv.encrypt(1.0)?;
    let b = other.encrypt(1.0)?;
    assert_eq!(
        bfv.evaluator.add_inplace(&mut a, &b),
        Err(Error::ContextMismatch)
    );
    assert_eq!(
        Encryptor::new(&bfv.context, &other.keygen.public_key()).err(),
        Some(Error::ContextMismatch)
    );
    assert!(bfv.decryptor.decrypt(&b).is_err());

    let relin_keys = other.keygen.relin_keys(1)?;
    bfv.evaluator.multiply_inplace(&mut a, &bfv.encrypt(1.0)?)?;
    assert!(bfv.evaluator.relinearize_inplace(&mut a, &relin_keys).is_err());
    assert_eq!(a.size(), 3);
    Ok(())
}
