//! PBKDF2-HMAC-SHA256 key derivation for the password layer.
//!
//! Parameters: 100,000 iterations, 16-byte random salt, 32-byte output.

use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

use super::error::{CryptoError, Result};
use super::keys::{SymmetricKey, KEY_LEN};

/// Number of PBKDF2 iterations
pub const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(100_000) {
    Some(n) => n,
    None => panic!("iteration count must be non-zero"),
};

/// Salt length stored in front of every password layer
pub const SALT_LEN: usize = 16;

/// Generate a random salt for a new password layer.
pub fn generate_salt(rng: &SystemRandom) -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| CryptoError::key_derivation("failed to generate salt"))?;
    Ok(salt)
}

/// Derive a 32-byte key from a password and salt.
pub fn derive_key(password: &[u8], salt: &[u8]) -> SymmetricKey {
    let mut output = [0u8; KEY_LEN];
    pbkdf2::derive(pbkdf2::PBKDF2_HMAC_SHA256, PBKDF2_ITERATIONS, salt, password, &mut output);
    let key = SymmetricKey::new(output);
    zeroize::Zeroize::zeroize(&mut output);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let salt = [0x42u8; SALT_LEN];
        let k1 = derive_key(b"correct horse", &salt);
        let k2 = derive_key(b"correct horse", &salt);
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_password() {
        let salt = [0x42u8; SALT_LEN];
        let k1 = derive_key(b"password1", &salt);
        let k2 = derive_key(b"password2", &salt);
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_salt() {
        let k1 = derive_key(b"password", &[0x01; SALT_LEN]);
        let k2 = derive_key(b"password", &[0x02; SALT_LEN]);
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_derive_key_matches_pbkdf2_verify() {
        let salt = [0x07u8; SALT_LEN];
        let key = derive_key(b"hunter2", &salt);
        let verified = pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            PBKDF2_ITERATIONS,
            &salt,
            b"hunter2",
            key.as_bytes(),
        );
        assert!(verified.is_ok());
    }

    #[test]
    fn test_generate_salt_unique() {
        let rng = SystemRandom::new();
        assert_ne!(generate_salt(&rng).unwrap(), generate_salt(&rng).unwrap());
    }
}
