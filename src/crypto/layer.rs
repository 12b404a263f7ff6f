//! Single encryption layer using AES-256-GCM.
//!
//! A layer envelope is `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! Every call to [`encrypt_layer`] draws a fresh random nonce, so sealing the
//! same plaintext twice yields different envelopes.

use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use tracing::{debug, instrument};

use super::error::{CryptoError, Result};
use super::keys::SymmetricKey;

/// Size of AES-256-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;

/// Size of AES-256-GCM tag in bytes
pub const TAG_SIZE: usize = 16;

/// Single-use nonce sequence for AES-GCM
struct SingleNonce {
    nonce: Option<[u8; NONCE_SIZE]>,
}

impl SingleNonce {
    fn new(nonce_bytes: [u8; NONCE_SIZE]) -> Self {
        Self { nonce: Some(nonce_bytes) }
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> std::result::Result<Nonce, ring::error::Unspecified> {
        self.nonce.take().map(Nonce::assume_unique_for_key).ok_or(ring::error::Unspecified)
    }
}

/// Seal `plaintext` under `key`, returning the nonce-prefixed envelope.
#[instrument(skip_all, fields(plaintext_len = plaintext.len()))]
pub fn encrypt_layer(rng: &SystemRandom, plaintext: &[u8], key: &SymmetricKey) -> Result<Vec<u8>> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| CryptoError::encryption("failed to generate random nonce"))?;

    let unbound_key = UnboundKey::new(&AES_256_GCM, key.as_bytes())
        .map_err(|_| CryptoError::encryption("failed to create encryption key"))?;
    let mut sealing_key = aead::SealingKey::new(unbound_key, SingleNonce::new(nonce_bytes));

    let mut sealed = plaintext.to_vec();
    sealed.reserve(TAG_SIZE);
    sealing_key
        .seal_in_place_append_tag(Aad::empty(), &mut sealed)
        .map_err(|_| CryptoError::encryption("failed to seal layer"))?;

    let mut envelope = Vec::with_capacity(NONCE_SIZE + sealed.len());
    envelope.extend_from_slice(&nonce_bytes);
    envelope.extend_from_slice(&sealed);

    debug!(envelope_len = envelope.len(), "Sealed encryption layer");
    Ok(envelope)
}

/// Open an envelope produced by [`encrypt_layer`].
///
/// Fails with [`CryptoError::LayerDecrypt`] on a wrong key or on malformed,
/// truncated, or tampered bytes; the cases are deliberately indistinguishable.
#[instrument(skip_all, fields(envelope_len = envelope.len()))]
pub fn decrypt_layer(envelope: &[u8], key: &SymmetricKey) -> Result<Vec<u8>> {
    if envelope.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::LayerDecrypt);
    }

    let (nonce_slice, sealed) = envelope.split_at(NONCE_SIZE);
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    nonce_bytes.copy_from_slice(nonce_slice);

    let unbound_key =
        UnboundKey::new(&AES_256_GCM, key.as_bytes()).map_err(|_| CryptoError::LayerDecrypt)?;
    let mut opening_key = aead::OpeningKey::new(unbound_key, SingleNonce::new(nonce_bytes));

    let mut buffer = sealed.to_vec();
    let opened = opening_key
        .open_in_place(Aad::empty(), &mut buffer)
        .map_err(|_| CryptoError::LayerDecrypt)?;

    Ok(opened.to_vec())
}
