//! AES counter-mode content encryption
//!
//! The locator carries only the key, never an IV, so the IV is fixed at zero.
//! That is sound only while every key encrypts a single plaintext: writers
//! must use [`generate_key`] for each new paste unless the caller explicitly
//! supplies a key of its own.

use aes::{Aes128, Aes192, Aes256};
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;

use crate::error::KeyError;

/// AES block size, also the counter width
pub const BLOCK_SIZE: usize = 16;

/// Length of keys produced by [`generate_key`]
pub const GENERATED_KEY_LEN: usize = 16;

const ZERO_IV: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes192Ctr = ctr::Ctr128BE<Aes192>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Keystream generator for one paste
///
/// Built once per encryption or decryption; the key length picks AES-128,
/// AES-192 or AES-256.
pub enum ContentCipher {
    Aes128(Aes128Ctr),
    Aes192(Aes192Ctr),
    Aes256(Aes256Ctr),
}

impl ContentCipher {
    /// Fails with [`KeyError::Length`] unless the key is 16, 24 or 32 bytes
    pub fn new(key: &[u8]) -> Result<Self, KeyError> {
        let invalid = |_| KeyError::Length(key.len());
        match key.len() {
            16 => Aes128Ctr::new_from_slices(key, &ZERO_IV)
                .map(Self::Aes128)
                .map_err(invalid),
            24 => Aes192Ctr::new_from_slices(key, &ZERO_IV)
                .map(Self::Aes192)
                .map_err(invalid),
            32 => Aes256Ctr::new_from_slices(key, &ZERO_IV)
                .map(Self::Aes256)
                .map_err(invalid),
            other => Err(KeyError::Length(other)),
        }
    }

    /// XOR the keystream into `buf`; encrypting and decrypting are the same call
    pub fn apply_keystream(&mut self, buf: &mut [u8]) {
        match self {
            Self::Aes128(c) => c.apply_keystream(buf),
            Self::Aes192(c) => c.apply_keystream(buf),
            Self::Aes256(c) => c.apply_keystream(buf),
        }
    }
}

/// Encrypt or decrypt `data` into a new buffer
pub fn xor_keystream(key: &[u8], data: &[u8]) -> Result<Vec<u8>, KeyError> {
    let mut cipher = ContentCipher::new(key)?;
    let mut out = data.to_vec();
    cipher.apply_keystream(&mut out);
    Ok(out)
}

/// Fresh random key for a new paste
pub fn generate_key() -> Vec<u8> {
    let mut key = vec![0u8; GENERATED_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key);
    key
}
