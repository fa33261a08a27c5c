//! Payload decryption
//!
//! Credstash payloads are AES-256 in counter mode with a 128-bit big-endian
//! counter block that starts at 1 and no nonce. The data key is unique per
//! stored version, so the fixed counter never repeats under one key. This
//! layout is what existing tables hold and must not change.

use crate::error::{Error, Result};
use ctr::cipher::{KeyIvInit, StreamCipher};
use zeroize::Zeroizing;

type Aes256Ctr = ctr::Ctr128BE<aes::Aes256>;

/// Size of the AES-256 data key in bytes
pub const DATA_KEY_SIZE: usize = 32;

/// Initial counter block: all zero except the low byte
const INITIAL_COUNTER: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];

/// Deciphers a verified payload with the unwrapped data key
///
/// Only called once the payload's digest has been checked.
pub trait Decipher: Send + Sync {
    /// Decrypt `ciphertext` under `data_key`
    fn decrypt(&self, ciphertext: &[u8], data_key: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

/// AES-256-CTR decipher used by credstash tables
#[derive(Debug, Clone, Copy, Default)]
pub struct Aes256CtrDecipher;

impl Aes256CtrDecipher {
    pub fn new() -> Self {
        Self
    }

    /// Apply the keystream in place
    ///
    /// CTR is symmetric, so this both encrypts and decrypts.
    pub fn apply_keystream(&self, buf: &mut [u8], data_key: &[u8]) -> Result<()> {
        if data_key.len() != DATA_KEY_SIZE {
            return Err(Error::Cipher(format!(
                "Data key must be {} bytes, got {}",
                DATA_KEY_SIZE,
                data_key.len()
            )));
        }

        let mut cipher = Aes256Ctr::new_from_slices(data_key, &INITIAL_COUNTER)
            .map_err(|e| Error::Cipher(format!("Failed to initialise AES-256-CTR: {}", e)))?;
        cipher.apply_keystream(buf);
        Ok(())
    }
}

impl Decipher for Aes256CtrDecipher {
    fn decrypt(&self, ciphertext: &[u8], data_key: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let mut plaintext = Zeroizing::new(ciphertext.to_vec());
        self.apply_keystream(plaintext.as_mut_slice(), data_key)?;
        Ok(plaintext)
    }
}
