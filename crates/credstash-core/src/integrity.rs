//! HMAC-SHA256 integrity check over stored ciphertext
//!
//! Runs before any decryption. A record whose digest cannot be decoded is
//! treated exactly like one whose digest does not match.

use crate::error::{Error, Result};
use crate::types::SecretRecord;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Size of an HMAC-SHA256 digest in bytes
pub const DIGEST_SIZE: usize = 32;

/// Compute the hex HMAC-SHA256 of `ciphertext` under `hmac_key`
pub fn compute_digest(ciphertext: &[u8], hmac_key: &[u8]) -> Result<String> {
    let mac = keyed_mac(ciphertext, hmac_key)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify the record's stored digest against its ciphertext
pub fn verify(record: &SecretRecord, hmac_key: &[u8]) -> Result<()> {
    let expected = match hex::decode(record.hmac_digest.trim()) {
        Ok(bytes) if bytes.len() == DIGEST_SIZE => bytes,
        Ok(bytes) => {
            warn!(
                secret_name = %record.name,
                version = %record.version,
                digest_len = bytes.len(),
                "Stored digest has wrong length"
            );
            return Err(Error::integrity(&record.name, &record.version));
        }
        Err(_) => {
            warn!(
                secret_name = %record.name,
                version = %record.version,
                "Stored digest is not valid hex"
            );
            return Err(Error::integrity(&record.name, &record.version));
        }
    };

    let computed = keyed_mac(&record.ciphertext, hmac_key)?
        .finalize()
        .into_bytes();

    if bool::from(computed.as_slice().ct_eq(expected.as_slice())) {
        Ok(())
    } else {
        warn!(
            secret_name = %record.name,
            version = %record.version,
            "Digest mismatch"
        );
        Err(Error::integrity(&record.name, &record.version))
    }
}

fn keyed_mac(ciphertext: &[u8], hmac_key: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(hmac_key)
        .map_err(|e| Error::Cipher(format!("Invalid HMAC key: {}", e)))?;
    mac.update(ciphertext);
    Ok(mac)
}
