//! Key unwrapping through an external key-management service
//!
//! Each record's wrapped key decrypts to 64 bytes: the first 32 are the
//! AES data key, the last 32 the HMAC key. The material lives for one
//! `get_secret` call and is zeroed on drop.

pub mod aws;

use crate::error::{Error, Result};
use crate::types::EncryptionContext;
use async_trait::async_trait;
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

pub use aws::KmsKeyService;

/// Total size of the unwrapped key material
pub const MATERIAL_SIZE: usize = 64;

/// Size of each half of the material
pub const HALF_SIZE: usize = MATERIAL_SIZE / 2;

/// Decrypt capability of a key-management service
#[async_trait]
pub trait KeyService: Send + Sync {
    /// Decrypt a wrapped key blob under `context`
    ///
    /// `key_id` may be empty, in which case the service picks the key from
    /// the blob itself.
    async fn decrypt(
        &self,
        wrapped_key: &[u8],
        context: &EncryptionContext,
        key_id: &str,
    ) -> Result<Zeroizing<Vec<u8>>>;

    /// Service name for logs
    fn name(&self) -> &'static str;
}

/// Data key and HMAC key recovered from a wrapped blob
pub struct UnwrappedMaterial {
    data_key: Zeroizing<[u8; HALF_SIZE]>,
    hmac_key: Zeroizing<[u8; HALF_SIZE]>,
}

impl UnwrappedMaterial {
    /// Split a key service's plaintext into data and HMAC keys
    ///
    /// Anything other than exactly 64 bytes is rejected; short material is
    /// never padded.
    pub fn from_plaintext(plaintext: &[u8]) -> Result<Self> {
        if plaintext.len() != MATERIAL_SIZE {
            return Err(Error::MaterialLength {
                expected: MATERIAL_SIZE,
                actual: plaintext.len(),
            });
        }

        let mut data_key = Zeroizing::new([0u8; HALF_SIZE]);
        let mut hmac_key = Zeroizing::new([0u8; HALF_SIZE]);
        data_key.copy_from_slice(&plaintext[..HALF_SIZE]);
        hmac_key.copy_from_slice(&plaintext[HALF_SIZE..]);

        Ok(Self { data_key, hmac_key })
    }

    /// AES-256 data key
    pub fn data_key(&self) -> &[u8] {
        &self.data_key[..]
    }

    /// HMAC-SHA256 key
    pub fn hmac_key(&self) -> &[u8] {
        &self.hmac_key[..]
    }
}

impl fmt::Debug for UnwrappedMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnwrappedMaterial([REDACTED])")
    }
}

/// Unwrap a record's key material through `service`
pub async fn unwrap(
    service: &dyn KeyService,
    wrapped_key: &[u8],
    context: &EncryptionContext,
    key_id: &str,
) -> Result<UnwrappedMaterial> {
    debug!(
        service = service.name(),
        key_id = %key_id,
        context_keys = ?context.keys().collect::<Vec<_>>(),
        "Unwrapping key material"
    );

    let plaintext = service.decrypt(wrapped_key, context, key_id).await?;
    UnwrappedMaterial::from_plaintext(&plaintext)
}
