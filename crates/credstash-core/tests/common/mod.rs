//! Common test infrastructure for credstash-core tests
//!
//! Provides an in-memory key service, a record sealer that produces records
//! the way credstash writes them, and a mockall decipher.
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::*;
//! ```

// Not every test file uses every helper
#![allow(dead_code)]

use async_trait::async_trait;
use credstash_core::cipher::Aes256CtrDecipher;
use credstash_core::integrity::compute_digest;
use credstash_core::{
    format_version, ClientConfig, Decipher, EncryptionContext, Error, KeyService,
    KeyServiceFailure, MemoryStore, Result, SecretClient, SecretRecord,
};
use mockall::mock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use zeroize::Zeroizing;

pub const TABLE: &str = "credential-store";
pub const KEY_ID: &str = "alias/credstash";

mock! {
    pub Cipher {}

    impl Decipher for Cipher {
        fn decrypt(&self, ciphertext: &[u8], data_key: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
    }
}

/// Key service that knows the material behind each wrapped blob
#[derive(Default)]
pub struct FakeKeyService {
    keys: Mutex<HashMap<Vec<u8>, (EncryptionContext, Vec<u8>)>>,
    calls: AtomicUsize,
}

impl FakeKeyService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register material; the returned blob unwraps only under `context`
    pub fn wrap(&self, material: Vec<u8>, context: &EncryptionContext) -> Vec<u8> {
        let mut keys = self.keys.lock().unwrap();
        let blob = format!("wrapped-{}", keys.len()).into_bytes();
        keys.insert(blob.clone(), (context.clone(), material));
        blob
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyService for FakeKeyService {
    async fn decrypt(
        &self,
        wrapped_key: &[u8],
        context: &EncryptionContext,
        _key_id: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let keys = self.keys.lock().unwrap();
        match keys.get(wrapped_key) {
            Some((wrapped_context, material)) if wrapped_context == context => {
                Ok(Zeroizing::new(material.clone()))
            }
            Some(_) => Err(Error::key_service(
                KeyServiceFailure::InvalidCiphertext,
                "InvalidCiphertextException: encryption context mismatch",
            )),
            None => Err(Error::key_service(
                KeyServiceFailure::InvalidCiphertext,
                "InvalidCiphertextException: unknown blob",
            )),
        }
    }

    fn name(&self) -> &'static str {
        "fake-kms"
    }
}

/// Key service that always returns the same plaintext, whatever its length
pub struct FixedKeyService(pub Vec<u8>);

#[async_trait]
impl KeyService for FixedKeyService {
    async fn decrypt(
        &self,
        _wrapped_key: &[u8],
        _context: &EncryptionContext,
        _key_id: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(self.0.clone()))
    }

    fn name(&self) -> &'static str {
        "fixed-kms"
    }
}

/// Deterministic 64 bytes of key material, distinct per seed
pub fn material(seed: u8) -> Vec<u8> {
    (0u8..64).map(|i| i.wrapping_mul(7).wrapping_add(seed)).collect()
}

pub fn context(pairs: &[(&str, &str)]) -> EncryptionContext {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Build a record the way credstash writes one
pub fn seal(
    kms: &FakeKeyService,
    name: &str,
    version: u64,
    plaintext: &[u8],
    context: &EncryptionContext,
) -> SecretRecord {
    let key_material = material(version as u8);
    let mut ciphertext = plaintext.to_vec();
    Aes256CtrDecipher::new()
        .apply_keystream(&mut ciphertext, &key_material[..32])
        .unwrap();
    let hmac_digest = compute_digest(&ciphertext, &key_material[32..]).unwrap();

    SecretRecord {
        name: name.to_string(),
        version: format_version(version),
        wrapped_key: kms.wrap(key_material, context),
        ciphertext,
        hmac_digest,
    }
}

/// Store, key service and client wired together
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub kms: Arc<FakeKeyService>,
    pub client: SecretClient,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let kms = Arc::new(FakeKeyService::new());
        let client = SecretClient::new(
            ClientConfig::new(TABLE, KEY_ID),
            store.clone(),
            kms.clone(),
        );
        Self { store, kms, client }
    }

    /// Same store and key service, custom decipher
    pub fn client_with_decipher(&self, decipher: Arc<dyn Decipher>) -> SecretClient {
        SecretClient::with_components(
            ClientConfig::new(TABLE, KEY_ID),
            self.store.clone(),
            self.kms.clone(),
            decipher,
        )
    }

    pub fn put(&self, name: &str, version: u64, plaintext: &str, context: &EncryptionContext) {
        self.put_in(TABLE, name, version, plaintext.as_bytes(), context);
    }

    pub fn put_in(
        &self,
        table: &str,
        name: &str,
        version: u64,
        plaintext: &[u8],
        context: &EncryptionContext,
    ) {
        let record = seal(&self.kms, name, version, plaintext, context);
        self.store.insert(table, record);
    }
}

/// Decipher mock that fails the test if it is ever called
pub fn forbidden_decipher() -> Arc<dyn Decipher> {
    let mut decipher = MockCipher::new();
    decipher.expect_decrypt().times(0);
    Arc::new(decipher)
}
