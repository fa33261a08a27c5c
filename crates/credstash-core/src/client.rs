//! Secret client
//!
//! Orchestrates one read: resolve the table, fetch the record, unwrap its key
//! material, verify the digest, then decipher. Verification always completes
//! before the decipher sees the payload. Each call is a single attempt with
//! no caching and no retries.

use crate::aws;
use crate::cipher::{Aes256CtrDecipher, Decipher};
use crate::config::{ClientConfig, CredstashConfig};
use crate::error::{Error, Result};
use crate::integrity;
use crate::kms::{self, KeyService, KmsKeyService};
use crate::security::{AuditLog, SecureString};
use crate::store::{DynamoDbStore, SecretStore};
use crate::types::EncryptionContext;
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::{Zeroize, Zeroizing};

/// Reads and decrypts credstash secrets
#[derive(Clone)]
pub struct SecretClient {
    config: ClientConfig,
    store: Arc<dyn SecretStore>,
    key_service: Arc<dyn KeyService>,
    decipher: Arc<dyn Decipher>,
}

impl SecretClient {
    /// Create a client with the AES-256-CTR decipher
    pub fn new(
        config: ClientConfig,
        store: Arc<dyn SecretStore>,
        key_service: Arc<dyn KeyService>,
    ) -> Self {
        Self::with_components(config, store, key_service, Arc::new(Aes256CtrDecipher::new()))
    }

    /// Create a client with explicit components (for testing)
    pub fn with_components(
        config: ClientConfig,
        store: Arc<dyn SecretStore>,
        key_service: Arc<dyn KeyService>,
        decipher: Arc<dyn Decipher>,
    ) -> Self {
        Self {
            config,
            store,
            key_service,
            decipher,
        }
    }

    /// Create a DynamoDB + KMS client from configuration
    pub async fn from_config(config: &CredstashConfig) -> Result<Self> {
        let sdk_config = aws::load_sdk_config(config).await?;
        let store = DynamoDbStore::from_sdk_config(&sdk_config, config.endpoints.dynamodb.as_deref());
        let key_service = KmsKeyService::from_sdk_config(&sdk_config, config.endpoints.kms.as_deref());

        info!("Configured credstash for table {}", config.table);
        Ok(Self::new(
            config.client_config(),
            Arc::new(store),
            Arc::new(key_service),
        ))
    }

    /// Fetch and decrypt a secret as text
    ///
    /// `table` and `version` are overrides; pass `""` for the configured
    /// table and the latest version.
    pub async fn get_secret(
        &self,
        name: &str,
        table: &str,
        version: &str,
        context: &EncryptionContext,
    ) -> Result<SecureString> {
        let mut plaintext = self.get_secret_bytes(name, table, version, context).await?;
        let bytes = std::mem::take(&mut *plaintext);

        match String::from_utf8(bytes) {
            Ok(text) => Ok(SecureString::from(text)),
            Err(e) => {
                e.into_bytes().zeroize();
                Err(Error::InvalidUtf8 {
                    name: name.to_string(),
                })
            }
        }
    }

    /// Fetch and decrypt a secret as raw bytes
    pub async fn get_secret_bytes(
        &self,
        name: &str,
        table: &str,
        version: &str,
        context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let table = self.config.resolve_table(table);
        let version = if version.is_empty() {
            None
        } else {
            Some(version)
        };

        match self.open(name, table, version, context).await {
            Ok((resolved_version, plaintext)) => {
                AuditLog::new(name, table)
                    .with_version(&resolved_version)
                    .log();
                Ok(plaintext)
            }
            Err(e) => {
                let mut audit = AuditLog::new(name, table);
                if let Some(version) = version {
                    audit = audit.with_version(version);
                }
                audit.with_error(e.to_string()).log();
                Err(e)
            }
        }
    }

    async fn open(
        &self,
        name: &str,
        table: &str,
        version: Option<&str>,
        context: &EncryptionContext,
    ) -> Result<(String, Zeroizing<Vec<u8>>)> {
        debug!(
            store = self.store.name(),
            "Fetching {} ({}) from {}",
            name,
            version.unwrap_or("latest"),
            table
        );
        let record = self.store.get_record(name, version, table).await?;

        let material = kms::unwrap(
            self.key_service.as_ref(),
            &record.wrapped_key,
            context,
            self.config.key_id(),
        )
        .await?;

        integrity::verify(&record, material.hmac_key())?;

        let plaintext = self
            .decipher
            .decrypt(&record.ciphertext, material.data_key())?;

        debug!("Decrypted {} version {}", record.name, record.version);
        Ok((record.version, plaintext))
    }
}

impl std::fmt::Debug for SecretClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretClient")
            .field("config", &self.config)
            .field("store", &self.store.name())
            .field("key_service", &self.key_service.name())
            .finish_non_exhaustive()
    }
}
