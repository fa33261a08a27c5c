//! AWS KMS key service
//!
//! Wraps `kms:Decrypt`. Service failures are classified by error code and
//! passed on with the service's own message.

use crate::error::{Error, KeyServiceFailure, Result};
use crate::kms::KeyService;
use crate::types::EncryptionContext;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_kms::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_kms::operation::decrypt::DecryptError;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::Client;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// KMS-backed key service
#[derive(Clone)]
pub struct KmsKeyService {
    client: Client,
}

impl KmsKeyService {
    /// Wrap an existing KMS client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from shared SDK config, optionally against a custom endpoint
    pub fn from_sdk_config(sdk_config: &SdkConfig, endpoint: Option<&str>) -> Self {
        let mut builder = aws_sdk_kms::config::Builder::from(sdk_config);
        if let Some(endpoint_url) = endpoint {
            debug!("Using custom KMS endpoint: {}", endpoint_url);
            builder = builder.endpoint_url(endpoint_url);
        }
        Self::new(Client::from_conf(builder.build()))
    }
}

#[async_trait]
impl KeyService for KmsKeyService {
    async fn decrypt(
        &self,
        wrapped_key: &[u8],
        context: &EncryptionContext,
        key_id: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let mut request = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(wrapped_key.to_vec()));

        for (key, value) in context {
            request = request.encryption_context(key, value);
        }
        if !key_id.is_empty() {
            request = request.key_id(key_id);
        }

        match request.send().await {
            Ok(output) => output
                .plaintext()
                .map(|blob| Zeroizing::new(blob.as_ref().to_vec()))
                .ok_or_else(|| {
                    Error::key_service(KeyServiceFailure::Other, "kms decrypt returned no plaintext")
                }),
            Err(err) => Err(map_decrypt_error(err)),
        }
    }

    fn name(&self) -> &'static str {
        "kms"
    }
}

impl std::fmt::Debug for KmsKeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmsKeyService").finish_non_exhaustive()
    }
}

fn map_decrypt_error(err: SdkError<DecryptError>) -> Error {
    let message = format!("kms decrypt: {}", DisplayErrorContext(&err));
    let service_error = err.into_service_error();
    let kind = classify(service_error.code());
    warn!(kind = %kind, code = ?service_error.code(), "KMS decrypt failed");
    Error::key_service(kind, message)
}

/// Map a KMS error code to a failure kind
///
/// KMS reports an encryption context mismatch as `InvalidCiphertextException`.
pub(crate) fn classify(code: Option<&str>) -> KeyServiceFailure {
    match code {
        Some("AccessDeniedException") | Some("UnauthorizedException") => {
            KeyServiceFailure::AccessDenied
        }
        Some("NotFoundException") => KeyServiceFailure::KeyNotFound,
        Some("InvalidCiphertextException") | Some("IncorrectKeyException") => {
            KeyServiceFailure::InvalidCiphertext
        }
        Some("DisabledException")
        | Some("KeyUnavailableException")
        | Some("KMSInvalidStateException") => KeyServiceFailure::KeyUnavailable,
        _ => KeyServiceFailure::Other,
    }
}
