//! DynamoDB store for credstash tables
//!
//! Table layout: partition key `name`, sort key `version` (zero-padded
//! string). Each item carries `key` (base64 KMS blob), `contents` (base64
//! ciphertext), `hmac` (hex digest, as a string or as binary holding the hex
//! text) and optionally `digest`.

use crate::error::{Error, Result};
use crate::store::SecretStore;
use crate::types::SecretRecord;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::collections::HashMap;
use tracing::debug;

/// The only digest credstash tables written for AES-CTR payloads
const SUPPORTED_DIGEST: &str = "SHA256";

type Item = HashMap<String, AttributeValue>;

/// DynamoDB-backed secret store
#[derive(Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Wrap an existing DynamoDB client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from shared SDK config, optionally against a custom endpoint
    pub fn from_sdk_config(sdk_config: &SdkConfig, endpoint: Option<&str>) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);
        if let Some(endpoint_url) = endpoint {
            debug!("Using custom DynamoDB endpoint: {}", endpoint_url);
            builder = builder.endpoint_url(endpoint_url);
        }
        Self::new(Client::from_conf(builder.build()))
    }

    async fn get_exact(&self, name: &str, version: &str, table: &str) -> Result<SecretRecord> {
        debug!("Getting secret: {} version {} from {}", name, version, table);

        let resp = self
            .client
            .get_item()
            .table_name(table)
            .key("name", AttributeValue::S(name.to_string()))
            .key("version", AttributeValue::S(version.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| {
                Error::store(format!(
                    "Failed to get {} version {} from {}: {}",
                    name,
                    version,
                    table,
                    DisplayErrorContext(&e)
                ))
            })?;

        match resp.item() {
            Some(item) => record_from_item(item),
            None => Err(Error::not_found(name, Some(version), table)),
        }
    }

    async fn get_latest(&self, name: &str, table: &str) -> Result<SecretRecord> {
        debug!("Querying all versions of {} in {}", name, table);

        let mut latest: Option<(String, Item)> = None;
        let mut seen = 0usize;
        let mut start_key: Option<Item> = None;

        loop {
            let resp = self
                .client
                .query()
                .table_name(table)
                .key_condition_expression("#n = :name")
                .expression_attribute_names("#n", "name")
                .expression_attribute_values(":name", AttributeValue::S(name.to_string()))
                .consistent_read(true)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| {
                    Error::store(format!(
                        "Failed to query {} in {}: {}",
                        name,
                        table,
                        DisplayErrorContext(&e)
                    ))
                })?;

            // Only the newest item is decoded
            for item in resp.items() {
                seen += 1;
                let Some(version) = string_attr(item, "version") else {
                    continue;
                };
                if latest.as_ref().is_none_or(|(best, _)| version > *best) {
                    latest = Some((version, item.clone()));
                }
            }

            match resp.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!("Found {} versions of {}", seen, name);
        match latest {
            Some((_, item)) => record_from_item(&item),
            None => Err(Error::not_found(name, None, table)),
        }
    }
}

#[async_trait]
impl SecretStore for DynamoDbStore {
    async fn get_record(
        &self,
        name: &str,
        version: Option<&str>,
        table: &str,
    ) -> Result<SecretRecord> {
        match version {
            Some(version) => self.get_exact(name, version, table).await,
            None => self.get_latest(name, table).await,
        }
    }

    fn name(&self) -> &'static str {
        "dynamodb"
    }
}

impl std::fmt::Debug for DynamoDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbStore").finish_non_exhaustive()
    }
}

/// Decode one table item into a record
pub(crate) fn record_from_item(item: &Item) -> Result<SecretRecord> {
    let name = string_attr(item, "name").unwrap_or_default();
    let version = string_attr(item, "version").unwrap_or_default();
    let malformed = |reason: String| Error::malformed(&name, &version, reason);

    if name.is_empty() || version.is_empty() {
        return Err(malformed("missing name or version attribute".to_string()));
    }

    if let Some(digest) = string_attr(item, "digest") {
        if digest != SUPPORTED_DIGEST {
            return Err(malformed(format!("unsupported digest {}", digest)));
        }
    }

    let wrapped_key = bytes_attr(item, "key").map_err(&malformed)?;
    let ciphertext = bytes_attr(item, "contents").map_err(&malformed)?;
    let hmac_digest = match item.get("hmac") {
        Some(AttributeValue::S(hex)) => hex.clone(),
        Some(AttributeValue::B(blob)) => String::from_utf8(blob.as_ref().to_vec())
            .map_err(|_| malformed("binary hmac attribute is not hex text".to_string()))?,
        Some(_) => return Err(malformed("hmac attribute has unexpected type".to_string())),
        None => return Err(malformed("missing hmac attribute".to_string())),
    };

    Ok(SecretRecord {
        name: name.clone(),
        version: version.clone(),
        wrapped_key,
        ciphertext,
        hmac_digest,
    })
}

fn string_attr(item: &Item, attr: &str) -> Option<String> {
    match item.get(attr) {
        Some(AttributeValue::S(value)) => Some(value.clone()),
        _ => None,
    }
}

/// Base64 text, or raw binary
fn bytes_attr(item: &Item, attr: &str) -> std::result::Result<Vec<u8>, String> {
    match item.get(attr) {
        Some(AttributeValue::S(encoded)) => BASE64
            .decode(encoded.trim())
            .map_err(|e| format!("{} attribute is not valid base64: {}", attr, e)),
        Some(AttributeValue::B(blob)) => Ok(blob.as_ref().to_vec()),
        Some(_) => Err(format!("{} attribute has unexpected type", attr)),
        None => Err(format!("missing {} attribute", attr)),
    }
}
