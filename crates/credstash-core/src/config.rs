//! Client configuration
//!
//! `CredstashConfig` describes where secrets live and how to reach AWS. It is
//! loaded once (YAML file, then environment fallbacks), validated, and then
//! reduced to an immutable [`ClientConfig`] for the secret client.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Default credstash table name
pub const DEFAULT_TABLE: &str = "credential-store";

/// Default KMS key used by credstash
pub const DEFAULT_KEY_ID: &str = "alias/credstash";

/// Shared-config profile that means "use the default credential chain"
pub const DEFAULT_PROFILE: &str = "default";

/// Bounds STS enforces on assumed-role sessions
const MIN_ROLE_DURATION_SECS: u64 = 900;
const MAX_ROLE_DURATION_SECS: u64 = 43_200;

/// Environment variables consulted for the region, in order
const REGION_ENV_VARS: [&str; 2] = ["AWS_REGION", "AWS_DEFAULT_REGION"];

/// Full configuration for reaching a credstash table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredstashConfig {
    /// AWS region (falls back to AWS_REGION / AWS_DEFAULT_REGION)
    #[serde(default)]
    pub region: Option<String>,
    /// DynamoDB table holding the secrets
    #[serde(default = "default_table")]
    pub table: String,
    /// KMS key id or alias passed to decrypt
    #[serde(default = "default_key_id")]
    pub key_id: String,
    /// Shared-config profile
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Role to assume before calling AWS (ignored when a profile is set)
    #[serde(default)]
    pub assume_role: Option<AssumeRoleConfig>,
    /// Custom service endpoints (DynamoDB Local, LocalStack)
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_key_id() -> String {
    DEFAULT_KEY_ID.to_string()
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

impl Default for CredstashConfig {
    fn default() -> Self {
        Self {
            region: None,
            table: default_table(),
            key_id: default_key_id(),
            profile: default_profile(),
            assume_role: None,
            endpoints: EndpointConfig::default(),
        }
    }
}

/// STS AssumeRole settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumeRoleConfig {
    /// ARN of the role to assume
    pub role_arn: String,
    /// Session duration in seconds
    #[serde(default)]
    pub duration_seconds: Option<u64>,
}

/// Optional endpoint overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub dynamodb: Option<String>,
    #[serde(default)]
    pub kms: Option<String>,
}

impl CredstashConfig {
    /// Load from an optional YAML file, then fill the region from the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let expanded_path = shellexpand::tilde(&path.to_string_lossy()).to_string();
        debug!("Loading config from {}", expanded_path);

        let content = std::fs::read_to_string(&expanded_path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", expanded_path, e))
        })?;

        Self::from_yaml(&content)
            .map_err(|e| Error::config(format!("{} ({})", e, expanded_path)))
    }

    /// Parse YAML config text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml_ng::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))
    }

    /// Fill an unset region from AWS_REGION, then AWS_DEFAULT_REGION
    pub fn apply_env(&mut self) {
        if self.region.as_deref().is_some_and(|r| !r.is_empty()) {
            return;
        }
        self.region = REGION_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty());
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        match self.region.as_deref() {
            Some(region) if !region.is_empty() => {}
            _ => {
                return Err(Error::config(
                    "region is required (set it in the config file, AWS_REGION or AWS_DEFAULT_REGION)",
                ))
            }
        }

        if self.table.is_empty() {
            return Err(Error::config("table must not be empty"));
        }

        if let Some(role) = &self.assume_role {
            if role.role_arn.is_empty() {
                return Err(Error::config("assume_role.role_arn must not be empty"));
            }
            if let Some(secs) = role.duration_seconds {
                if !(MIN_ROLE_DURATION_SECS..=MAX_ROLE_DURATION_SECS).contains(&secs) {
                    return Err(Error::config(format!(
                        "assume_role.duration_seconds must be between {} and {}, got {}",
                        MIN_ROLE_DURATION_SECS, MAX_ROLE_DURATION_SECS, secs
                    )));
                }
            }
        }

        Ok(())
    }

    /// Region, once validated
    pub fn region(&self) -> Result<&str> {
        self.region
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| Error::config("region is required"))
    }

    /// Whether a named (non-default) profile is selected
    pub fn uses_named_profile(&self) -> bool {
        !self.profile.is_empty() && self.profile != DEFAULT_PROFILE
    }

    /// Immutable settings the secret client needs
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.table.clone(), self.key_id.clone())
    }
}

/// Read-only settings shared by every `get_secret` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    table: String,
    key_id: String,
}

impl ClientConfig {
    pub fn new(table: impl Into<String>, key_id: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key_id: key_id.into(),
        }
    }

    /// KMS key id passed to decrypt
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Caller's table override, or the default when the override is empty
    pub fn resolve_table<'a>(&'a self, table: &'a str) -> &'a str {
        if table.is_empty() {
            &self.table
        } else {
            table
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE, DEFAULT_KEY_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_region_env() {
        for var in REGION_ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let config = CredstashConfig::default();
        assert_eq!(config.table, "credential-store");
        assert_eq!(config.key_id, "alias/credstash");
        assert_eq!(config.profile, "default");
        assert!(!config.uses_named_profile());
        assert!(config.assume_role.is_none());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = CredstashConfig::from_yaml("region: eu-west-1\ntable: secrets\n").unwrap();
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.table, "secrets");
        assert_eq!(config.key_id, DEFAULT_KEY_ID);
    }

    #[test]
    fn test_from_yaml_full() {
        let yaml = r#"
region: us-west-2
table: team-secrets
key_id: alias/team
profile: ops
assume_role:
  role_arn: arn:aws:iam::123456789012:role/reader
  duration_seconds: 3600
endpoints:
  dynamodb: http://localhost:8000
  kms: http://localhost:4566
"#;
        let config = CredstashConfig::from_yaml(yaml).unwrap();
        assert!(config.uses_named_profile());
        let role = config.assume_role.as_ref().unwrap();
        assert_eq!(role.duration_seconds, Some(3600));
        assert_eq!(config.endpoints.kms.as_deref(), Some("http://localhost:4566"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_invalid() {
        let err = CredstashConfig::from_yaml("table: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_validate_role_duration_bounds() {
        let mut config = CredstashConfig {
            region: Some("us-east-1".to_string()),
            assume_role: Some(AssumeRoleConfig {
                role_arn: "arn:aws:iam::123456789012:role/reader".to_string(),
                duration_seconds: Some(60),
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.assume_role.as_mut().unwrap().duration_seconds = Some(900);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_role_arn() {
        let config = CredstashConfig {
            region: Some("us-east-1".to_string()),
            assume_role: Some(AssumeRoleConfig {
                role_arn: String::new(),
                duration_seconds: None,
            }),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("role_arn"));
    }

    #[test]
    fn test_validate_empty_table() {
        let config = CredstashConfig {
            region: Some("us-east-1".to_string()),
            table: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_region_from_env() {
        clear_region_env();
        std::env::set_var("AWS_DEFAULT_REGION", "ap-southeast-2");

        let config = CredstashConfig::load(None).unwrap();
        assert_eq!(config.region().unwrap(), "ap-southeast-2");

        std::env::set_var("AWS_REGION", "us-east-2");
        let config = CredstashConfig::load(None).unwrap();
        assert_eq!(config.region().unwrap(), "us-east-2");

        clear_region_env();
    }

    #[test]
    #[serial]
    fn test_file_region_wins_over_env() {
        clear_region_env();
        std::env::set_var("AWS_REGION", "us-east-2");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "region: eu-central-1").unwrap();

        let config = CredstashConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.region().unwrap(), "eu-central-1");

        clear_region_env();
    }

    #[test]
    #[serial]
    fn test_missing_region_is_error() {
        clear_region_env();
        let err = CredstashConfig::load(None).unwrap_err();
        assert!(err.to_string().contains("region is required"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = CredstashConfig::from_file(Path::new("/nonexistent/credstash.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_client_config_resolve_table() {
        let client = CredstashConfig::default().client_config();
        assert_eq!(client.resolve_table(""), "credential-store");
        assert_eq!(client.resolve_table("other"), "other");
        assert_eq!(client.key_id(), "alias/credstash");
    }
}
