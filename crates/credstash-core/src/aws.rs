//! AWS session construction
//!
//! Credentials come from one of three places, checked in order: a named
//! shared-config profile, an assumed role, or the default provider chain.

use crate::config::CredstashConfig;
use crate::error::Result;
use aws_config::sts::AssumeRoleProvider;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_dynamodb::config::Region;
use std::time::Duration;
use tracing::debug;

/// STS session name used when assuming a role
const ROLE_SESSION_NAME: &str = "credstash";

/// Load shared SDK config for the configured region and credentials
pub async fn load_sdk_config(config: &CredstashConfig) -> Result<SdkConfig> {
    let region = Region::new(config.region()?.to_string());
    let loader = aws_config::defaults(BehaviorVersion::latest()).region(region.clone());

    let sdk_config = if config.uses_named_profile() {
        debug!("Creating a session for profile: {}", config.profile);
        loader.profile_name(&config.profile).load().await
    } else if let Some(role) = &config.assume_role {
        debug!("Creating a session with assume role: {}", role.role_arn);
        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(region.clone())
            .load()
            .await;

        let mut builder = AssumeRoleProvider::builder(&role.role_arn)
            .session_name(ROLE_SESSION_NAME)
            .region(region)
            .configure(&base);
        if let Some(secs) = role.duration_seconds {
            builder = builder.session_length(Duration::from_secs(secs));
        }

        loader.credentials_provider(builder.build().await).load().await
    } else {
        loader.load().await
    };

    debug!("Configured AWS session for region {}", config.region()?);
    Ok(sdk_config)
}
