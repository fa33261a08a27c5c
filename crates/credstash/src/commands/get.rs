//! Get command
//!
//! Reads one secret and writes it to stdout, either raw or as a shell
//! `export` line.

use anyhow::{Context, Result};
use clap::Args;
use credstash_core::{CredstashConfig, EncryptionContext, SecretClient};
use tracing::debug;

use crate::cli::GlobalArgs;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Secret name
    pub name: String,

    /// Exact zero-padded version (defaults to the latest)
    #[arg(long)]
    pub version: Option<String>,

    /// Table to read from for this call
    #[arg(long, env = "CREDSTASH_TABLE")]
    pub table: Option<String>,

    /// Encryption context pair, repeatable
    #[arg(short = 'c', long = "context", value_name = "KEY=VALUE", value_parser = parse_context_pair)]
    pub context: Vec<(String, String)>,

    /// Print as `export NAME='value'`
    #[arg(long)]
    pub export: bool,
}

pub async fn run(args: GetArgs, global: &GlobalArgs) -> Result<()> {
    let config = build_config(global)?;
    let client = SecretClient::from_config(&config)
        .await
        .context("Failed to set up AWS clients")?;

    let context: EncryptionContext = args.context.iter().cloned().collect();
    let secret = client
        .get_secret(
            &args.name,
            args.table.as_deref().unwrap_or(""),
            args.version.as_deref().unwrap_or(""),
            &context,
        )
        .await
        .with_context(|| format!("Failed to get secret '{}'", args.name))?;

    if args.export {
        println!("{}", export_line(&args.name, secret.expose()));
    } else {
        println!("{}", secret.expose());
    }

    Ok(())
}

/// File settings overlaid with command-line flags, then validated
fn build_config(global: &GlobalArgs) -> Result<CredstashConfig> {
    let mut config = match &global.config {
        Some(path) => CredstashConfig::from_file(path)?,
        None => CredstashConfig::default(),
    };

    if let Some(region) = &global.region {
        config.region = Some(region.clone());
    }
    if let Some(profile) = &global.profile {
        config.profile = profile.clone();
    }
    if let Some(key_id) = &global.key_id {
        config.key_id = key_id.clone();
    }

    config.apply_env();
    config.validate().context("Invalid configuration")?;
    debug!("Using table {} and key {}", config.table, config.key_id);
    Ok(config)
}

fn parse_context_pair(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

/// Shell-safe export line; the name is upper-cased with separators mapped to `_`
fn export_line(name: &str, value: &str) -> String {
    let env_name: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("export {}='{}'", env_name, value.replace('\'', r"'\''"))
}
