//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub use crate::commands::get::GetArgs;

/// credstash - read secrets stored with KMS envelope encryption
#[derive(Parser, Debug)]
#[command(name = "credstash")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to a YAML config file
    #[arg(long, global = true, env = "CREDSTASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// AWS region (defaults to AWS_REGION / AWS_DEFAULT_REGION)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Shared-config profile
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// KMS key id or alias
    #[arg(long, global = true, env = "CREDSTASH_KEY_ID")]
    pub key_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch and decrypt a secret
    Get(GetArgs),
}
