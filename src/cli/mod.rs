//! Command-line interface.

pub mod completions;
pub mod generate;
pub mod output;
pub mod secret;
pub mod tokens;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::core::config::ProvisionConfig;
use crate::error::Result;

/// Bootstrap secrets, tokens, and service config for a self-hosted stack.
#[derive(Parser)]
#[command(
    name = "mimir-provision",
    about = "Bootstrap secrets, tokens, and service config for a self-hosted Supabase + Voi node stack",
    version,
    after_help = "Every run generates NEW secrets. Previously distributed keys stop working."
)]
pub struct Cli {
    /// Enable debug logging (also enabled by DEBUG=1)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (default: <root>/mimir-provision.toml)
    #[arg(long, global = true, env = "MIMIR_PROVISION_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Generate secrets and write the env file, node tokens, and sidecar config
    Generate(GenerateArgs),

    /// Write node token files and sidecar config from an existing env file
    Tokens(TokensArgs),

    /// Print a single freshly generated secret
    Secret {
        /// Number of random bytes before encoding
        #[arg(short, long, default_value_t = 32)]
        bytes: usize,
        /// Hex-encode instead of base64
        #[arg(long)]
        hex: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Location flags shared by `generate` and `tokens`.
#[derive(Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Project root that relative paths resolve against
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Templates directory
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Node data directory for algod.token and algod.admin.token
    #[arg(long)]
    pub node_data: Option<PathBuf>,

    /// Sidecar config output path
    #[arg(long)]
    pub conduit_out: Option<PathBuf>,
}

/// Flags for `generate`.
#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Env file output path
    #[arg(long)]
    pub env_out: Option<PathBuf>,

    /// Skip the env file
    #[arg(long)]
    pub no_env: bool,

    /// Skip the node token files
    #[arg(long)]
    pub no_node_tokens: bool,

    /// Skip the sidecar config
    #[arg(long)]
    pub no_conduit: bool,

    /// Append a PRIME_SUPABASE_URL section pointing at this instance
    #[arg(long, env = "MIMIR_PRIME_URL")]
    pub prime_url: Option<String>,

    /// Print secret values instead of fingerprints
    #[arg(long)]
    pub show_secrets: bool,

    /// Leave unresolved placeholders in place instead of failing
    #[arg(long)]
    pub allow_unresolved: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Overwrite existing outputs without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Flags for `tokens`.
#[derive(Args, Debug, Clone, Default)]
pub struct TokensArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Existing env file to read (default: the env output path)
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Skip the sidecar config
    #[arg(long)]
    pub no_conduit: bool,

    /// Leave unresolved placeholders in place instead of failing
    #[arg(long)]
    pub allow_unresolved: bool,
}

/// Load configuration and apply the shared path flags.
pub fn load_config(config_file: Option<&Path>, paths: &PathArgs) -> Result<ProvisionConfig> {
    let mut config = match config_file {
        Some(file) => ProvisionConfig::load_from(file, paths.root.clone())?,
        None => ProvisionConfig::load(paths.root.clone())?,
    };

    if let Some(dir) = &paths.templates {
        config.paths.templates_dir = dir.clone();
    }
    if let Some(dir) = &paths.node_data {
        config.paths.node_data_dir = dir.clone();
    }
    if let Some(out) = &paths.conduit_out {
        config.paths.conduit_output = out.clone();
    }

    Ok(config)
}

/// Execute a command.
pub fn execute(command: Command, config_file: Option<PathBuf>) -> Result<()> {
    match command {
        Command::Generate(args) => generate::execute(args, config_file.as_deref()),
        Command::Tokens(args) => tokens::execute(args, config_file.as_deref()),
        Command::Secret { bytes, hex } => secret::execute(bytes, hex),
        Command::Completions { shell } => completions::execute(shell),
    }
}
