//! Tokens command - write node token files from an existing env file.
//!
//! Values come from the env file, overridden by process environment.

use std::path::Path;

use tracing::debug;

use crate::cli::{load_config, output, TokensArgs};
use crate::core::env::{load_env_file, ExistingCredentials};
use crate::core::provisioner::Provisioner;
use crate::error::Result;

/// Write token files and sidecar config without generating new secrets.
pub fn execute(args: TokensArgs, config_file: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_file, &args.paths)?;
    if args.no_conduit {
        config.outputs.conduit = false;
    }
    config.allow_unresolved |= args.allow_unresolved;

    let env_file = args
        .env_file
        .as_deref()
        .map(|p| config.resolve(p))
        .unwrap_or_else(|| config.env_output_path());
    debug!(path = %env_file.display(), "reading existing credentials");

    let file_vars = load_env_file(&env_file)?;
    let credentials = ExistingCredentials::from_lookup(|key| {
        std::env::var(key)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| file_vars.get(key).cloned())
    })?;

    let report = Provisioner::new(config).write_token_files(&credentials)?;

    for dir in &report.directories_created {
        output::success(&format!("created {}", output::path(&dir.display().to_string())));
    }
    for file in &report.files {
        output::success(&format!("wrote {}", output::path(&file.path.display().to_string())));
    }
    for secret in &report.secrets {
        output::kv(&secret.key, &secret.fingerprint);
    }

    Ok(())
}
