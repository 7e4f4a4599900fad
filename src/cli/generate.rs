//! Generate command - provision every secret and config file.

use std::path::{Path, PathBuf};

use dialoguer::Confirm;
use tracing::{debug, info};

use crate::cli::{load_config, output, GenerateArgs};
use crate::core::config::ProvisionConfig;
use crate::core::provisioner::{OutputKind, Provisioner, Report};
use crate::error::{ConfigError, Error, Result};

/// Run the full provisioning pipeline.
pub fn execute(args: GenerateArgs, config_file: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_file, &args.paths)?;
    apply_flags(&mut config, &args);

    if !config.outputs.any() {
        return Err(ConfigError::Invalid("every output is disabled, nothing to generate".to_string()).into());
    }

    confirm_overwrite(&config, args.yes)?;

    info!(root = %config.root.display(), "provisioning");
    let report = Provisioner::new(config.clone()).run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &config);
    }

    Ok(())
}

fn apply_flags(config: &mut ProvisionConfig, args: &GenerateArgs) {
    if let Some(out) = &args.env_out {
        config.paths.env_output = out.clone();
    }
    if args.no_env {
        config.outputs.env = false;
    }
    if args.no_node_tokens {
        config.outputs.node_tokens = false;
    }
    if args.no_conduit {
        config.outputs.conduit = false;
    }
    if let Some(url) = &args.prime_url {
        config.prime.url = Some(url.clone());
    }
    config.reveal_secrets |= args.show_secrets;
    config.allow_unresolved |= args.allow_unresolved;
}

/// Outputs from an earlier run that this run would replace.
fn existing_outputs(config: &ProvisionConfig) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if config.outputs.env {
        candidates.push(config.env_output_path());
    }
    if config.outputs.node_tokens {
        candidates.push(config.node_token_path());
        candidates.push(config.node_admin_token_path());
    }
    if config.outputs.conduit {
        candidates.push(config.conduit_output_path());
    }
    candidates.into_iter().filter(|p| p.exists()).collect()
}

/// Warn before replacing live secrets; ask when attached to a terminal.
fn confirm_overwrite(config: &ProvisionConfig, yes: bool) -> Result<()> {
    let existing = existing_outputs(config);
    if existing.is_empty() {
        return Ok(());
    }

    for path in &existing {
        debug!(path = %path.display(), "existing output");
    }
    output::warn(&format!(
        "{} existing output(s) will be replaced with NEW secrets; keys handed out earlier stop working",
        existing.len()
    ));

    if yes || !atty::is(atty::Stream::Stdin) {
        return Ok(());
    }

    let proceed = Confirm::new()
        .with_prompt("Regenerate all secrets?")
        .default(false)
        .interact()
        .map_err(|e| Error::Prompt(e.to_string()))?;

    if proceed {
        Ok(())
    } else {
        Err(Error::Aborted)
    }
}

fn print_summary(report: &Report, config: &ProvisionConfig) {
    for dir in &report.directories_created {
        output::success(&format!("created {}", output::path(&dir.display().to_string())));
    }
    for file in &report.files {
        output::success(&format!("wrote {}", output::path(&file.path.display().to_string())));
    }

    output::section(if config.reveal_secrets {
        "Generated values"
    } else {
        "Generated values (fingerprints)"
    });
    for secret in &report.secrets {
        match &secret.value {
            Some(value) => output::kv(&secret.key, value),
            None => output::kv(&secret.key, &secret.fingerprint),
        }
    }

    if !config.reveal_secrets {
        println!();
        match report.path_of(OutputKind::Env) {
            Some(env) => output::dimmed(&format!(
                "values are in {}; pass --show-secrets to print them",
                env.display()
            )),
            None => output::dimmed("pass --show-secrets to print the values"),
        }
    }

    if report.path_of(OutputKind::Env).is_some() {
        println!();
        output::dimmed("Analytics use Postgres as the backend. To use hosted Logflare instead,");
        output::dimmed("replace LOGFLARE_API_KEY in the env file with your Logflare key and");
        output::dimmed("enable the BigQuery settings in docker-compose.yml.");
        if config.prime.url.is_none() {
            output::dimmed("Set PRIME_SUPABASE_URL (or pass --prime-url) to link a prime instance.");
        }
    }
}
