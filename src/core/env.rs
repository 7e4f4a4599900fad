//! Reading credentials back from an existing environment file.
//!
//! Used when token files and the sidecar config are regenerated from a
//! `.env` written by an earlier run, without generating new secrets.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::core::constants::{keys, sentinels};
use crate::core::secret::Secret;
use crate::error::{EnvError, Result};

/// Credentials the token-files step needs.
#[derive(Debug, Clone)]
pub struct ExistingCredentials {
    pub node_token: Secret,
    pub node_admin_token: Secret,
    pub postgres_password: Secret,
}

impl ExistingCredentials {
    /// Build from a key lookup.
    ///
    /// Empty values count as missing.
    ///
    /// # Errors
    ///
    /// Returns `EnvError::MissingVariables` naming every absent key, or
    /// `EnvError::PlaceholderValues` naming every key still set to a
    /// template placeholder.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut placeholders = Vec::new();
        let mut take = |key: &str| match lookup(key).filter(|v| !v.is_empty()) {
            Some(value) => {
                if is_placeholder(&value) {
                    placeholders.push(key.to_string());
                }
                Some(Secret::new(value))
            }
            None => {
                missing.push(key.to_string());
                None
            }
        };

        let node_token = take(keys::NODE_TOKEN);
        let node_admin_token = take(keys::NODE_ADMIN_TOKEN);
        let postgres_password = take(keys::POSTGRES_PASSWORD);

        let (Some(node_token), Some(node_admin_token), Some(postgres_password)) =
            (node_token, node_admin_token, postgres_password)
        else {
            return Err(EnvError::MissingVariables(missing).into());
        };
        if !placeholders.is_empty() {
            return Err(EnvError::PlaceholderValues(placeholders).into());
        }

        Ok(Self {
            node_token,
            node_admin_token,
            postgres_password,
        })
    }

    /// Build from a parsed env file.
    pub fn from_map(vars: &BTreeMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }
}

/// Whether `value` is a stand-in shipped in the env template.
fn is_placeholder(value: &str) -> bool {
    value == sentinels::GENERATED || sentinels::ALL.contains(&value)
}

/// Parse an env file into a map.
///
/// A missing file yields an empty map so that values can still come from
/// elsewhere; any other read or parse failure is an error.
///
/// # Errors
///
/// Returns `EnvError::Read` if the file exists but cannot be parsed.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>> {
    let path = path.as_ref();

    if !path.exists() {
        debug!(path = %path.display(), "env file not found, starting empty");
        return Ok(BTreeMap::new());
    }

    let wrap = |source: dotenvy::Error| EnvError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut vars = BTreeMap::new();
    for item in dotenvy::from_path_iter(path).map_err(wrap)? {
        let (key, value) = item.map_err(wrap)?;
        vars.insert(key, value);
    }

    debug!(path = %path.display(), count = vars.len(), "env file loaded");
    Ok(vars)
}
