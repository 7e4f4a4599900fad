//! Provisioner configuration.
//!
//! Loaded once by the CLI from an optional `mimir-provision.toml` in the
//! project root, then overridden by command-line flags. Relative paths are
//! resolved against the root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::{self, sizes};
use crate::core::template::UnresolvedPolicy;
use crate::error::{ConfigError, Result};

/// Full provisioner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvisionConfig {
    /// Project root; set by the loader, never read from the file.
    #[serde(skip)]
    pub root: PathBuf,
    pub paths: Paths,
    pub outputs: Outputs,
    pub secrets: SecretSizes,
    pub conduit: ConduitSettings,
    pub prime: PrimeSettings,
    /// Print secret values in the summary instead of fingerprints.
    pub reveal_secrets: bool,
    /// Leave unresolved placeholders in place instead of failing.
    pub allow_unresolved: bool,
}

/// Input and output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Paths {
    pub templates_dir: PathBuf,
    pub env_template: PathBuf,
    pub conduit_template: PathBuf,
    pub env_output: PathBuf,
    pub node_data_dir: PathBuf,
    pub conduit_output: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from(constants::TEMPLATES_DIR),
            env_template: PathBuf::from(constants::ENV_TEMPLATE),
            conduit_template: PathBuf::from(constants::CONDUIT_TEMPLATE),
            env_output: PathBuf::from(constants::ENV_OUTPUT),
            node_data_dir: PathBuf::from(constants::NODE_DATA_DIR),
            conduit_output: PathBuf::from(constants::CONDUIT_OUTPUT),
        }
    }
}

/// Which outputs to produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Outputs {
    pub env: bool,
    pub node_tokens: bool,
    pub conduit: bool,
}

impl Default for Outputs {
    fn default() -> Self {
        Self {
            env: true,
            node_tokens: true,
            conduit: true,
        }
    }
}

impl Outputs {
    pub fn any(&self) -> bool {
        self.env || self.node_tokens || self.conduit
    }
}

/// Secret sizes in bytes, before encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecretSizes {
    pub postgres_password: usize,
    pub jwt_secret: usize,
    pub dashboard_password: usize,
    pub logflare_api_key: usize,
    pub node_token: usize,
}

impl Default for SecretSizes {
    fn default() -> Self {
        Self {
            postgres_password: sizes::POSTGRES_PASSWORD,
            jwt_secret: sizes::JWT_SECRET,
            dashboard_password: sizes::DASHBOARD_PASSWORD,
            logflare_api_key: sizes::LOGFLARE_API_KEY,
            node_token: sizes::NODE_TOKEN,
        }
    }
}

/// Values substituted into the sidecar template besides generated secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConduitSettings {
    pub postgres_host: String,
    pub postgres_db: String,
    /// Extra `${NAME}` substitutions.
    pub vars: BTreeMap<String, String>,
}

impl Default for ConduitSettings {
    fn default() -> Self {
        Self {
            postgres_host: "db".to_string(),
            postgres_db: "postgres".to_string(),
            vars: BTreeMap::new(),
        }
    }
}

/// Optional link to a prime (upstream) instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrimeSettings {
    pub url: Option<String>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            paths: Paths::default(),
            outputs: Outputs::default(),
            secrets: SecretSizes::default(),
            conduit: ConduitSettings::default(),
            prime: PrimeSettings::default(),
            reveal_secrets: false,
            allow_unresolved: false,
        }
    }
}

impl ProvisionConfig {
    /// Defaults rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load `mimir-provision.toml` from `root` if present, else defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let path = root.join(constants::CONFIG_FILE);
        if path.exists() {
            Self::load_from(&path, root)
        } else {
            debug!(root = %root.display(), "no config file, using defaults");
            Ok(Self::with_root(root))
        }
    }

    /// Load a specific config file, resolving paths against `root`.
    pub fn load_from(path: &Path, root: impl Into<PathBuf>) -> Result<Self> {
        debug!(path = %path.display(), "loading config");

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        config.root = root.into();

        Ok(config)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` on the first problem found.
    pub fn validate(&self) -> Result<()> {
        let s = &self.secrets;
        for (name, len) in [
            ("postgres_password", s.postgres_password),
            ("dashboard_password", s.dashboard_password),
            ("logflare_api_key", s.logflare_api_key),
            ("node_token", s.node_token),
        ] {
            if len == 0 {
                return Err(ConfigError::Invalid(format!("secrets.{} must be at least 1", name)).into());
            }
        }

        // 24 bytes encode to 32 base64 characters, the signing key minimum
        if s.jwt_secret < 24 {
            return Err(ConfigError::Invalid(
                "secrets.jwt_secret must be at least 24 bytes".to_string(),
            )
            .into());
        }

        if let Some(url) = &self.prime.url {
            if url.trim().is_empty() || url.contains(['\n', '\r']) {
                return Err(ConfigError::Invalid("prime.url must be a single non-empty line".to_string()).into());
            }
        }

        Ok(())
    }

    pub fn unresolved_policy(&self) -> UnresolvedPolicy {
        UnresolvedPolicy::from_allow(self.allow_unresolved)
    }

    /// Resolve a path against the root (absolute paths pass through).
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn env_template_path(&self) -> PathBuf {
        self.resolve(&self.paths.templates_dir.join(&self.paths.env_template))
    }

    pub fn conduit_template_path(&self) -> PathBuf {
        self.resolve(&self.paths.templates_dir.join(&self.paths.conduit_template))
    }

    pub fn env_output_path(&self) -> PathBuf {
        self.resolve(&self.paths.env_output)
    }

    pub fn node_data_dir(&self) -> PathBuf {
        self.resolve(&self.paths.node_data_dir)
    }

    pub fn node_token_path(&self) -> PathBuf {
        self.node_data_dir().join(constants::NODE_TOKEN_FILE)
    }

    pub fn node_admin_token_path(&self) -> PathBuf {
        self.node_data_dir().join(constants::NODE_ADMIN_TOKEN_FILE)
    }

    pub fn conduit_output_path(&self) -> PathBuf {
        self.resolve(&self.paths.conduit_output)
    }
}
