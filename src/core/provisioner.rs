//! The provisioning pipeline.
//!
//! ```text
//! load templates → generate secrets → issue tokens → render → write → Report
//! ```
//!
//! All rendering happens in memory before the first write, so a missing
//! template or unresolved placeholder leaves no partial output behind.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::core::config::ProvisionConfig;
use crate::core::constants::{keys, sentinels};
use crate::core::env::ExistingCredentials;
use crate::core::fs::{ensure_directory, write_secret_file};
use crate::core::secret::{generate_secret, Encoding, Secret};
use crate::core::template::{Placeholder, Substitutions, Template};
use crate::core::token::{issue_token, Role};
use crate::error::{Result, TemplateError};

/// Every value generated by one run.
#[derive(Debug, Clone)]
pub struct GeneratedSecrets {
    pub postgres_password: Secret,
    pub jwt_secret: Secret,
    pub dashboard_password: Secret,
    pub logflare_api_key: Secret,
    pub node_token: Secret,
    pub node_admin_token: Secret,
    pub anon_key: Secret,
    pub service_role_key: Secret,
}

impl GeneratedSecrets {
    /// Generate fresh secrets and sign both tokens with the new JWT secret.
    pub fn generate(config: &ProvisionConfig) -> Result<Self> {
        let sizes = &config.secrets;

        let jwt_secret = generate_secret(sizes.jwt_secret, Encoding::Base64)?;
        let anon_key = Secret::new(issue_token(Role::Anon, jwt_secret.expose())?);
        let service_role_key = Secret::new(issue_token(Role::ServiceRole, jwt_secret.expose())?);

        let secrets = Self {
            postgres_password: generate_secret(sizes.postgres_password, Encoding::Base64)?,
            jwt_secret,
            dashboard_password: generate_secret(sizes.dashboard_password, Encoding::Base64)?,
            logflare_api_key: generate_secret(sizes.logflare_api_key, Encoding::Base64)?,
            node_token: generate_secret(sizes.node_token, Encoding::Hex)?,
            node_admin_token: generate_secret(sizes.node_token, Encoding::Hex)?,
            anon_key,
            service_role_key,
        };
        debug!("secrets generated");

        Ok(secrets)
    }

    /// Env key and value pairs, in summary order.
    pub fn entries(&self) -> [(&'static str, &Secret); 8] {
        [
            (keys::POSTGRES_PASSWORD, &self.postgres_password),
            (keys::JWT_SECRET, &self.jwt_secret),
            (keys::DASHBOARD_PASSWORD, &self.dashboard_password),
            (keys::NODE_TOKEN, &self.node_token),
            (keys::NODE_ADMIN_TOKEN, &self.node_admin_token),
            (keys::ANON_KEY, &self.anon_key),
            (keys::SERVICE_ROLE_KEY, &self.service_role_key),
            (keys::LOGFLARE_API_KEY, &self.logflare_api_key),
        ]
    }
}

/// Kind of file produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    Env,
    NodeToken,
    NodeAdminToken,
    Conduit,
}

/// A rendered output ready to write.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub kind: OutputKind,
    pub path: PathBuf,
    pub content: String,
}

/// A file written by a run.
#[derive(Debug, Clone, Serialize)]
pub struct WrittenFile {
    pub kind: OutputKind,
    pub path: PathBuf,
}

/// Summary line for one secret.
#[derive(Debug, Clone, Serialize)]
pub struct SecretSummary {
    pub key: String,
    pub fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub files: Vec<WrittenFile>,
    pub directories_created: Vec<PathBuf>,
    pub secrets: Vec<SecretSummary>,
}

impl Report {
    pub fn path_of(&self, kind: OutputKind) -> Option<&Path> {
        self.files
            .iter()
            .find(|f| f.kind == kind)
            .map(|f| f.path.as_path())
    }
}

/// Runs the pipeline for one configuration.
pub struct Provisioner {
    config: ProvisionConfig,
}

impl Provisioner {
    pub fn new(config: ProvisionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// Generate everything and write the selected outputs.
    ///
    /// # Errors
    ///
    /// Aborts on the first failure. Template and rendering errors occur
    /// before any file is written.
    pub fn run(&self) -> Result<Report> {
        self.config.validate()?;
        let templates = self.load_templates(self.config.outputs.env, self.config.outputs.conduit)?;

        let secrets = GeneratedSecrets::generate(&self.config)?;
        let plan = self.plan(&templates, &secrets)?;

        let mut report = self.write(plan)?;
        report.secrets = self.summarize(
            secrets
                .entries()
                .iter()
                .filter(|(key, _)| self.reports_key(key))
                .copied(),
        );
        Ok(report)
    }

    /// Render every selected output in memory.
    pub fn plan(&self, templates: &Templates, secrets: &GeneratedSecrets) -> Result<Vec<PlannedFile>> {
        let mut plan = Vec::new();

        if let Some(template) = &templates.env {
            plan.push(PlannedFile {
                kind: OutputKind::Env,
                path: self.config.env_output_path(),
                content: self.render_env(template, secrets)?,
            });
        }

        if self.config.outputs.node_tokens {
            plan.extend(self.plan_node_tokens(&secrets.node_token, &secrets.node_admin_token));
        }

        if let Some(template) = &templates.conduit {
            plan.push(PlannedFile {
                kind: OutputKind::Conduit,
                path: self.config.conduit_output_path(),
                content: self.render_conduit(
                    template,
                    &secrets.node_token,
                    &secrets.node_admin_token,
                    &secrets.postgres_password,
                )?,
            });
        }

        Ok(plan)
    }

    /// Write token files and the sidecar config from an earlier run's values.
    pub fn write_token_files(&self, credentials: &ExistingCredentials) -> Result<Report> {
        let templates = self.load_templates(false, self.config.outputs.conduit)?;

        let mut plan: Vec<PlannedFile> = self
            .plan_node_tokens(&credentials.node_token, &credentials.node_admin_token)
            .into();
        if let Some(template) = &templates.conduit {
            plan.push(PlannedFile {
                kind: OutputKind::Conduit,
                path: self.config.conduit_output_path(),
                content: self.render_conduit(
                    template,
                    &credentials.node_token,
                    &credentials.node_admin_token,
                    &credentials.postgres_password,
                )?,
            });
        }

        let mut report = self.write(plan)?;
        report.secrets = self.summarize(
            [
                (keys::NODE_TOKEN, &credentials.node_token),
                (keys::NODE_ADMIN_TOKEN, &credentials.node_admin_token),
            ]
            .into_iter(),
        );
        Ok(report)
    }

    /// Load the templates the selected outputs need.
    pub fn load_templates(&self, env: bool, conduit: bool) -> Result<Templates> {
        let env = env
            .then(|| Template::load(self.config.env_template_path()))
            .transpose()?;
        let conduit = conduit
            .then(|| Template::load(self.config.conduit_template_path()))
            .transpose()?;
        Ok(Templates { env, conduit })
    }

    /// Render the stack env file.
    pub fn render_env(&self, template: &Template, secrets: &GeneratedSecrets) -> Result<String> {
        let mut subs = env_substitutions(secrets);
        if let Some(url) = &self.config.prime.url {
            subs = subs.line(keys::PRIME_SUPABASE_URL, url.as_str());
        }

        let mut rendered = template.render(&subs)?;
        if let Some(url) = &self.config.prime.url {
            if !rendered.matched(&Placeholder::LineKey(keys::PRIME_SUPABASE_URL.to_string())) {
                if !rendered.text().is_empty() && !rendered.text().ends_with('\n') {
                    rendered.append("\n")?;
                }
                rendered.append(&prime_section(url))?;
            }
        }

        rendered.finish(self.config.unresolved_policy())
    }

    /// Render the sidecar config and check it parses as YAML.
    pub fn render_conduit(
        &self,
        template: &Template,
        node_token: &Secret,
        node_admin_token: &Secret,
        postgres_password: &Secret,
    ) -> Result<String> {
        let conduit = &self.config.conduit;
        let mut subs = Substitutions::new()
            .var(keys::NODE_TOKEN, node_token.expose())
            .var(keys::NODE_ADMIN_TOKEN, node_admin_token.expose())
            .var(keys::POSTGRES_HOST, conduit.postgres_host.as_str())
            .var(keys::POSTGRES_PASSWORD, postgres_password.expose())
            .var(keys::POSTGRES_DB, conduit.postgres_db.as_str());
        for (name, value) in &conduit.vars {
            subs = subs.var(name.as_str(), value.as_str());
        }

        let text = template
            .render(&subs)?
            .finish(self.config.unresolved_policy())?;

        serde_yaml::from_str::<serde_yaml::Value>(&text).map_err(|source| {
            TemplateError::InvalidYaml {
                path: template.path().to_path_buf(),
                source,
            }
        })?;

        Ok(text)
    }

    fn plan_node_tokens(&self, node_token: &Secret, node_admin_token: &Secret) -> [PlannedFile; 2] {
        [
            PlannedFile {
                kind: OutputKind::NodeToken,
                path: self.config.node_token_path(),
                content: node_token.expose().to_string(),
            },
            PlannedFile {
                kind: OutputKind::NodeAdminToken,
                path: self.config.node_admin_token_path(),
                content: node_admin_token.expose().to_string(),
            },
        ]
    }

    /// Create output directories, then write every planned file.
    pub fn write(&self, plan: Vec<PlannedFile>) -> Result<Report> {
        let mut report = Report::default();

        for file in &plan {
            if let Some(parent) = file.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                let parent = parent.to_path_buf();
                if !report.directories_created.contains(&parent) && ensure_directory(&parent)? {
                    report.directories_created.push(parent);
                }
            }
        }

        for file in plan {
            write_secret_file(&file.path, &file.content)?;
            info!(kind = ?file.kind, path = %file.path.display(), "wrote output");
            report.files.push(WrittenFile {
                kind: file.kind,
                path: file.path,
            });
        }

        Ok(report)
    }

    fn reports_key(&self, key: &str) -> bool {
        match key {
            keys::NODE_TOKEN | keys::NODE_ADMIN_TOKEN => {
                self.config.outputs.env || self.config.outputs.node_tokens || self.config.outputs.conduit
            }
            keys::POSTGRES_PASSWORD => self.config.outputs.env || self.config.outputs.conduit,
            _ => self.config.outputs.env,
        }
    }

    fn summarize<'a>(&self, entries: impl Iterator<Item = (&'static str, &'a Secret)>) -> Vec<SecretSummary> {
        entries
            .map(|(key, secret)| SecretSummary {
                key: key.to_string(),
                fingerprint: secret.fingerprint(),
                value: self
                    .config
                    .reveal_secrets
                    .then(|| secret.expose().to_string()),
            })
            .collect()
    }
}

/// Templates loaded for a run.
#[derive(Debug, Clone, Default)]
pub struct Templates {
    pub env: Option<Template>,
    pub conduit: Option<Template>,
}

/// Substitutions for the stack env template.
pub fn env_substitutions(secrets: &GeneratedSecrets) -> Substitutions {
    Substitutions::new()
        .require_literal(sentinels::POSTGRES_PASSWORD, secrets.postgres_password.expose())
        .require_literal(sentinels::JWT_SECRET, secrets.jwt_secret.expose())
        .require_literal(sentinels::DASHBOARD_PASSWORD, secrets.dashboard_password.expose())
        .require_literal(sentinels::LOGFLARE_API_KEY, secrets.logflare_api_key.expose())
        .require_line(keys::NODE_TOKEN, secrets.node_token.expose())
        .require_line(keys::NODE_ADMIN_TOKEN, secrets.node_admin_token.expose())
        .require_line(keys::ANON_KEY, secrets.anon_key.expose())
        .require_line(keys::SERVICE_ROLE_KEY, secrets.service_role_key.expose())
}

fn prime_section(url: &str) -> String {
    format!(
        "\n############\n# Prime Mimir Instance\n############\n{}={}\n",
        keys::PRIME_SUPABASE_URL,
        url
    )
}
