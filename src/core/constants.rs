//! Constants used throughout mimir-provision.
//!
//! Centralizes file names, template sentinels, and secret sizes.

/// Optional configuration file name, looked up in the project root.
pub const CONFIG_FILE: &str = "mimir-provision.toml";

/// Directory holding the templates, relative to the root.
pub const TEMPLATES_DIR: &str = "templates";

/// Environment template file name.
pub const ENV_TEMPLATE: &str = ".env.template";

/// Sidecar (Conduit) template file name.
pub const CONDUIT_TEMPLATE: &str = "conduit.yml.template";

/// Environment output, relative to the root.
pub const ENV_OUTPUT: &str = "supabase/docker/.env";

/// Node data directory, relative to the root.
pub const NODE_DATA_DIR: &str = "algod-data";

/// Sidecar config output, relative to the root.
pub const CONDUIT_OUTPUT: &str = "conduit.yml";

/// Node API token file name.
pub const NODE_TOKEN_FILE: &str = "algod.token";

/// Node admin API token file name.
pub const NODE_ADMIN_TOKEN_FILE: &str = "algod.admin.token";

/// Mode for every file written by the provisioner.
pub const SECRET_FILE_MODE: u32 = 0o600;

/// Issuer claim expected by the stack's API gateway.
pub const TOKEN_ISSUER: &str = "supabase";

/// Token lifetime: ten 365-day years, in seconds.
pub const TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Minimum signing key length accepted by the consuming services.
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// Default secret sizes in bytes (before encoding).
pub mod sizes {
    pub const POSTGRES_PASSWORD: usize = 32;
    pub const JWT_SECRET: usize = 32;
    pub const DASHBOARD_PASSWORD: usize = 24;
    pub const LOGFLARE_API_KEY: usize = 16;
    pub const NODE_TOKEN: usize = 32;
}

/// Sentinel strings shipped in the upstream env template.
pub mod sentinels {
    pub const POSTGRES_PASSWORD: &str = "your-super-secret-and-long-postgres-password";
    pub const JWT_SECRET: &str = "your-super-secret-jwt-token-with-at-least-32-characters";
    pub const DASHBOARD_PASSWORD: &str = "this-is-a-secure-dashboard-password";
    pub const LOGFLARE_API_KEY: &str = "your-super-secret-logflare-key";

    /// Stand-in value for line keys in the shipped env template.
    pub const GENERATED: &str = "generated-by-mimir-provision";

    /// All literal sentinels; none may survive a strict render.
    pub const ALL: &[&str] = &[
        POSTGRES_PASSWORD,
        JWT_SECRET,
        DASHBOARD_PASSWORD,
        LOGFLARE_API_KEY,
    ];
}

/// Environment keys written or read by the provisioner.
pub mod keys {
    pub const POSTGRES_PASSWORD: &str = "POSTGRES_PASSWORD";
    pub const JWT_SECRET: &str = "JWT_SECRET";
    pub const DASHBOARD_PASSWORD: &str = "DASHBOARD_PASSWORD";
    pub const LOGFLARE_API_KEY: &str = "LOGFLARE_API_KEY";
    pub const NODE_TOKEN: &str = "NODE_TOKEN";
    pub const NODE_ADMIN_TOKEN: &str = "NODE_ADMIN_TOKEN";
    pub const ANON_KEY: &str = "ANON_KEY";
    pub const SERVICE_ROLE_KEY: &str = "SERVICE_ROLE_KEY";
    pub const PRIME_SUPABASE_URL: &str = "PRIME_SUPABASE_URL";
    pub const POSTGRES_HOST: &str = "POSTGRES_HOST";
    pub const POSTGRES_DB: &str = "POSTGRES_DB";
}
