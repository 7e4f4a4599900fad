//! mimir-provision - bootstrap secrets and config for a self-hosted
//! Supabase + Voi node stack.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── generate      # Full provisioning run
//! │   ├── tokens        # Token files from an existing .env
//! │   ├── secret        # Print one secret
//! │   ├── completions   # Shell completions
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── config        # mimir-provision.toml and defaults
//!     ├── constants     # File names, sentinels, sizes
//!     ├── secret        # CSPRNG secrets
//!     ├── token         # HS256 bearer tokens
//!     ├── template      # Placeholder substitution
//!     ├── fs            # Owner-only file writes
//!     ├── env           # Reading an existing .env
//!     └── provisioner   # The pipeline
//! ```
//!
//! # Outputs
//!
//! - `supabase/docker/.env` with database, JWT, dashboard, analytics, and
//!   node credentials plus the `anon` and `service_role` keys
//! - `algod-data/algod.token` and `algod-data/algod.admin.token`
//! - `conduit.yml` for the indexing sidecar
//!
//! Every run generates new values; re-running invalidates earlier keys.

pub mod cli;
pub mod core;
pub mod error;
