//! Core library components.
//!
//! Secret generation, token signing, template rendering, and the
//! provisioning pipeline. Nothing here reads process environment; the CLI
//! loads configuration and passes it in.

pub mod config;
pub mod constants;
pub mod env;
pub mod fs;
pub mod provisioner;
pub mod secret;
pub mod template;
pub mod token;
