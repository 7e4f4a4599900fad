//! Test support utilities for mimir-provision integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]


#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Test environment with an isolated project root.
///
/// Child processes run with `.current_dir()` set to the root, so tests
/// can run in parallel without touching process-global state.
pub struct Test {
    /// Temporary project root
    pub dir: TempDir,
}

impl Test {
    /// Create an empty project root.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// Create a project root with the shipped templates copied in.
    pub fn with_templates() -> Self {
        let t = Self::new();
        let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
        for name in [".env.template", "conduit.yml.template"] {
            t.write(&format!("templates/{}", name), &std::fs::read_to_string(shipped.join(name)).unwrap());
        }
        t
    }

    /// Create a project root with the given template contents.
    pub fn with(env_template: &str, conduit_template: &str) -> Self {
        let t = Self::new();
        t.write("templates/.env.template", env_template);
        t.write("templates/conduit.yml.template", conduit_template);
        t
    }

    /// Absolute path inside the project root.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file (creating parents) inside the project root.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Read a file inside the project root.
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("failed to read {}: {}", rel, e))
    }

    /// Parse the generated env file into a map.
    pub fn env_vars(&self) -> BTreeMap<String, String> {
        parse_env(&self.read(ENV_OUTPUT))
    }
}

/// Split `KEY=value` lines, skipping comments and blanks.
pub fn parse_env(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| l.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
