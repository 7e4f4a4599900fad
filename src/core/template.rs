//! Template loading and placeholder substitution.
//!
//! Three placeholder kinds are supported:
//!
//! - literal sentinels, e.g. `your-super-secret-jwt-token-with-at-least-32-characters`
//! - line keys, e.g. `NODE_TOKEN=...`, where the whole value after `=` is replaced
//! - variables, e.g. `${POSTGRES_PASSWORD}`
//!
//! Text outside placeholders is returned byte-for-byte.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Result, TemplateError};

/// Upstream sentinel prefixes that mark a value the operator must change.
const SENTINEL_PATTERN: &str = r"\b(?:your-super-secret|this-is-a-secure)-[A-Za-z0-9-]+";

/// `${NAME}` variable syntax.
const VARIABLE_PATTERN: &str = r"\$\{[A-Za-z_][A-Za-z0-9_]*\}";

/// A marker in a template where a generated value goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// Exact text, every occurrence replaced.
    Literal(String),
    /// `KEY=value` line, value replaced on every line with this key.
    LineKey(String),
    /// `${NAME}` variable, every occurrence replaced.
    Variable(String),
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Literal(s) => write!(f, "{}", s),
            Placeholder::LineKey(k) => write!(f, "{}=", k),
            Placeholder::Variable(v) => write!(f, "${{{}}}", v),
        }
    }
}

/// What to do when placeholder text is left in a rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPolicy {
    #[default]
    Fail,
    PassThrough,
}

impl UnresolvedPolicy {
    pub fn from_allow(allow_unresolved: bool) -> Self {
        if allow_unresolved {
            Self::PassThrough
        } else {
            Self::Fail
        }
    }
}

/// One placeholder and the value that replaces it.
#[derive(Debug, Clone)]
struct Entry {
    placeholder: Placeholder,
    value: String,
    required: bool,
}

/// Ordered placeholder → value mapping.
#[derive(Debug, Clone, Default)]
pub struct Substitutions {
    entries: Vec<Entry>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal(self, sentinel: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Placeholder::Literal(sentinel.into()), value.into(), false)
    }

    pub fn line(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Placeholder::LineKey(key.into()), value.into(), false)
    }

    pub fn var(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Placeholder::Variable(name.into()), value.into(), false)
    }

    /// Like [`Substitutions::literal`], but the sentinel must be present.
    pub fn require_literal(self, sentinel: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Placeholder::Literal(sentinel.into()), value.into(), true)
    }

    /// Like [`Substitutions::line`], but the template must have a line for `key`.
    pub fn require_line(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Placeholder::LineKey(key.into()), value.into(), true)
    }

    fn push(mut self, placeholder: Placeholder, value: String, required: bool) -> Self {
        self.entries.push(Entry {
            placeholder,
            value,
            required,
        });
        self
    }

    /// One alternation with a capture group per entry, in entry order.
    fn pattern(&self) -> Result<Regex> {
        let alternatives: Vec<String> = self
            .entries
            .iter()
            .map(|e| format!("({})", placeholder_pattern(&e.placeholder)))
            .collect();
        Regex::new(&format!("(?m){}", alternatives.join("|")))
            .map_err(|e| TemplateError::Pattern(e).into())
    }
}

/// A template read from disk.
#[derive(Debug, Clone)]
pub struct Template {
    path: PathBuf,
    text: String,
}

impl Template {
    /// Read a template file.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::NotFound` if the file does not exist and
    /// `TemplateError::Read` for any other I/O failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading template");

        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                TemplateError::NotFound(path.to_path_buf())
            } else {
                TemplateError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    /// Build a template from in-memory text.
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply every substitution in a single left-to-right pass.
    ///
    /// Inserted values are never scanned again, and leftover placeholder
    /// text is only looked for in the parts of the template that were kept.
    pub fn render(&self, substitutions: &Substitutions) -> Result<Rendered> {
        let entries = &substitutions.entries;
        let mut hits = vec![0usize; entries.len()];
        let mut text = String::with_capacity(self.text.len());
        let mut leftovers = Vec::new();
        let mut last = 0;

        if !entries.is_empty() {
            let re = substitutions.pattern()?;
            for caps in re.captures_iter(&self.text) {
                let Some(whole) = caps.get(0) else { continue };
                let Some(index) = (0..entries.len()).find(|i| caps.get(i + 1).is_some()) else {
                    continue;
                };

                let kept = &self.text[last..whole.start()];
                scan_leftovers(kept, &mut leftovers)?;
                text.push_str(kept);

                let entry = &entries[index];
                if let Placeholder::LineKey(_) = entry.placeholder {
                    let matched = whole.as_str();
                    let prefix = matched.find('=').map_or(0, |i| i + 1);
                    text.push_str(&matched[..prefix]);
                }
                text.push_str(&entry.value);

                hits[index] += 1;
                last = whole.end();
            }
        }

        let kept = &self.text[last..];
        scan_leftovers(kept, &mut leftovers)?;
        text.push_str(kept);

        let mut unmatched = Vec::new();
        let mut missing = Vec::new();
        for (entry, hits) in entries.iter().zip(hits) {
            debug!(placeholder = %entry.placeholder, hits, "substituted");
            if hits == 0 {
                if entry.required {
                    missing.push(entry.placeholder.clone());
                }
                unmatched.push(entry.placeholder.clone());
            }
        }

        Ok(Rendered {
            source: self.path.clone(),
            text,
            unmatched,
            missing,
            leftovers,
        })
    }
}

/// A rendered template, not yet checked for leftovers.
#[derive(Debug, Clone)]
pub struct Rendered {
    source: PathBuf,
    text: String,
    unmatched: Vec<Placeholder>,
    missing: Vec<Placeholder>,
    leftovers: Vec<String>,
}

impl Rendered {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether `placeholder` matched at least once.
    pub fn matched(&self, placeholder: &Placeholder) -> bool {
        !self.unmatched.contains(placeholder)
    }

    /// Append template text to the end of the output.
    ///
    /// The section is checked for leftover placeholders like the rest of
    /// the template.
    pub fn append(&mut self, section: &str) -> Result<()> {
        scan_leftovers(section, &mut self.leftovers)?;
        self.text.push_str(section);
        Ok(())
    }

    /// Apply the unresolved policy and return the final text.
    ///
    /// # Errors
    ///
    /// Under `UnresolvedPolicy::Fail`, returns `TemplateError::Missing` if a
    /// required placeholder had no target, and `TemplateError::Unresolved`
    /// if any placeholder text remains.
    pub fn finish(self, policy: UnresolvedPolicy) -> Result<String> {
        for placeholder in self.unmatched.iter().filter(|p| !self.missing.contains(p)) {
            debug!(
                template = %self.source.display(),
                placeholder = %placeholder,
                "placeholder not present in template"
            );
        }

        if !self.missing.is_empty() {
            let names: Vec<String> = self.missing.iter().map(ToString::to_string).collect();
            match policy {
                UnresolvedPolicy::Fail => {
                    return Err(TemplateError::Missing {
                        path: self.source,
                        placeholders: names,
                    }
                    .into());
                }
                UnresolvedPolicy::PassThrough => {
                    warn!(
                        template = %self.source.display(),
                        placeholders = %names.join(", "),
                        "required placeholders not present in template"
                    );
                }
            }
        }

        if !self.leftovers.is_empty() {
            match policy {
                UnresolvedPolicy::Fail => {
                    return Err(TemplateError::Unresolved {
                        path: self.source,
                        placeholders: self.leftovers,
                    }
                    .into());
                }
                UnresolvedPolicy::PassThrough => {
                    warn!(
                        template = %self.source.display(),
                        placeholders = %self.leftovers.join(", "),
                        "leaving unresolved placeholders in output"
                    );
                }
            }
        }

        Ok(self.text)
    }
}

/// Read, render, and check a template in one step.
pub fn render_template(
    path: impl AsRef<Path>,
    substitutions: &Substitutions,
    policy: UnresolvedPolicy,
) -> Result<String> {
    Template::load(path)?.render(substitutions)?.finish(policy)
}

/// Record sentinel and variable text found in `text`, once each, in order.
fn scan_leftovers(text: &str, found: &mut Vec<String>) -> Result<()> {
    let mut hits: Vec<(usize, &str)> = Vec::new();
    for pattern in [SENTINEL_PATTERN, VARIABLE_PATTERN] {
        let re = Regex::new(pattern).map_err(TemplateError::Pattern)?;
        hits.extend(re.find_iter(text).map(|m| (m.start(), m.as_str())));
    }
    hits.sort_by_key(|(pos, _)| *pos);

    for (_, name) in hits {
        if !found.iter().any(|f| f == name) {
            found.push(name.to_string());
        }
    }
    Ok(())
}

/// Regex source for one placeholder. Contains no capture groups.
fn placeholder_pattern(placeholder: &Placeholder) -> String {
    match placeholder {
        // never matches
        Placeholder::Literal(s) if s.is_empty() => r"[^\s\S]".to_string(),
        Placeholder::Literal(s) => regex::escape(s),
        Placeholder::LineKey(key) => line_pattern(key),
        Placeholder::Variable(name) => regex::escape(&format!("${{{}}}", name)),
    }
}

/// Line-anchored `KEY=` matcher covering the whole line up to the line ending.
fn line_pattern(key: &str) -> String {
    format!(
        r"^[ \t]*(?:export[ \t]+)?{}[ \t]*=[^\r\n]*",
        regex::escape(key)
    )
}
