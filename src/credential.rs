use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Secret authorizing calls to the inference service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&mask(&self.0)).finish()
    }
}

/// One place a credential may come from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Explicit(String),
    File { path: PathBuf, key: String },
    Env(String),
}

impl CredentialSource {
    pub fn lookup(&self) -> Option<Credential> {
        let value = match self {
            Self::Explicit(v) => Some(v.clone()),
            Self::File { path, key } => read_key(path, key),
            Self::Env(var) => std::env::var(var).ok(),
        }?;
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(Credential::new(value))
        }
    }
}

/// First source that yields a non-empty value wins.
pub fn resolve_credential(sources: &[CredentialSource]) -> Option<Credential> {
    sources.iter().find_map(CredentialSource::lookup)
}

/// Standard priority: explicit override, then the key file, then the environment.
pub fn default_sources(explicit: Option<&str>, file: &Path, var: &str) -> Vec<CredentialSource> {
    let mut sources = Vec::with_capacity(3);
    if let Some(v) = explicit {
        sources.push(CredentialSource::Explicit(v.to_string()));
    }
    sources.push(CredentialSource::File {
        path: file.to_path_buf(),
        key: var.to_string(),
    });
    sources.push(CredentialSource::Env(var.to_string()));
    sources
}

/// First 4 and last 4 characters visible; anything of 8 or fewer is fully masked.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let n = chars.len();
    if n <= 8 {
        return "*".repeat(n);
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[n - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(n - 8))
}

fn entry_prefix(key: &str) -> String {
    format!("{key}=")
}

fn read_key(path: &Path, key: &str) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let prefix = entry_prefix(key);
    raw.lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(|v| v.trim().to_string())
}

/// View/set/remove over the `KEY=value` entry of a dotenv-style file.
pub struct KeyFile {
    path: PathBuf,
    key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyView {
    File(String),
    Env(String),
    Missing,
}

impl KeyFile {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Masked current value; the file entry takes precedence over the environment.
    pub fn view(&self) -> KeyView {
        if let Some(v) = read_key(&self.path, &self.key) {
            return KeyView::File(mask(&v));
        }
        match std::env::var(&self.key) {
            Ok(v) if !v.is_empty() => KeyView::Env(mask(&v)),
            _ => KeyView::Missing,
        }
    }

    /// Writes the entry as the first line, keeping other non-empty lines.
    pub fn set(&self, value: &str) -> Result<()> {
        let (others, _) = self.other_lines()?;
        let mut out = format!("{}{}\n", entry_prefix(&self.key), value);
        for line in others {
            out.push_str(&line);
            out.push('\n');
        }
        std::fs::write(&self.path, out)
            .with_context(|| format!("writing {}", self.path.display()))
    }

    /// Returns whether an entry was present. A missing file is not an error.
    pub fn remove(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        let (others, found) = self.other_lines()?;
        if !found {
            return Ok(false);
        }
        let mut out = String::new();
        for line in others {
            out.push_str(&line);
            out.push('\n');
        }
        std::fs::write(&self.path, out)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(true)
    }

    fn other_lines(&self) -> Result<(Vec<String>, bool)> {
        if !self.path.exists() {
            return Ok((Vec::new(), false));
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let prefix = entry_prefix(&self.key);
        let mut found = false;
        let mut others = Vec::new();
        for line in raw.lines() {
            if line.starts_with(&prefix) {
                found = true;
            } else if !line.trim().is_empty() {
                others.push(line.trim_end().to_string());
            }
        }
        Ok((others, found))
    }
}

