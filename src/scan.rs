use crate::error::ExtractError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Image files directly inside a directory, matched by extension without
/// regard to case.
#[derive(Debug, Clone)]
pub struct ImageScan {
    dir: PathBuf,
    extensions: BTreeSet<String>,
}

impl ImageScan {
    pub fn new<I, S>(dir: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            dir: dir.into(),
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.contains(&e.to_ascii_lowercase()))
    }

    /// Reads the directory afresh on every call; entries that cannot be
    /// stat'ed are skipped. A directory that does not exist yields nothing.
    pub fn iter(&self) -> Result<impl Iterator<Item = PathBuf> + '_, ExtractError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => Some(entries),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(ExtractError::io(&self.dir, e)),
        };
        Ok(entries
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| self.matches(path)))
    }

    /// All matches sorted by file name.
    pub fn collect_sorted(&self) -> Result<Vec<PathBuf>, ExtractError> {
        let mut paths: Vec<PathBuf> = self.iter()?.collect();
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }
}
