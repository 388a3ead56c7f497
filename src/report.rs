use crate::error::{ErrorKind, ExtractError};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub directory: String,
    pub started: String,
    pub finished: String,
    pub outcomes: Vec<FileOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub input: String,
    pub input_sha256: Option<String>,
    pub output: Option<String>,
    pub ok: bool,
    pub kind: Option<ErrorKind>,
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn success(input: &Path, sha256: String, output: &Path) -> Self {
        Self {
            input: input.display().to_string(),
            input_sha256: Some(sha256),
            output: Some(output.display().to_string()),
            ok: true,
            kind: None,
            error: None,
        }
    }

    pub fn failure(input: &Path, sha256: Option<String>, err: &ExtractError) -> Self {
        Self {
            input: input.display().to_string(),
            input_sha256: sha256,
            output: None,
            ok: false,
            kind: Some(err.kind()),
            error: Some(err.to_string()),
        }
    }
}

impl BatchReport {
    pub fn new(directory: &Path, started: String) -> Self {
        Self {
            directory: directory.display().to_string(),
            started,
            finished: String::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.ok).count()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{}/{} files processed successfully",
            self.succeeded(),
            self.total()
        )
    }
}
