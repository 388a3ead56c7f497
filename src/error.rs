use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("API key missing or rejected")]
    Auth,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("inference service error: {0}")]
    Service(String),

    #[error("could not find valid JSON in the response")]
    Format { raw: String },

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
}

impl ExtractError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth => ErrorKind::Auth,
            Self::Io { .. } => ErrorKind::Io,
            Self::Service(_) => ErrorKind::Service,
            Self::Format { .. } => ErrorKind::Format,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    Io,
    Service,
    Format,
    NotFound,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Auth => "auth",
            Self::Io => "io",
            Self::Service => "service",
            Self::Format => "format",
            Self::NotFound => "not_found",
        };
        f.write_str(s)
    }
}
