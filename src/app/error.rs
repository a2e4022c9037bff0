use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response from {url}: {status}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("URL has no file name to archive under: {0}")]
    MissingFileName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to load catalog {path}: {source}")]
    Catalog {
        path: PathBuf,
        source: Box<MirrorError>,
    },

    #[error("Failed to load or save metadata {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: Box<MirrorError>,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Other(String),
}

impl MirrorError {
    pub(crate) fn catalog(path: impl Into<PathBuf>, source: impl Into<MirrorError>) -> Self {
        Self::Catalog {
            path: path.into(),
            source: Box::new(source.into()),
        }
    }

    pub(crate) fn metadata(path: impl Into<PathBuf>, source: impl Into<MirrorError>) -> Self {
        Self::Metadata {
            path: path.into(),
            source: Box::new(source.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;
