use std::path::PathBuf;

/// One URL to mirror into one archive directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub directory: PathBuf,
    pub url: String,
}

impl FetchTask {
    pub fn new(directory: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            url: url.into(),
        }
    }
}
