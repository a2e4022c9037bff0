use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::app::{MirrorError, Result};
use crate::archive;
use crate::domain::ResourceMetadata;

/// URL → conditional-fetch metadata, backed by a single YAML file.
///
/// Workers share the store through an `Arc` and only ever touch it through
/// [`get`](Self::get) and [`set`](Self::set). The lock is never held across
/// an await point.
pub struct MetadataStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, ResourceMetadata>>,
}

impl MetadataStore {
    /// Load the store at `path`. A missing file yields an empty store; an
    /// empty or malformed one is an error, since `persist` never writes an
    /// empty file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries: BTreeMap<String, ResourceMetadata> = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => {
                return Err(MirrorError::metadata(
                    &path,
                    MirrorError::Other("file is empty".into()),
                ));
            }
            Ok(content) => {
                serde_yaml::from_str(&content).map_err(|e| MirrorError::metadata(&path, e))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(MirrorError::metadata(&path, e)),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    #[cfg(test)]
    pub fn empty<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Metadata recorded for `url`, or an empty value if it was never fetched.
    pub fn get(&self, url: &str) -> ResourceMetadata {
        self.lock().get(url).cloned().unwrap_or_default()
    }

    pub fn set(&self, url: &str, metadata: ResourceMetadata) {
        self.lock().insert(url.to_string(), metadata);
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> BTreeMap<String, ResourceMetadata> {
        self.lock().clone()
    }

    /// Write the whole map back to disk, replacing the previous file in one
    /// rename.
    pub fn persist(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.lock())
            .map_err(|e| MirrorError::metadata(&self.path, e))?;

        archive::write_file_atomically(&self.path, yaml.as_bytes())
            .map_err(|e| MirrorError::metadata(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), "Persisted metadata");
        Ok(())
    }

    // Critical sections are single map operations, so a poisoned map is
    // still consistent.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ResourceMetadata>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
