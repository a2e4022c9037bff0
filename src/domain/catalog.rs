use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::app::{MirrorError, Result};
use crate::domain::FetchTask;

/// Archive directory name → URLs mirrored into it.
///
/// Read once per run from a YAML mapping such as:
///
/// ```yaml
/// stationA:
///   - https://example.org/stationA/data.csv
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| MirrorError::catalog(path, e))?;
        Self::from_yaml(&content).map_err(|e| MirrorError::catalog(path, e))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn directories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(dir, urls)| (dir.as_str(), urls.as_slice()))
    }

    pub fn url_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.url_count() == 0
    }

    /// Create every archive directory under `root` and expand the catalog into
    /// one task per (directory, URL) pair.
    pub fn prepare_tasks(&self, root: &Path) -> Result<Vec<FetchTask>> {
        let mut tasks = Vec::with_capacity(self.url_count());

        for (dir, urls) in self.directories() {
            let directory = root.join(dir);
            fs::create_dir_all(&directory).map_err(|e| MirrorError::CreateDir {
                path: directory.clone(),
                source: e,
            })?;

            tasks.extend(urls.iter().map(|url| FetchTask::new(&directory, url)));
        }

        Ok(tasks)
    }
}

#[cfg(test)]
impl FromIterator<(String, Vec<String>)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let catalog = Catalog::from_yaml(
            r#"
stationB:
  - http://x/b1.csv
  - http://x/b2.csv
stationA:
  - http://x/a.csv
"#,
        )
        .unwrap();

        assert_eq!(catalog.url_count(), 3);
        let dirs: Vec<_> = catalog.directories().map(|(d, _)| d).collect();
        assert_eq!(dirs, vec!["stationA", "stationB"]);
    }

    #[test]
    fn test_malformed_catalog_is_error() {
        assert!(Catalog::from_yaml("stationA: [unterminated").is_err());
        assert!(Catalog::from_yaml("- just\n- a list\n").is_err());
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data-sources.yaml");

        let err = Catalog::load(&path).unwrap_err();
        assert!(matches!(err, MirrorError::Catalog { .. }));
        assert!(err.to_string().contains("data-sources.yaml"));
    }

    #[test]
    fn test_prepare_tasks_creates_directories() {
        let root = tempfile::tempdir().unwrap();
        let catalog: Catalog = [
            ("stationA".to_string(), vec!["http://x/a.csv".to_string()]),
            (
                "stationB".to_string(),
                vec!["http://x/b1.csv".to_string(), "http://x/b2.csv".to_string()],
            ),
        ]
        .into_iter()
        .collect();

        let tasks = catalog.prepare_tasks(root.path()).unwrap();

        assert_eq!(tasks.len(), 3);
        assert!(root.path().join("stationA").is_dir());
        assert!(root.path().join("stationB").is_dir());
        assert_eq!(
            tasks[0],
            FetchTask::new(root.path().join("stationA"), "http://x/a.csv")
        );
    }

    #[test]
    fn test_prepare_tasks_fails_when_directory_cannot_be_created() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("stationA"), b"not a directory").unwrap();
        let catalog: Catalog = [("stationA".to_string(), vec!["http://x/a.csv".to_string()])]
            .into_iter()
            .collect();

        let err = catalog.prepare_tasks(root.path()).unwrap_err();
        assert!(matches!(err, MirrorError::CreateDir { .. }));
    }
}
