use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::Result;
use crate::config::Config;
use crate::domain::Catalog;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::pool::WorkerPool;
use crate::fetcher::Fetcher;
use crate::store::MetadataStore;

/// Everything one invocation needs, loaded before any concurrent work starts.
pub struct AppContext {
    pub root: PathBuf,
    pub config: Config,
    pub catalog: Catalog,
    pub store: Arc<MetadataStore>,
    pub pool: WorkerPool,
}

impl AppContext {
    pub fn new(root: PathBuf, config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(&config.client_options())?);
        Self::with_fetcher(root, config, fetcher)
    }

    pub fn with_fetcher(
        root: PathBuf,
        config: Config,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Result<Self> {
        config.validate()?;

        let catalog = Catalog::load(config.catalog_path(&root))?;
        let store = Arc::new(MetadataStore::load(config.metadata_path(&root))?);
        let pool = WorkerPool::with_workers(fetcher, config.workers);

        Ok(Self {
            root,
            config,
            catalog,
            store,
            pool,
        })
    }
}
