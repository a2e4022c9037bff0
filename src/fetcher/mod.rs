pub mod http_fetcher;
pub mod pool;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::app::{MirrorError, Result};
use crate::domain::ResourceMetadata;

pub type BodyStream = BoxStream<'static, Result<Bytes>>;

pub enum FetchOutcome {
    /// Server answered 304 for the conditional request
    Unchanged,
    /// New content; `metadata` fully replaces what was stored before
    Fetched {
        body: BodyStream,
        metadata: ResourceMetadata,
    },
    /// Transport error or unexpected status
    Failed { cause: MirrorError },
}

impl std::fmt::Debug for FetchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unchanged => f.write_str("Unchanged"),
            Self::Fetched { metadata, .. } => f
                .debug_struct("Fetched")
                .field("metadata", metadata)
                .finish_non_exhaustive(),
            Self::Failed { cause } => f.debug_struct("Failed").field("cause", cause).finish(),
        }
    }
}

#[async_trait]
pub trait Fetcher {
    /// Perform exactly one conditional GET for `url`.
    async fn fetch(&self, url: &str, prior: &ResourceMetadata) -> FetchOutcome;
}
