pub mod catalog;
pub mod metadata;
pub mod task;

pub use catalog::Catalog;
pub use metadata::ResourceMetadata;
pub use task::FetchTask;
