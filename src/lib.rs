//! Aggregates third-party plugin repositories from remote master lists into
//! one catalog that survives overlapping refreshes.

pub mod browser;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod debounce;
pub mod dedup;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod registry;
pub mod sort;
pub mod types;

pub use browser::{spawn_sort_timer, RefreshCycle, RepoBrowser};
pub use catalog::{Catalog, Generation};
pub use config::BrowserConfig;
pub use error::{BrowserError, Result};
pub use registry::{JsonRegistry, RepoRegistry};
pub use types::{PluginEntry, RepoDescriptor, RepositoryEntry};
