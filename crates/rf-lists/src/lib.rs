//! RuleForge Remote Lists
//!
//! Keeps a fixed set of remote filter lists compiled and cached on disk.
//! Each list is fetched, compiled and persisted independently; a failed
//! refresh leaves the previous cache in place.

pub mod config;
pub mod error;
pub mod fetch;
pub mod scheduler;
pub mod source;

pub use config::{AllowlistConfig, BlocklistConfig, ConfigError, ListConfig};
pub use error::{ListError, Result};
pub use fetch::{HttpFetcher, ListFetcher};
pub use scheduler::{ListEvent, ListRefreshScheduler, RefreshReport};
pub use source::{is_stale, ListState, RemoteListDescriptor, RemoteListSource, DEFAULT_TTL};
