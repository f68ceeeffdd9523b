//! RuleForge Core Library
//!
//! This crate holds the data model shared by the filter-list compiler and the
//! remote list refresher.
//!
//! # Architecture
//!
//! Compiled rules are plain values shaped after the JSON schema consumed by
//! native content-blocking engines. A rule set is built once per refresh,
//! serialized, and handed off to storage; nothing keeps references into it.
//!
//! # Modules
//!
//! - `types`: `BlockRule`, its action and trigger, and the JSON encoding
//! - `domains`: Ranked top-domain allowlist used to scope cosmetic rules

pub mod domains;
pub mod types;

// Re-export commonly used types
pub use domains::{AllowlistError, TopDomainAllowlist, DEFAULT_SKIP_TOP};
pub use types::{Action, ActionType, BlockRule, LoadType, NamedMask, ResourceType, RuleSet, Trigger};
