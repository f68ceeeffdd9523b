//! RuleForge Filter List Compiler
//!
//! This crate compiles EasyList-syntax filter lists into content-blocker
//! rule sets. Lines the target engine cannot represent are dropped.

pub mod builder;
pub mod classifier;
pub mod compiler;
pub mod optimizer;
pub mod syntax;
pub mod url_filter;

pub use builder::RuleBuilder;
pub use classifier::{classify, LineCategory};
pub use compiler::{compile_filter_list, compile_filter_list_with_stats, CompileStats, FilterListCompiler};
pub use optimizer::{optimize_rules, OptimizeStats};
pub use syntax::{SupportedSyntax, ANY_HTTP_URL, DEFAULT_MAX_RULES};
pub use url_filter::is_valid_url_filter;
