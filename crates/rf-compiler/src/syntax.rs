//! Supported filter syntax
//!
//! Everything the compiler is willing to emit is enumerated here so that
//! coverage can be audited and tested without reading the builders. Lines
//! outside this set are dropped, never reported.

use rf_core::types::{LoadType, NamedMask, ResourceType};

/// Rule-count ceiling enforced by the content-blocking engine.
pub const DEFAULT_MAX_RULES: usize = 50_000;

/// Url-filter matching every http(s) URL.
pub const ANY_HTTP_URL: &str = "^https?://";

/// Allow-list of supported filter syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedSyntax {
    /// Load types recognised in a rule's options
    pub load_types: LoadType,
    /// Resource types recognised in a rule's options
    pub resource_types: ResourceType,
    /// A `||host^` rule containing any of these is dropped
    pub rejected_domain_rule_markers: Vec<String>,
    /// Plain patterns must be strictly longer than this
    pub min_verbatim_len: usize,
    /// Characters a url-filter may never contain
    pub forbidden_chars: Vec<char>,
    /// Honour the `match-case` option
    pub match_case: bool,
    /// Emit `ignore-previous-rules` for `@@||` rules instead of `block`
    pub exceptions_as_ignore_previous: bool,
    /// Output cap, oldest rules dropped first
    pub max_rules: usize,
}

impl Default for SupportedSyntax {
    fn default() -> Self {
        Self {
            load_types: LoadType::THIRD_PARTY,
            resource_types: ResourceType::all(),
            rejected_domain_rule_markers: vec!["domain=".to_string()],
            min_verbatim_len: 5,
            forbidden_chars: vec!['*', '|'],
            match_case: true,
            exceptions_as_ignore_previous: false,
            max_rules: DEFAULT_MAX_RULES,
        }
    }
}

impl SupportedSyntax {
    pub fn with_max_rules(mut self, max_rules: usize) -> Self {
        self.max_rules = max_rules;
        self
    }

    /// Supported load types named anywhere in `options`.
    pub fn load_types_in(&self, options: &str) -> LoadType {
        matching_flags(self.load_types, options)
    }

    /// Supported resource types named anywhere in `options`.
    pub fn resource_types_in(&self, options: &str) -> ResourceType {
        matching_flags(self.resource_types, options)
    }

    pub fn wants_case_sensitive(&self, options: &str) -> bool {
        self.match_case && options.contains("match-case")
    }

    pub fn is_rejected_domain_rule(&self, rule: &str) -> bool {
        self.rejected_domain_rule_markers
            .iter()
            .any(|marker| rule.contains(marker.as_str()))
    }

    pub fn has_forbidden_char(&self, pattern: &str) -> bool {
        pattern.contains(self.forbidden_chars.as_slice())
    }
}

/// Options are matched by substring containment, not tokenized.
fn matching_flags<M: NamedMask>(supported: M, options: &str) -> M {
    M::NAMES
        .iter()
        .filter(|(flag, name)| supported.has(*flag) && options.contains(name))
        .fold(M::empty_mask(), |acc, (flag, _)| acc.union(*flag))
}
