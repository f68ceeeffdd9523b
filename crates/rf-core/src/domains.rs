//! Top-domain allowlist for scoping cosmetic rules
//!
//! Cosmetic filters are only emitted for well-known sites. The allowlist is
//! derived from a ranked popularity list (one domain per line, or Tranco-style
//! `rank,domain` CSV), skipping the highest-ranked entries.
//!
//! # Examples
//!
//! ```
//! use rf_core::domains::TopDomainAllowlist;
//!
//! let ranked = "1,google.com\n2,youtube.com\n3,example.com\n";
//! let allowlist = TopDomainAllowlist::from_ranked_text(ranked, 2);
//! assert!(allowlist.contains("example.com"));
//! assert!(!allowlist.contains("google.com"));
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Number of top-ranked domains excluded by default.
pub const DEFAULT_SKIP_TOP: usize = 100;

/// Error type for allowlist loading.
#[derive(Debug, thiserror::Error)]
pub enum AllowlistError {
    #[error("Failed to read allowlist '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read-only set of well-known domains.
///
/// Built once at startup and shared (behind an `Arc`) by every compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopDomainAllowlist {
    domains: HashSet<String>,
}

impl TopDomainAllowlist {
    /// Create an empty allowlist. Every cosmetic rule is rejected against it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit domains. No ranking is applied.
    pub fn from_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .filter_map(|d| normalize_domain(d.as_ref()))
                .collect(),
        }
    }

    /// Build from ranked list text, skipping the first `skip_top` entries.
    ///
    /// Blank lines and `#` comments do not count towards the ranking.
    pub fn from_ranked_text(text: &str, skip_top: usize) -> Self {
        let domains = text
            .lines()
            .filter_map(ranked_entry)
            .skip(skip_top)
            .filter_map(normalize_domain)
            .collect();
        Self { domains }
    }

    /// Load a ranked list from disk.
    pub fn load(path: &Path, skip_top: usize) -> Result<Self, AllowlistError> {
        let text = fs::read_to_string(path).map_err(|source| AllowlistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let allowlist = Self::from_ranked_text(&text, skip_top);
        log::debug!(
            "Loaded {} allowlisted domains from '{}' (skipped top {})",
            allowlist.len(),
            path.display(),
            skip_top
        );
        Ok(allowlist)
    }

    /// Case-insensitive; surrounding dots are ignored.
    pub fn contains(&self, domain: &str) -> bool {
        if self.domains.contains(domain) {
            return true;
        }
        match normalize_domain(domain) {
            Some(normalized) => self.domains.contains(&normalized),
            None => false,
        }
    }

    /// True if any of `domains` is allowlisted.
    pub fn intersects<S: AsRef<str>>(&self, domains: &[S]) -> bool {
        domains.iter().any(|d| self.contains(d.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Extract the domain column from one ranked-list line.
fn ranked_entry(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    match line.split_once(',') {
        Some((_rank, domain)) => Some(domain.trim()),
        None => Some(line),
    }
}

fn normalize_domain(domain: &str) -> Option<String> {
    let trimmed = domain.trim().trim_matches('.');
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let allowlist = TopDomainAllowlist::from_domains(["example.com"]);
        assert!(allowlist.contains("Example.COM"));
        assert!(allowlist.contains("example.com."));
        assert!(allowlist.intersects(&["unknown.net", "EXAMPLE.com"][..]));
        assert!(!allowlist.contains(""));
    }

    #[test]
    fn test_skips_top_ranked_entries() {
        let text = "a.com\nb.com\nc.com\nd.com\n";
        let allowlist = TopDomainAllowlist::from_ranked_text(text, 2);
        assert_eq!(allowlist.len(), 2);
        assert!(!allowlist.contains("a.com"));
        assert!(!allowlist.contains("b.com"));
        assert!(allowlist.contains("c.com"));
        assert!(allowlist.contains("d.com"));
    }

    #[test]
    fn test_reads_csv_rank_column() {
        let text = "1,Google.com\n2,example.org\r\n\n# comment\n3,news.example.net\n";
        let allowlist = TopDomainAllowlist::from_ranked_text(text, 1);
        assert!(!allowlist.contains("google.com"));
        assert!(allowlist.contains("example.org"));
        assert!(allowlist.contains("news.example.net"));
        assert_eq!(allowlist.len(), 2);
    }

    #[test]
    fn test_skip_larger_than_list() {
        let allowlist = TopDomainAllowlist::from_ranked_text("a.com\nb.com", DEFAULT_SKIP_TOP);
        assert!(allowlist.is_empty());
    }

    #[test]
    fn test_intersects() {
        let allowlist = TopDomainAllowlist::from_domains(["example.com", "news.org"]);
        assert!(allowlist.intersects(&["other.com", "news.org"]));
        assert!(!allowlist.intersects(&["other.com"]));
        assert!(!allowlist.intersects::<&str>(&[]));
    }

    #[test]
    fn test_load_missing_file() {
        let err = TopDomainAllowlist::load(Path::new("/nonexistent/top-1m.csv"), 100)
            .expect_err("missing file should fail");
        assert!(err.to_string().contains("top-1m.csv"));
    }
}
