use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rf_compiler::{SupportedSyntax, DEFAULT_MAX_RULES};
use rf_core::domains::{AllowlistError, TopDomainAllowlist, DEFAULT_SKIP_TOP};
use serde::Deserialize;

use crate::error::ListError;
use crate::source::RemoteListDescriptor;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Allowlist(#[from] AllowlistError),

    #[error(transparent)]
    Fetcher(#[from] ListError),
}

/// Top-level configuration, built once at startup and handed to the scheduler.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BlocklistConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    #[serde(default = "default_ttl_days")]
    pub ttl_days: u64,

    #[serde(default = "default_max_rules")]
    pub max_rules: usize,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub allowlist: AllowlistConfig,

    #[serde(default = "default_lists")]
    pub lists: Vec<ListConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AllowlistConfig {
    /// Ranked domain list; without one every cosmetic rule is dropped
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_skip_top")]
    pub skip_top: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ListConfig {
    pub name: String,
    pub url: String,
}

impl Default for BlocklistConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            ttl_days: default_ttl_days(),
            max_rules: default_max_rules(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
            allowlist: AllowlistConfig::default(),
            lists: default_lists(),
        }
    }
}

impl Default for AllowlistConfig {
    fn default() -> Self {
        Self {
            path: None,
            skip_top: default_skip_top(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_ttl_days() -> u64 {
    4
}

fn default_max_rules() -> usize {
    DEFAULT_MAX_RULES
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("ruleforge/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_skip_top() -> usize {
    DEFAULT_SKIP_TOP
}

fn default_lists() -> Vec<ListConfig> {
    [
        ("easylist", "https://easylist.to/easylist/easylist.txt"),
        ("easyprivacy", "https://easylist.to/easylist/easyprivacy.txt"),
        ("fanboy-annoyance", "https://secure.fanboy.co.nz/fanboy-annoyance.txt"),
        ("fanboy-cookiemonster", "https://secure.fanboy.co.nz/fanboy-cookiemonster.txt"),
    ]
    .into_iter()
    .map(|(name, url)| ListConfig {
        name: name.to_string(),
        url: url.to_string(),
    })
    .collect()
}

impl BlocklistConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rules == 0 {
            return Err(ConfigError::Invalid("max_rules must be positive".to_string()));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch_timeout_secs must be positive".to_string()));
        }

        let mut names = HashSet::new();
        for list in &self.lists {
            let name = list.name.as_str();
            if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
                return Err(ConfigError::Invalid(format!("list name '{}' is not a valid file name", name)));
            }
            if !names.insert(name) {
                return Err(ConfigError::Invalid(format!("duplicate list name '{}'", name)));
            }
            if !(list.url.starts_with("http://") || list.url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "list '{}' has a non-HTTP url '{}'",
                    name, list.url
                )));
            }
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_days.saturating_mul(SECS_PER_DAY))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    pub fn descriptors(&self) -> Vec<RemoteListDescriptor> {
        self.lists
            .iter()
            .map(|list| RemoteListDescriptor::new(&list.name, &list.url, self.cache_path(&list.name)))
            .collect()
    }

    pub fn syntax(&self) -> SupportedSyntax {
        SupportedSyntax::default().with_max_rules(self.max_rules)
    }

    pub fn load_allowlist(&self) -> Result<TopDomainAllowlist, AllowlistError> {
        match &self.allowlist.path {
            Some(path) => TopDomainAllowlist::load(path, self.allowlist.skip_top),
            None => {
                log::warn!("No allowlist configured, cosmetic rules will be dropped");
                Ok(TopDomainAllowlist::new())
            }
        }
    }
}
