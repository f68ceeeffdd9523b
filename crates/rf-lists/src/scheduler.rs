use std::sync::Arc;
use std::time::SystemTime;

use futures::future::join_all;
use rf_compiler::FilterListCompiler;
use rf_core::types::RuleSet;
use tokio::sync::broadcast;

use crate::config::{BlocklistConfig, ConfigError};
use crate::error::{ListError, Result};
use crate::fetch::{HttpFetcher, ListFetcher};
use crate::source::{ListState, RemoteListSource};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Emitted after each refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    /// The cached rule set was replaced
    Updated { name: String, rules: usize },
    /// The refresh failed; the previous cache is still in use
    Failed { name: String, error: String },
}

/// Outcome of one scheduler pass, by list name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl RefreshReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Refreshes a fixed, ordered set of remote lists.
pub struct ListRefreshScheduler {
    sources: Vec<RemoteListSource>,
    events: broadcast::Sender<ListEvent>,
}

impl ListRefreshScheduler {
    pub fn new(sources: Vec<RemoteListSource>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sources, events }
    }

    /// Build every source from `config`, sharing one compiler and HTTP client.
    pub fn from_config(config: &BlocklistConfig) -> std::result::Result<Self, ConfigError> {
        let fetcher: Arc<dyn ListFetcher> =
            Arc::new(HttpFetcher::new(config.fetch_timeout(), &config.user_agent)?);
        Self::from_config_with_fetcher(config, fetcher)
    }

    pub fn from_config_with_fetcher(
        config: &BlocklistConfig,
        fetcher: Arc<dyn ListFetcher>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let allowlist = Arc::new(config.load_allowlist()?);
        let compiler = Arc::new(FilterListCompiler::new(allowlist).with_syntax(config.syntax()));

        let sources = config
            .descriptors()
            .into_iter()
            .map(|descriptor| {
                RemoteListSource::new(descriptor, Arc::clone(&fetcher), Arc::clone(&compiler))
                    .with_ttl(config.ttl())
            })
            .collect();
        Ok(Self::new(sources))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListEvent> {
        self.events.subscribe()
    }

    pub fn sources(&self) -> &[RemoteListSource] {
        &self.sources
    }

    pub fn source(&self, name: &str) -> Option<&RemoteListSource> {
        self.sources.iter().find(|s| s.name() == name)
    }

    pub fn states(&self, now: SystemTime) -> Vec<(&str, ListState)> {
        self.sources.iter().map(|s| (s.name(), s.state(now))).collect()
    }

    /// Cached JSON for `name`, if that list was ever refreshed.
    pub fn contents(&self, name: &str) -> Option<String> {
        self.source(name)?.contents()
    }

    /// Every cached list merged into one rule set, in source order.
    ///
    /// Lists that were never fetched contribute nothing.
    pub fn combined_rules(&self) -> Result<RuleSet> {
        let mut combined = Vec::new();
        for source in &self.sources {
            let Some(json) = source.contents() else {
                continue;
            };
            let rules = RuleSet::from_json(&json).map_err(|e| ListError::Cache {
                name: source.name().to_string(),
                source: e,
            })?;
            combined.extend(rules.into_vec());
        }
        Ok(RuleSet::from(combined))
    }

    /// `combined_rules` as the JSON handed to the content-blocking engine.
    pub fn combined_contents(&self) -> Result<String> {
        self.combined_rules()?
            .to_json()
            .map_err(|source| ListError::Encode {
                name: "combined".to_string(),
                source,
            })
    }

    /// Refresh every list that is stale at `now`.
    pub async fn refresh_all(&self, now: SystemTime) -> RefreshReport {
        self.refresh_where(|source| source.is_stale(now)).await
    }

    /// Refresh every list regardless of cache age.
    pub async fn force_refresh_all(&self) -> RefreshReport {
        self.refresh_where(|_| true).await
    }

    pub async fn refresh_list(&self, name: &str) -> Result<usize> {
        let source = self
            .source(name)
            .ok_or_else(|| ListError::UnknownList(name.to_string()))?;
        self.refresh_source(source).await
    }

    async fn refresh_where<F>(&self, due: F) -> RefreshReport
    where
        F: Fn(&RemoteListSource) -> bool,
    {
        let mut report = RefreshReport::default();
        let mut pending = Vec::new();
        for source in &self.sources {
            if due(source) {
                pending.push(source);
            } else {
                log::debug!("List '{}' is fresh, skipping", source.name());
                report.skipped.push(source.name().to_string());
            }
        }

        let results = join_all(
            pending
                .into_iter()
                .map(|source| async move { (source.name(), self.refresh_source(source).await) }),
        )
        .await;

        for (name, result) in results {
            match result {
                Ok(_) => report.refreshed.push(name.to_string()),
                Err(e) => report.failed.push((name.to_string(), e.to_string())),
            }
        }
        report
    }

    async fn refresh_source(&self, source: &RemoteListSource) -> Result<usize> {
        let result = source.refresh().await;
        let event = match &result {
            Ok(rules) => ListEvent::Updated {
                name: source.name().to_string(),
                rules: *rules,
            },
            Err(e) => {
                log::warn!("Refresh of '{}' failed, keeping cached rules: {}", source.name(), e);
                ListEvent::Failed {
                    name: source.name().to_string(),
                    error: e.to_string(),
                }
            }
        };
        // no subscribers is fine
        let _ = self.events.send(event);
        result
    }
}
