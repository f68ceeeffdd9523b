use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use rf_compiler::FilterListCompiler;
use tempfile::NamedTempFile;

use crate::error::{ListError, Result};
use crate::fetch::ListFetcher;

/// Maximum age of a cached list before it is fetched again.
pub const DEFAULT_TTL: Duration = Duration::from_secs(4 * 24 * 60 * 60);

/// Identity of one remote list. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteListDescriptor {
    name: String,
    source_url: String,
    cache_path: PathBuf,
}

impl RemoteListDescriptor {
    pub fn new(name: impl Into<String>, source_url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
            cache_path: cache_path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }
}

/// Lifecycle of a cached list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    Fresh,
    Stale,
    Refreshing,
}

impl ListState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Refreshing => "refreshing",
        }
    }
}

/// True if `path` is missing, empty, or last modified more than `ttl` before `now`.
pub fn is_stale(path: &Path, now: SystemTime, ttl: Duration) -> bool {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(_) => return true,
    };
    if meta.len() == 0 {
        return true;
    }
    match meta.modified() {
        // a modification time after `now` is not older than the cutoff
        Ok(mtime) => now.duration_since(mtime).map(|age| age > ttl).unwrap_or(false),
        Err(_) => true,
    }
}

/// Fetch/compile/cache lifecycle for one named remote list.
pub struct RemoteListSource {
    descriptor: RemoteListDescriptor,
    fetcher: Arc<dyn ListFetcher>,
    compiler: Arc<FilterListCompiler>,
    ttl: Duration,
    in_flight: AtomicUsize,
}

impl RemoteListSource {
    pub fn new(
        descriptor: RemoteListDescriptor,
        fetcher: Arc<dyn ListFetcher>,
        compiler: Arc<FilterListCompiler>,
    ) -> Self {
        Self {
            descriptor,
            fetcher,
            compiler,
            ttl: DEFAULT_TTL,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn descriptor(&self) -> &RemoteListDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_stale(&self, now: SystemTime) -> bool {
        is_stale(self.descriptor.cache_path(), now, self.ttl)
    }

    pub fn state(&self, now: SystemTime) -> ListState {
        if self.in_flight.load(Ordering::Acquire) > 0 {
            ListState::Refreshing
        } else if self.is_stale(now) {
            ListState::Stale
        } else {
            ListState::Fresh
        }
    }

    /// Cached rule-set JSON, if a refresh has ever succeeded.
    pub fn contents(&self) -> Option<String> {
        fs::read_to_string(self.descriptor.cache_path()).ok()
    }

    /// Fetch, compile and atomically replace the cached rule set.
    ///
    /// Returns the number of rules written. On error the existing cache is
    /// left untouched.
    pub async fn refresh(&self) -> Result<usize> {
        let _in_flight = InFlight::enter(&self.in_flight);
        let name = self.name().to_string();
        let url = self.descriptor.source_url();

        log::info!("Refreshing list '{}' from {}", name, url);
        let bytes = self.fetcher.fetch(url).await?;
        let text = String::from_utf8(bytes).map_err(|source| ListError::Decode {
            name: name.clone(),
            source,
        })?;

        let compiler = Arc::clone(&self.compiler);
        let path = self.descriptor.cache_path().to_path_buf();
        let task_name = name.clone();
        let rules = tokio::task::spawn_blocking(move || compile_and_persist(&task_name, &text, &compiler, &path))
            .await
            .map_err(|e| ListError::Task {
                name: name.clone(),
                message: e.to_string(),
            })??;

        log::info!("List '{}' refreshed with {} rules", name, rules);
        Ok(rules)
    }
}

impl std::fmt::Debug for RemoteListSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteListSource")
            .field("descriptor", &self.descriptor)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

fn compile_and_persist(name: &str, text: &str, compiler: &FilterListCompiler, path: &Path) -> Result<usize> {
    let (rules, stats) = compiler.compile_with_stats(text);
    if stats.truncated > 0 {
        log::warn!(
            "List '{}' exceeded the rule cap, {} earliest rules dropped",
            name,
            stats.truncated
        );
    }
    log::debug!(
        "List '{}': {} lines, {} rules built, {} duplicates",
        name,
        stats.lines,
        stats.rules_built,
        stats.deduped
    );

    let json = rules.to_json().map_err(|source| ListError::Encode {
        name: name.to_string(),
        source,
    })?;
    write_atomically(path, json.as_bytes())?;
    Ok(rules.len())
}

/// Write through a sibling temp file and rename over `path`, so readers see
/// either the old or the new file, never a partial one.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_error = |source: std::io::Error| ListError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_error)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_error)?;
    tmp.write_all(bytes).map_err(io_error)?;
    tmp.as_file().sync_all().map_err(io_error)?;
    tmp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}
