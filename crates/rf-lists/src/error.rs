use std::path::PathBuf;

use thiserror::Error;

/// Errors from fetching, compiling or persisting one remote list.
///
/// All of them are recoverable: the cached artifact stays authoritative and
/// the list is retried on the next scheduled refresh.
#[derive(Error, Debug)]
pub enum ListError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to fetch '{url}': {message}")]
    Fetch { url: String, message: String },

    #[error("Unexpected HTTP status {status} from '{url}'")]
    Status { url: String, status: u16 },

    #[error("List '{name}' is not valid UTF-8: {source}")]
    Decode {
        name: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Failed to encode list '{name}': {source}")]
    Encode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cached rules for '{name}' are unreadable: {source}")]
    Cache {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compile task for '{name}' failed: {message}")]
    Task { name: String, message: String },

    #[error("Unknown list '{0}'")]
    UnknownList(String),
}

pub type Result<T> = std::result::Result<T, ListError>;
