use thiserror::Error;

/// Failure of a single feed request. Never escapes a polling cycle: the
/// affected stream is treated as empty.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
    },
    #[error("could not decode {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Session discovery failure at startup. Fatal: no polling begins.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no session found for key {0:?}")]
    NoSession(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
