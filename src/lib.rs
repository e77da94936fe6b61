//! Nagger - milestone nagging and release aggregation for a GitLab group.
//!
//! This library provides the core functionality for the `nagger` CLI tool:
//! reconciling milestone-less merge requests into a flagged state, and
//! aggregating merged work per milestone into rendered changelogs pushed
//! to wiki pages, a homepage article MR, and per-project tags/releases.
//!
//! Everything runs single-threaded and synchronous: each forge operation
//! is one blocking REST round-trip, and re-running any command converges
//! to the same remote state (mutations are individually idempotent).

pub mod aggregate;
pub mod ci;
pub mod cli;
pub mod commands;
pub mod config;
pub mod ensure;
pub mod forge;
pub mod models;
pub mod render;

/// Library-level error type for nagger operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level failure (DNS, TLS, connection reset)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The forge rejected the request
    #[error("forge returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("not found: {0}")]
    NotFound(String),

    /// Fatal configuration error; never retried
    #[error("environment variable missing: {0}")]
    MissingEnv(&'static str),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for nagger operations.
pub type Result<T> = std::result::Result<T, Error>;
