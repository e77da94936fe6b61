//! CI job identity.
//!
//! A CI job identifies its own project, merge request, commit and tag via
//! predefined environment variables. A missing required variable is a
//! fatal configuration error, never retried.

use std::env;

use crate::{Error, Result};

const DEFAULT_API_URL: &str = "https://gitlab.com/";

fn required(name: &'static str) -> Result<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(Error::MissingEnv(name))
}

/// API token for the bot account.
pub fn api_token() -> Result<String> {
    required("NAGGUS_KEY")
}

/// Base URL of the forge, scheme + authority only.
///
/// `CI_API_V4_URL` carries a full path; only the origin is kept and the
/// API prefix is re-appended by the client.
pub fn api_url() -> String {
    let raw = env::var("CI_API_V4_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    origin_of(&raw)
}

fn origin_of(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some(parts) => parts,
        None => return url.trim_end_matches('/').to_string(),
    };
    let authority = rest.split('/').next().unwrap_or(rest);
    format!("{scheme}://{authority}")
}

/// Merge request iid of the running pipeline.
pub fn merge_request_iid() -> Result<u64> {
    let val = required("CI_MERGE_REQUEST_IID")?;
    val.parse()
        .map_err(|_| Error::InvalidInput(format!("CI_MERGE_REQUEST_IID: {val}")))
}

/// Project id of the running pipeline.
pub fn project_id() -> Result<u64> {
    let val = required("CI_PROJECT_ID")?;
    val.parse()
        .map_err(|_| Error::InvalidInput(format!("CI_PROJECT_ID: {val}")))
}

pub fn commit_tag() -> Result<String> {
    required("CI_COMMIT_TAG")
}

pub fn commit_sha() -> Result<String> {
    required("CI_COMMIT_SHA")
}

/// Print all CI-related variables, sorted by name.
pub fn debug_variables() {
    let mut ci_vars: Vec<(String, String)> =
        env::vars().filter(|(k, _)| k.starts_with("CI")).collect();
    ci_vars.sort();
    for (key, val) in ci_vars {
        println!("{key}={val}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_strips_api_path() {
        assert_eq!(
            origin_of("https://gitlab.example.com/api/v4"),
            "https://gitlab.example.com"
        );
        assert_eq!(origin_of("https://gitlab.com/"), "https://gitlab.com");
    }

    #[test]
    fn test_origin_no_scheme_passthrough() {
        assert_eq!(origin_of("gitlab.example.com/"), "gitlab.example.com");
    }
}
