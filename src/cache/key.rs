//! Cache Key Module
//!
//! Deterministic, tagged cache keys for GitHub endpoints.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Prefix shared by every key built from a GitHub endpoint.
pub const GITHUB_KEY_PREFIX: &str = "github:";

/// Token segment used for unauthenticated requests.
const ANONYMOUS_TOKEN: &str = "anonymous";

/// Number of hex characters of the token hash kept in the key.
const TOKEN_PREFIX_LEN: usize = 8;

// == Key Kind ==
/// What a key points at; decides the TTL an entry receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// File contents (`repos/{owner}/{repo}/contents/...`)
    Content,
    /// Repository metadata (`repos/...`)
    Repository,
    /// User profiles (`user`, `users/...`)
    User,
    #[default]
    Default,
}

impl KeyKind {
    /// Classifies a normalized GitHub endpoint (no leading slash).
    pub fn classify(endpoint: &str) -> Self {
        if endpoint.contains("/contents/") || endpoint.ends_with("/contents") {
            KeyKind::Content
        } else if endpoint.starts_with("repos/") {
            KeyKind::Repository
        } else if endpoint.starts_with("user") {
            KeyKind::User
        } else {
            KeyKind::Default
        }
    }
}

// == Cache Key ==
/// A cache key carrying its classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    raw: String,
    kind: KeyKind,
}

impl CacheKey {
    /// An untagged key; receives the default TTL.
    pub fn new(raw: impl Into<String>) -> Self {
        Self::with_kind(raw, KeyKind::Default)
    }

    pub fn with_kind(raw: impl Into<String>, kind: KeyKind) -> Self {
        Self {
            raw: raw.into(),
            kind,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for CacheKey {
    fn from(raw: &str) -> Self {
        CacheKey::new(raw)
    }
}

impl From<String> for CacheKey {
    fn from(raw: String) -> Self {
        CacheKey::new(raw)
    }
}

impl From<&CacheKey> for CacheKey {
    fn from(key: &CacheKey) -> Self {
        key.clone()
    }
}

// == Key Generation ==
/// Builds the key for a GitHub request: `github:{endpoint}:{params}:{token}`.
///
/// Parameters are sorted so insertion order never changes the key. The token
/// is reduced to a short SHA-256 prefix.
pub fn generate_key(endpoint: &str, params: &[(&str, &str)], token: Option<&str>) -> CacheKey {
    let endpoint = normalize_endpoint(endpoint);

    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort();
    let params = sorted
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    CacheKey::with_kind(
        format!(
            "{GITHUB_KEY_PREFIX}{endpoint}:{params}:{}",
            token_prefix(token)
        ),
        KeyKind::classify(endpoint),
    )
}

/// Strips leading slashes so `/repos/x` and `repos/x` share a key.
pub fn normalize_endpoint(endpoint: &str) -> &str {
    endpoint.trim_start_matches('/')
}

/// Short SHA-256 prefix of `token`, or `anonymous` when there is none.
pub fn token_prefix(token: Option<&str>) -> String {
    match token.filter(|t| !t.is_empty()) {
        Some(token) => {
            let digest = format!("{:x}", Sha256::digest(token.as_bytes()));
            digest[..TOKEN_PREFIX_LEN].to_string()
        }
        None => ANONYMOUS_TOKEN.to_string(),
    }
}
