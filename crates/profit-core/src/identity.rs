//! Memoizing worker identity resolution
//!
//! The identity provider only describes the user of the current session, so a
//! lookup for any other handle degrades to a fallback entry. Whatever the
//! first resolution produces is cached for the rest of the session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Where an identity entry came from, most to least trustworthy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentitySource {
    /// Session user matched the requested handle
    Native,
    /// Provider available but describes someone else
    NativeFallback,
    /// No provider context at all
    OfflineFallback,
    /// Provider context could not be read
    ErrorFallback,
}

impl std::fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentitySource::Native => write!(f, "native"),
            IdentitySource::NativeFallback => write!(f, "native-fallback"),
            IdentitySource::OfflineFallback => write!(f, "offline-fallback"),
            IdentitySource::ErrorFallback => write!(f, "error-fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityEntry {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    /// Handle without `@`
    pub handle: String,
    pub source: IdentitySource,
}

impl IdentityEntry {
    fn fallback(handle: &str, source: IdentitySource) -> Self {
        Self {
            id: None,
            first_name: handle.to_string(),
            last_name: String::new(),
            handle: handle.to_string(),
            source,
        }
    }
}

/// Session user as embedded in the provider context
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("user parameter is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("user parameter is not a valid user object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Source of the identity-provider context blob
pub trait IdentityContext: Send + Sync {
    /// URL-encoded context (`user=...&auth_date=...`), `None` outside the provider
    fn init_data(&self) -> Option<String>;
}

/// Context fixed at startup (from config, or absent)
#[derive(Debug, Clone, Default)]
pub struct StaticContext(pub Option<String>);

impl IdentityContext for StaticContext {
    fn init_data(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Extract the session user from a provider context blob.
///
/// `Ok(None)` when the blob carries no `user` parameter.
pub fn session_user(init_data: &str) -> Result<Option<SessionUser>, ContextError> {
    let Some(encoded) = init_data
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "user")
        .map(|(_, value)| value)
    else {
        return Ok(None);
    };

    let spaced = encoded.replace('+', " ");
    let json = percent_decode_str(&spaced).decode_utf8()?;
    Ok(Some(serde_json::from_str(&json)?))
}

/// Trim and drop the first `@` from typed input
pub fn normalize_handle(input: &str) -> String {
    input.trim().replacen('@', "", 1)
}

/// Handle -> identity cache; first resolution wins for the session
pub struct IdentityResolver {
    context: Box<dyn IdentityContext>,
    cache: Mutex<HashMap<String, Arc<IdentityEntry>>>,
}

impl IdentityResolver {
    pub fn new(context: impl IdentityContext + 'static) -> Self {
        Self {
            context: Box::new(context),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver with no provider context
    pub fn offline() -> Self {
        Self::new(StaticContext(None))
    }

    /// Resolve `handle` (no `@`). Cached entries are returned as the same `Arc`.
    ///
    /// The cache lock is held across the lookup, so concurrent callers for one
    /// handle trigger a single resolution.
    pub fn resolve(&self, handle: &str) -> Arc<IdentityEntry> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = cache.get(handle) {
            return Arc::clone(entry);
        }

        let entry = Arc::new(self.lookup(handle));
        debug!(handle, source = %entry.source, "identity resolved");
        cache.insert(handle.to_string(), Arc::clone(&entry));
        entry
    }

    pub fn cached_count(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Identity id of the session user, if the context provides one
    pub fn session_user_id(&self) -> Option<i64> {
        let blob = self.context.init_data()?;
        session_user(&blob).ok().flatten().and_then(|u| u.id)
    }

    fn lookup(&self, handle: &str) -> IdentityEntry {
        let Some(blob) = self.context.init_data().filter(|d| !d.is_empty()) else {
            return IdentityEntry::fallback(handle, IdentitySource::OfflineFallback);
        };

        match session_user(&blob) {
            Ok(Some(user)) if user.username.as_deref() == Some(handle) => IdentityEntry {
                id: user.id,
                first_name: user
                    .first_name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| handle.to_string()),
                last_name: user.last_name.unwrap_or_default(),
                handle: handle.to_string(),
                source: IdentitySource::Native,
            },
            Ok(_) => IdentityEntry::fallback(handle, IdentitySource::NativeFallback),
            Err(e) => {
                warn!(handle, error = %e, "failed to read identity context");
                IdentityEntry::fallback(handle, IdentitySource::ErrorFallback)
            }
        }
    }
}
