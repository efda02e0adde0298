//! External token cache
//!
//! The access token can be mirrored in a store that outlives the client
//! (a shared cache, a file, a keychain). The client only ever touches one
//! key, [`ACCESS_TOKEN_KEY`]. An empty value means "no token".

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use parking_lot::Mutex;

/// Cache key holding the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Get/set access to an external key-value store
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Value stored under `key`, if any
    async fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`; an empty value clears the entry
    async fn set(&self, key: &str, value: &str);
}

/// Process-local cache, handy for sharing a token between client instances
#[derive(Debug, Default)]
pub struct InMemoryTokenCache {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryTokenCache {
    /// Empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-populated with an access token
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let cache = Self::new();
        cache.entries.lock().insert(ACCESS_TOKEN_KEY.to_string(), token.into());
        cache
    }

    /// Synchronous read, for inspection
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

#[async_trait]
impl TokenCache for InMemoryTokenCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.peek(key)
    }

    async fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }
}

/// Adapter turning a getter and a setter closure into a [`TokenCache`]
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use std::sync::{Arc, Mutex};
///
/// use symplur_client::auth::FnTokenCache;
///
/// let store = Arc::new(Mutex::new(HashMap::<String, String>::new()));
/// let (reader, writer) = (store.clone(), store.clone());
/// let cache = FnTokenCache::new(
///     move |key: &str| reader.lock().ok()?.get(key).cloned(),
///     move |key: &str, value: &str| {
///         if let Ok(mut map) = writer.lock() {
///             map.insert(key.to_string(), value.to_string());
///         }
///     },
/// );
/// # let _ = cache;
/// ```
pub struct FnTokenCache<G, S> {
    getter: G,
    setter: S,
}

impl<G, S> FnTokenCache<G, S>
where
    G: Fn(&str) -> Option<String> + Send + Sync,
    S: Fn(&str, &str) + Send + Sync,
{
    /// Wrap a getter and a setter
    pub const fn new(getter: G, setter: S) -> Self {
        Self { getter, setter }
    }
}

impl<G, S> fmt::Debug for FnTokenCache<G, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTokenCache").finish_non_exhaustive()
    }
}

#[async_trait]
impl<G, S> TokenCache for FnTokenCache<G, S>
where
    G: Fn(&str) -> Option<String> + Send + Sync,
    S: Fn(&str, &str) + Send + Sync,
{
    async fn get(&self, key: &str) -> Option<String> {
        (self.getter)(key)
    }

    async fn set(&self, key: &str, value: &str) {
        (self.setter)(key, value);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn in_memory_round_trip() {
        let cache = InMemoryTokenCache::new();
        assert_eq!(cache.get(ACCESS_TOKEN_KEY).await, None);

        cache.set(ACCESS_TOKEN_KEY, "abc").await;
        assert_eq!(cache.get(ACCESS_TOKEN_KEY).await.as_deref(), Some("abc"));
        assert_eq!(cache.peek(ACCESS_TOKEN_KEY).as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn with_token_prepopulates_access_token() {
        let cache = InMemoryTokenCache::with_token("v83yb45voqc");
        assert_eq!(cache.get(ACCESS_TOKEN_KEY).await.as_deref(), Some("v83yb45voqc"));
    }

    #[tokio::test]
    async fn closures_are_invoked() {
        let sets = Arc::new(AtomicUsize::new(0));
        let counter = sets.clone();
        let cache = FnTokenCache::new(
            |key: &str| (key == ACCESS_TOKEN_KEY).then(|| "from-getter".to_string()),
            move |_: &str, _: &str| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert_eq!(cache.get(ACCESS_TOKEN_KEY).await.as_deref(), Some("from-getter"));
        assert_eq!(cache.get("other").await, None);
        cache.set(ACCESS_TOKEN_KEY, "x").await;
        assert_eq!(sets.load(Ordering::SeqCst), 1);
    }
}
