//! Ancestor-chain resolution with caching

use super::types::{Scope, ScopeError};
use dashmap::DashMap;
use regex::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Configuration for the scope resolver
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    /// Maximum depth of scope hierarchy
    pub max_depth: usize,

    /// Whether every scoped definition demands a root-scope (unscoped)
    /// definition during validation
    ///
    /// The root is always the last ancestor consulted during fallback; this
    /// flag only controls whether its absence is a build error.
    pub require_root_scope: bool,

    /// Time-to-live for cache entries
    pub cache_ttl: Duration,

    /// Regex for validating scope segment characters
    pub allowed_chars_regex: Regex,

    /// Maximum number of entries in the scope chain cache
    pub max_cache_size: usize,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            require_root_scope: false,
            cache_ttl: Duration::from_secs(60),
            allowed_chars_regex: Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap(),
            max_cache_size: 10_000,
        }
    }
}

/// Cache statistics for monitoring performance
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub size: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
}

/// Entry in the scope chain cache with expiration
#[derive(Debug, Clone)]
struct ChainEntry {
    chain: Vec<String>,
    expires_at: u64,
}

/// Derives and caches scope ancestor chains
///
/// # Thread Safety
///
/// Uses DashMap for the chain cache and can be shared freely across threads.
///
/// # Examples
///
/// ```
/// use authz_index::{ScopeConfig, ScopeResolver};
///
/// let resolver = ScopeResolver::new(ScopeConfig::default());
///
/// let chain = resolver.build_scope_chain("acme.hr.uk").unwrap();
/// assert_eq!(chain, vec!["acme.hr.uk", "acme.hr", "acme"]);
///
/// let ancestors = resolver.ancestor_scopes("acme.hr.uk").unwrap();
/// assert_eq!(ancestors, vec!["acme.hr", "acme", ""]);
/// ```
#[derive(Debug)]
pub struct ScopeResolver {
    config: ScopeConfig,
    chain_cache: DashMap<String, ChainEntry>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl ScopeResolver {
    /// Creates a new scope resolver with the given configuration
    pub fn new(config: ScopeConfig) -> Self {
        Self {
            config,
            chain_cache: DashMap::new(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Returns the resolver's configuration
    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    /// Builds the fallback chain from most to least specific
    ///
    /// Example: `"acme.hr.uk"` -> `["acme.hr.uk", "acme.hr", "acme"]`. The
    /// root (empty) scope is never part of the chain; callers that treat it
    /// as an ancestor use [`ancestor_scopes`](Self::ancestor_scopes).
    ///
    /// # Errors
    ///
    /// Returns `ScopeError` if the scope has empty segments, exceeds the
    /// configured depth, or contains disallowed characters.
    pub fn build_scope_chain(&self, scope: &str) -> Result<Vec<String>, ScopeError> {
        if scope.is_empty() {
            return Ok(Vec::new());
        }

        // Check cache first
        let now = current_timestamp_ms();
        if let Some(entry) = self.chain_cache.get(scope) {
            if entry.expires_at > now {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                return Ok(entry.chain.clone());
            }
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let parsed = Scope::new(scope)?;
        let segments = parsed.segments();

        if segments.len() > self.config.max_depth {
            return Err(ScopeError::DepthExceeded {
                depth: segments.len(),
                max_depth: self.config.max_depth,
            });
        }

        for segment in segments {
            Scope::validate_segment(segment, &self.config.allowed_chars_regex)?;
        }

        // Build chain from most to least specific
        let mut chain = Vec::with_capacity(segments.len());
        for i in (1..=segments.len()).rev() {
            chain.push(segments[..i].join("."));
        }

        let expires_at = now + self.config.cache_ttl.as_millis() as u64;
        self.chain_cache.insert(
            scope.to_string(),
            ChainEntry {
                chain: chain.clone(),
                expires_at,
            },
        );

        if self.chain_cache.len() > self.config.max_cache_size {
            self.evict_expired_entries();
        }

        Ok(chain)
    }

    /// Returns the ancestor scopes of `scope`, most specific first
    ///
    /// The scope itself is excluded; the root (empty) scope comes last, since
    /// it is the final fallback of every chain.
    ///
    /// # Errors
    ///
    /// Same validation failures as [`build_scope_chain`](Self::build_scope_chain).
    pub fn ancestor_scopes(&self, scope: &str) -> Result<Vec<String>, ScopeError> {
        if scope.is_empty() {
            return Ok(Vec::new());
        }

        let chain = self.build_scope_chain(scope)?;
        let mut ancestors: Vec<String> = chain.into_iter().skip(1).collect();
        ancestors.push(String::new());

        Ok(ancestors)
    }

    /// Validates a scope string
    pub fn validate_scope(&self, scope: &str) -> Result<(), ScopeError> {
        if scope.is_empty() {
            return Ok(());
        }

        let parsed = Scope::new(scope)?;
        let segments = parsed.segments();

        if segments.len() > self.config.max_depth {
            return Err(ScopeError::DepthExceeded {
                depth: segments.len(),
                max_depth: self.config.max_depth,
            });
        }

        for segment in segments {
            Scope::validate_segment(segment, &self.config.allowed_chars_regex)?;
        }

        Ok(())
    }

    /// Clears the scope chain cache and resets statistics
    pub fn clear_cache(&self) {
        self.chain_cache.clear();
        self.hit_count.store(0, Ordering::Relaxed);
        self.miss_count.store(0, Ordering::Relaxed);
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        let size = self.chain_cache.len();
        let hits = self.hit_count.load(Ordering::Relaxed);
        let misses = self.miss_count.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            size,
            hit_count: hits,
            miss_count: misses,
            hit_rate,
        }
    }

    /// Evicts expired entries from the cache
    fn evict_expired_entries(&self) {
        let now = current_timestamp_ms();
        self.chain_cache.retain(|_, entry| entry.expires_at > now);
    }
}

/// Returns current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_scope_chain() {
        let resolver = ScopeResolver::new(ScopeConfig::default());

        let chain = resolver.build_scope_chain("acme.hr.uk").unwrap();
        assert_eq!(chain, vec!["acme.hr.uk", "acme.hr", "acme"]);
    }

    #[test]
    fn test_build_scope_chain_caching() {
        let resolver = ScopeResolver::new(ScopeConfig::default());

        // First call - cache miss
        let _chain1 = resolver.build_scope_chain("acme.hr").unwrap();
        let stats1 = resolver.stats();
        assert_eq!(stats1.miss_count, 1);

        // Second call - cache hit
        let _chain2 = resolver.build_scope_chain("acme.hr").unwrap();
        let stats2 = resolver.stats();
        assert_eq!(stats2.hit_count, 1);
    }

    #[test]
    fn test_ancestor_scopes_excludes_self_ends_at_root() {
        let resolver = ScopeResolver::new(ScopeConfig::default());

        let ancestors = resolver.ancestor_scopes("acme.hr.uk").unwrap();
        assert_eq!(ancestors, vec!["acme.hr", "acme", ""]);
    }

    #[test]
    fn test_ancestor_scopes_of_single_segment_is_root_only() {
        let resolver = ScopeResolver::new(ScopeConfig::default());

        let ancestors = resolver.ancestor_scopes("acme").unwrap();
        assert_eq!(ancestors, vec![String::new()]);
    }

    #[test]
    fn test_ancestor_scopes_of_root_is_empty() {
        let resolver = ScopeResolver::new(ScopeConfig::default());
        assert!(resolver.ancestor_scopes("").unwrap().is_empty());
    }

    #[test]
    fn test_validate_scope() {
        let resolver = ScopeResolver::new(ScopeConfig::default());

        assert!(resolver.validate_scope("acme.hr.uk").is_ok());
        assert!(resolver.validate_scope("").is_ok());
        assert!(resolver.validate_scope("org-name.dept_1").is_ok());
        assert!(resolver.validate_scope("acme..uk").is_err());
    }

    #[test]
    fn test_cache_ttl() {
        let config = ScopeConfig {
            cache_ttl: Duration::from_millis(50),
            ..ScopeConfig::default()
        };
        let resolver = ScopeResolver::new(config);

        // Build and cache
        let _chain1 = resolver.build_scope_chain("acme.hr").unwrap();
        let stats1 = resolver.stats();
        assert_eq!(stats1.miss_count, 1);

        // Immediate hit
        let _chain2 = resolver.build_scope_chain("acme.hr").unwrap();
        let stats2 = resolver.stats();
        assert_eq!(stats2.hit_count, 1);

        // Wait for expiration
        std::thread::sleep(Duration::from_millis(100));

        // Should be miss again
        let _chain3 = resolver.build_scope_chain("acme.hr").unwrap();
        let stats3 = resolver.stats();
        assert_eq!(stats3.miss_count, 2);
    }

    #[test]
    fn test_max_depth() {
        let config = ScopeConfig {
            max_depth: 3,
            ..ScopeConfig::default()
        };
        let resolver = ScopeResolver::new(config);

        assert!(resolver.build_scope_chain("a.b.c").is_ok());
        assert!(resolver.build_scope_chain("a.b.c.d").is_err());
    }

    #[test]
    fn test_clear_cache() {
        let resolver = ScopeResolver::new(ScopeConfig::default());

        resolver.build_scope_chain("acme.hr").unwrap();
        let stats1 = resolver.stats();
        assert!(stats1.size > 0);

        resolver.clear_cache();
        let stats2 = resolver.stats();
        assert_eq!(stats2.size, 0);
        assert_eq!(stats2.hit_count, 0);
        assert_eq!(stats2.miss_count, 0);
    }
}
