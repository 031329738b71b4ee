// crates/fio-ledger-core/src/core/caller.rs
// ============================================================================
// Module: fio-ledger Caller Identity
// Description: Authorized caller identity and a bounded TTL lookup cache.
// Purpose: Carry the caller into audit logs without module-level state.
// Dependencies: lru, serde, sha2
// ============================================================================

//! ## Overview
//! Credential verification happens outside the ledger; operations only
//! receive an already-authorized [`CallerIdentity`] for audit logging.
//! [`CallerCache`] is an explicit cache object owned by the request-handling
//! layer. It is keyed by [`credential_fingerprint`] so raw credentials are
//! never held, bounded in size, and expires entries after a fixed TTL. Time is
//! always passed in.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;
use std::time::Instant;

use lru::LruCache;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Caller Identity
// ============================================================================

/// Role granted to an authorized caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerRole {
    /// Full read, write, and administrative access.
    Admin,
    /// Upload-only access.
    Uploader,
}

/// Already-authorized caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// Caller name.
    pub username: String,
    /// Granted role.
    pub role: CallerRole,
}

impl CallerIdentity {
    /// Creates a caller identity.
    #[must_use]
    pub fn new(username: impl Into<String>, role: CallerRole) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self.role {
            CallerRole::Admin => "admin",
            CallerRole::Uploader => "uploader",
        };
        write!(f, "{}({role})", self.username)
    }
}

/// Returns the lowercase hex SHA-256 fingerprint of a credential.
#[must_use]
pub fn credential_fingerprint(credential: &str) -> String {
    Sha256::digest(credential.as_bytes()).iter().map(|byte| format!("{byte:02x}")).collect()
}

// ============================================================================
// SECTION: Caller Cache
// ============================================================================

/// Cached identity with its insertion time.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Cached identity.
    identity: CallerIdentity,
    /// Insertion time.
    inserted_at: Instant,
}

/// Bounded TTL cache of authorized callers keyed by credential fingerprint.
///
/// Reads use `peek`, so the recency order of the underlying [`LruCache`] is
/// insertion order. With non-decreasing `now` values the expired entries are
/// therefore always the least recent ones.
///
/// # Invariants
/// - `len() <= capacity()` after every insertion.
/// - Expired entries are never returned.
#[derive(Debug)]
pub struct CallerCache {
    /// Entry lifetime.
    ttl: Duration,
    /// Entries by fingerprint, least recently inserted first out.
    entries: LruCache<String, CacheEntry>,
}

impl CallerCache {
    /// Creates a cache; a zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: LruCache::new(capacity),
        }
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Returns the number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached identity for a fingerprint unless it has expired.
    pub fn get(&mut self, fingerprint: &str, now: Instant) -> Option<CallerIdentity> {
        let entry = self.entries.peek(fingerprint)?;
        if self.is_expired(entry, now) {
            self.entries.pop(fingerprint);
            return None;
        }
        Some(entry.identity.clone())
    }

    /// Caches an identity, evicting expired entries and then the oldest.
    pub fn insert(&mut self, fingerprint: impl Into<String>, identity: CallerIdentity, now: Instant) {
        let fingerprint = fingerprint.into();
        if !self.entries.contains(&fingerprint) && self.entries.len() >= self.capacity() {
            self.evict_expired(now);
        }
        self.entries.put(
            fingerprint,
            CacheEntry {
                identity,
                inserted_at: now,
            },
        );
    }

    /// Removes an entry.
    pub fn invalidate(&mut self, fingerprint: &str) {
        self.entries.pop(fingerprint);
    }

    /// Removes expired entries from the old end and returns how many were dropped.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let mut dropped = 0;
        while self.entries.peek_lru().is_some_and(|(_, entry)| self.is_expired(entry, now)) {
            self.entries.pop_lru();
            dropped += 1;
        }
        dropped
    }

    /// Returns `true` when the entry is at or past its TTL.
    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) >= self.ttl
    }
}
