//! Session cache: passwords held in memory for a fixed time.
//!
//! Entries expire a fixed time after they were last set. Expiry is checked
//! when an entry is read; nothing runs in the background.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use zeroize::Zeroizing;

/// Time-to-live of a cached password unless configured otherwise.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(15 * 60);

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. For tests.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.start + offset
    }
}

struct CachedPassword {
    password: Zeroizing<String>,
    /// `None` if the TTL overflows the clock.
    expires_at: Option<Instant>,
}

/// In-memory password cache keyed by arc id.
pub struct SessionCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    passwords: HashMap<String, CachedPassword>,
}

impl SessionCache {
    /// Cache with the given TTL on the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl,
            passwords: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cache `password`, restarting the arc's TTL.
    pub fn set(&mut self, arc_id: &str, password: &str) {
        let expires_at = self.clock.now().checked_add(self.ttl);
        self.passwords.insert(
            arc_id.to_string(),
            CachedPassword {
                password: Zeroizing::new(password.to_string()),
                expires_at,
            },
        );
    }

    /// Cached password for an arc, if present and not expired.
    ///
    /// An expired entry is evicted.
    pub fn get(&mut self, arc_id: &str) -> Option<Zeroizing<String>> {
        let now = self.clock.now();
        let cached = self.passwords.get(arc_id)?;

        if cached.expires_at.is_some_and(|expires_at| now > expires_at) {
            self.passwords.remove(arc_id);
            return None;
        }
        Some(cached.password.clone())
    }

    /// Drop one arc's entry.
    pub fn clear(&mut self, arc_id: &str) {
        self.passwords.remove(arc_id);
    }

    /// Drop every entry.
    pub fn clear_all(&mut self) {
        self.passwords.clear();
    }

    pub fn len(&self) -> usize {
        self.passwords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passwords.is_empty()
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}
