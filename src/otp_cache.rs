//! src/otp_cache.rs
//!
//! Short-lived passcodes for pending registrations, one per identifier.
//! Entries expire a fixed window after they were saved. Expiry is checked
//! when an entry is accessed; `purge_expired` reclaims entries nobody
//! comes back for.
mod clock;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, Secret};

pub use clock::{Clock, ManualClock, SystemClock};

pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("There is no pending registration for this identifier.")]
    NotFound,
    #[error("The pending registration has expired.")]
    Expired,
    #[error("The supplied passcode does not match.")]
    Mismatch,
}

struct PendingRegistration<T> {
    passcode: Secret<String>,
    payload: T,
    created_at: Instant,
}

type Entries<T> = HashMap<String, PendingRegistration<T>>;

pub struct OtpCache<T> {
    entries: Mutex<Entries<T>>,
    ttl: Duration,
    max_pending: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl<T> OtpCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_pending: None,
            clock,
        }
    }

    /// Caps how many identifiers can be pending at once. A save for a new
    /// identifier into a full cache first drops expired entries, then the
    /// oldest one. A limit of 0 is treated as 1.
    pub fn with_capacity_limit(mut self, max_pending: usize) -> Self {
        self.max_pending = Some(max_pending.max(1));
        self
    }

    /// Stores `passcode` and `payload` under `identifier`, replacing
    /// whatever was pending there and restarting its window.
    #[tracing::instrument(
        name = "Save pending registration",
        skip(self, passcode, payload)
    )]
    pub fn save(&self, identifier: &str, passcode: Secret<String>, payload: T) {
        let now = self.clock.now();
        let mut entries = self.lock();

        if let Some(max_pending) = self.max_pending {
            if !entries.contains_key(identifier) && entries.len() >= max_pending
            {
                self.make_room(&mut entries, now, max_pending);
            }
        }

        let replaced = entries
            .insert(
                identifier.to_owned(),
                PendingRegistration {
                    passcode,
                    payload,
                    created_at: now,
                },
            )
            .is_some();
        tracing::debug!(replaced, "Stored pending registration");
    }

    /// Checks `supplied` against the passcode pending for `identifier`.
    ///
    /// On a match the entry is consumed and its payload returned. An expired
    /// entry is dropped. A mismatch leaves the entry in place.
    #[tracing::instrument(
        name = "Verify pending registration",
        skip(self, supplied)
    )]
    pub fn verify(
        &self,
        identifier: &str,
        supplied: &Secret<String>,
    ) -> Result<T, VerifyError> {
        let now = self.clock.now();
        let mut entries = self.lock();

        let (expired, matches) = match entries.get(identifier) {
            None => return Err(VerifyError::NotFound),
            Some(entry) => (
                self.is_expired(entry, now),
                entry.passcode.expose_secret() == supplied.expose_secret(),
            ),
        };

        if expired {
            entries.remove(identifier);
            tracing::info!("Evicted an expired pending registration");
            return Err(VerifyError::Expired);
        }
        if !matches {
            return Err(VerifyError::Mismatch);
        }
        entries
            .remove(identifier)
            .map(|entry| entry.payload)
            .ok_or(VerifyError::NotFound)
    }

    /// Drops every entry past its window. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        self.purge(&mut entries, now)
    }

    /// Entries physically held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Entries<T>> {
        // Every mutation is a single insert or remove, a panicking holder
        // cannot leave the map inconsistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &PendingRegistration<T>, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) > self.ttl
    }

    fn purge(&self, entries: &mut Entries<T>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    fn make_room(
        &self,
        entries: &mut Entries<T>,
        now: Instant,
        max_pending: usize,
    ) {
        let purged = self.purge(entries, now);
        if purged > 0 {
            tracing::debug!(purged, "Purged expired registrations to make room");
        }
        if entries.len() < max_pending {
            return;
        }
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.created_at)
            .map(|(identifier, _)| identifier.clone());
        if let Some(oldest) = oldest {
            entries.remove(&oldest);
            tracing::warn!(
                evicted = %oldest,
                max_pending,
                "Pending registrations at capacity, evicted the oldest"
            );
        }
    }
}
