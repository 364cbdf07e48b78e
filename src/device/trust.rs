//! Trusted device key persistence.
//!
//! The store is injected into the login flow rather than living in a
//! process-wide global; each successful login overwrites the key, and the
//! last successful writer wins.

use std::sync::{Mutex, PoisonError};

/// RSA public key material accepted after a verified login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedDeviceKey {
    pub modulus: String,
    pub exponent: String,
}

pub trait TrustStore: Send + Sync {
    fn store(&self, key: TrustedDeviceKey);
    fn current(&self) -> Option<TrustedDeviceKey>;
}

/// In-memory store scoped to the running process.
#[derive(Debug, Default)]
pub struct MemoryTrustStore {
    key: Mutex<Option<TrustedDeviceKey>>,
}

impl MemoryTrustStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrustStore for MemoryTrustStore {
    fn store(&self, key: TrustedDeviceKey) {
        let mut guard = self.key.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(key);
    }

    fn current(&self) -> Option<TrustedDeviceKey> {
        self.key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(modulus: &str) -> TrustedDeviceKey {
        TrustedDeviceKey {
            modulus: modulus.to_string(),
            exponent: "010001".to_string(),
        }
    }

    #[test]
    fn store_starts_empty() {
        let store = MemoryTrustStore::new();
        assert_eq!(store.current(), None);
    }

    #[test]
    fn last_writer_wins() {
        let store = MemoryTrustStore::new();
        store.store(key("aa"));
        store.store(key("bb"));
        assert_eq!(store.current(), Some(key("bb")));
    }
}
