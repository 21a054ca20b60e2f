// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request identifiers.
//!
//! Each request to a Bond carries an identifier in the `BOND-UUID` header.
//! The Bond uses it to drop duplicate deliveries, and log lines use it to
//! correlate a request with its response or error.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of per-request identifiers.
///
/// Implementations must never repeat an identifier within the lifetime of
/// the client that owns them.
pub trait RequestIdGenerator: Send + Sync {
    /// Returns the next identifier.
    fn next_id(&self) -> String;
}

/// Monotonic counter seeded with a random prefix.
///
/// Identifiers look like `3f2a9c1e-000000000000002a`: the prefix separates
/// process runs, the counter separates requests within a run.
///
/// # Examples
///
/// ```
/// use bond_bridge::protocol::{RequestIdGenerator, SequentialRequestIds};
///
/// let ids = SequentialRequestIds::with_seed("test", 0);
/// assert_eq!(ids.next_id(), "test-0000000000000000");
/// assert_eq!(ids.next_id(), "test-0000000000000001");
/// ```
#[derive(Debug)]
pub struct SequentialRequestIds {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialRequestIds {
    /// Creates a generator with a random prefix.
    #[must_use]
    pub fn new() -> Self {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        let prefix = uuid.get(..8).unwrap_or(&uuid).to_string();
        Self::with_seed(prefix, 0)
    }

    /// Creates a generator with a fixed prefix and starting counter.
    #[must_use]
    pub fn with_seed(prefix: impl Into<String>, start: u64) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(start),
        }
    }
}

impl Default for SequentialRequestIds {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestIdGenerator for SequentialRequestIds {
    fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n:016x}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[test]
    fn ids_do_not_repeat() {
        let ids = SequentialRequestIds::new();
        let seen: HashSet<String> = (0..1000).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn separate_generators_use_separate_prefixes() {
        let a = SequentialRequestIds::new();
        let b = SequentialRequestIds::new();
        assert_ne!(a.next_id(), b.next_id());
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let ids = Arc::new(SequentialRequestIds::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..250).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 1000);
    }
}
