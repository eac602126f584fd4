//! Last-write-wins slots for refreshed display data
//!
//! Balance and history refreshes can overlap (an account switch while the
//! previous fetch is still running). Each refresh takes a ticket up front and
//! only the newest ticket may publish its result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

/// Issued by [`RefreshSlot::begin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug)]
pub struct RefreshSlot<T> {
    issued: AtomicU64,
    value: Mutex<(u64, Option<T>)>,
}

impl<T> RefreshSlot<T> {
    pub fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            value: Mutex::new((0, None)),
        }
    }

    fn value(&self) -> MutexGuard<'_, (u64, Option<T>)> {
        self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn begin(&self) -> RefreshTicket {
        RefreshTicket(self.issued.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        self.issued.load(Ordering::Acquire) == ticket.0
    }

    /// Publish `value` if `ticket` is still the newest; returns whether it was applied
    pub fn complete(&self, ticket: RefreshTicket, value: T) -> bool {
        let mut slot = self.value();
        if !self.is_current(ticket) || slot.0 > ticket.0 {
            debug!("Dropping stale refresh result {}", ticket.0);
            return false;
        }
        *slot = (ticket.0, Some(value));
        true
    }
}

impl<T> Default for RefreshSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> RefreshSlot<T> {
    pub fn get(&self) -> Option<T> {
        self.value().1.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_wins() {
        let slot = RefreshSlot::new();
        let first = slot.begin();
        let second = slot.begin();

        assert!(slot.complete(second, "new"));
        assert!(!slot.complete(first, "old"));
        assert_eq!(slot.get(), Some("new"));
    }

    #[test]
    fn test_stale_before_newer_completes() {
        let slot = RefreshSlot::new();
        let first = slot.begin();
        let _second = slot.begin();

        // Superseded even though the newer fetch has not finished
        assert!(!slot.complete(first, 1));
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn test_sequential_refreshes() {
        let slot = RefreshSlot::new();
        for i in 0..3 {
            let ticket = slot.begin();
            assert!(slot.is_current(ticket));
            assert!(slot.complete(ticket, i));
        }
        assert_eq!(slot.get(), Some(2));
    }
}
