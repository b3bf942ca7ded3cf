/// Coalescing of bursts of tab events before auto-grouping
use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;

/// Something that can wait; the browser's `setTimeout` in production
#[async_trait(?Send)]
pub trait Timer {
    async fn sleep(&self, millis: u32);
}

/// Issued by [`Debouncer::schedule`]; only the newest ticket per key settles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    generation: u64,
}

/// Keeps only the last event per key.
///
/// The caller schedules a ticket, waits, and then asks whether the ticket is
/// still the newest one for its key. Earlier tickets for the same key are
/// dropped, so a tab navigating several times in a row is grouped once.
#[derive(Debug)]
pub struct Debouncer<K> {
    latest: HashMap<K, u64>,
    next_generation: u64,
}

impl<K: Eq + Hash + Copy> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Copy> Debouncer<K> {
    pub fn new() -> Self {
        Debouncer {
            latest: HashMap::new(),
            next_generation: 0,
        }
    }

    pub fn schedule(&mut self, key: K) -> Ticket<K> {
        self.next_generation += 1;
        self.latest.insert(key, self.next_generation);
        Ticket {
            key,
            generation: self.next_generation,
        }
    }

    /// True exactly once, for the newest ticket of its key
    pub fn settle(&mut self, ticket: Ticket<K>) -> bool {
        match self.latest.get(&ticket.key) {
            Some(generation) if *generation == ticket.generation => {
                self.latest.remove(&ticket.key);
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.latest.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_ticket_settles_once() {
        let mut debouncer = Debouncer::new();
        let ticket = debouncer.schedule(7);

        assert!(debouncer.settle(ticket));
        assert!(!debouncer.settle(ticket));
        assert_eq!(debouncer.pending(), 0);
    }

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let mut debouncer = Debouncer::new();
        let first = debouncer.schedule(7);
        let second = debouncer.schedule(7);

        assert!(!debouncer.settle(first));
        assert!(debouncer.settle(second));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut debouncer = Debouncer::new();
        let a = debouncer.schedule(1);
        let b = debouncer.schedule(2);

        assert_eq!(debouncer.pending(), 2);
        assert!(debouncer.settle(b));
        assert!(debouncer.settle(a));
    }
}
