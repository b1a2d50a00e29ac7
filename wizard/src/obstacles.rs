//! Obstacle ledger: per-kind counts of roof fixtures.
//!
//! Map semantics, never a bag: at most one entry per kind, quantities stay
//! strictly positive, and an entry whose count reaches zero is removed so it
//! is never persisted.

#[cfg(test)]
#[path = "obstacles_test.rs"]
mod obstacles_test;

use std::collections::BTreeMap;

use wire::{ObstacleEntry, ObstacleKind};

/// Counts of obstacles keyed by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObstacleLedger {
    entries: BTreeMap<ObstacleKind, u32>,
}

impl ObstacleLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from persisted entries. Duplicate kinds are merged and
    /// zero quantities dropped.
    #[must_use]
    pub fn from_entries(entries: &[ObstacleEntry]) -> Self {
        let mut ledger = Self::new();
        for entry in entries {
            for _ in 0..entry.quantity {
                ledger.increment(entry.kind);
            }
        }
        ledger
    }

    /// Add one obstacle of the given kind.
    pub fn increment(&mut self, kind: ObstacleKind) {
        *self.entries.entry(kind).or_insert(0) += 1;
    }

    /// Remove one obstacle of the given kind. The entry disappears when the
    /// count reaches zero; decrementing an absent kind is a no-op.
    pub fn decrement(&mut self, kind: ObstacleKind) {
        if let Some(count) = self.entries.get_mut(&kind) {
            *count -= 1;
            if *count == 0 {
                self.entries.remove(&kind);
            }
        }
    }

    /// Current count for a kind (zero when absent).
    #[must_use]
    pub fn quantity(&self, kind: ObstacleKind) -> u32 {
        self.entries.get(&kind).copied().unwrap_or(0)
    }

    /// Entries in stable kind order, for persistence and display.
    #[must_use]
    pub fn list(&self) -> Vec<ObstacleEntry> {
        self.entries
            .iter()
            .map(|(&kind, &quantity)| ObstacleEntry { kind, quantity })
            .collect()
    }

    /// Total obstacle count across all kinds.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.entries.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct kinds present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
