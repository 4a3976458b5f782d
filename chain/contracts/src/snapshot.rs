//! Balance snapshots
//!
//! A snapshot freezes every account balance and the total supply at one
//! instant. Nothing is copied when the snapshot is taken: the pre-change
//! value of a balance is checkpointed the first time it changes after a
//! snapshot, so taking a snapshot costs O(1) and every balance change costs
//! at most one extra push.

use std::collections::HashMap;

use offering_types::ids::{AccountId, SnapshotId};
use offering_types::numeric::Amount;

use crate::errors::TokenError;

/// Per-value history: `(snapshot id, value at that snapshot)`, ids ascending.
#[derive(Debug, Clone, Default)]
pub struct Checkpoints {
    ids: Vec<SnapshotId>,
    values: Vec<Amount>,
}

impl Checkpoints {
    /// Record `value` as of `current` unless already recorded for it.
    pub fn record(&mut self, current: SnapshotId, value: Amount) {
        if current == SnapshotId::NONE {
            return;
        }
        if self.ids.last().map_or(true, |last| *last < current) {
            self.ids.push(current);
            self.values.push(value);
        }
    }

    /// Value as of snapshot `id`, or `None` if it has not changed since
    /// (the live value applies).
    pub fn value_at(&self, id: SnapshotId) -> Option<Amount> {
        let idx = self.ids.partition_point(|recorded| *recorded < id);
        self.values.get(idx).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Snapshot id counter plus checkpoints for every account and the supply.
#[derive(Debug, Clone, Default)]
pub struct SnapshotLedger {
    current: SnapshotId,
    accounts: HashMap<AccountId, Checkpoints>,
    total_supply: Checkpoints,
}

impl SnapshotLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest snapshot id (`SnapshotId::NONE` before the first snapshot).
    pub fn current(&self) -> SnapshotId {
        self.current
    }

    /// Start a new snapshot and return its id.
    pub fn take(&mut self) -> SnapshotId {
        self.current = self.current.next();
        self.current
    }

    /// Must be called with an account's balance right before it changes.
    pub fn before_balance_change(&mut self, account: &AccountId, balance: Amount) {
        if self.current == SnapshotId::NONE {
            return;
        }
        self.accounts
            .entry(*account)
            .or_default()
            .record(self.current, balance);
    }

    /// Must be called with the total supply right before it changes.
    pub fn before_supply_change(&mut self, supply: Amount) {
        self.total_supply.record(self.current, supply);
    }

    /// Balance of `account` at snapshot `id`, given its live balance.
    pub fn balance_at(
        &self,
        account: &AccountId,
        id: SnapshotId,
        live_balance: Amount,
    ) -> Result<Amount, TokenError> {
        self.check_id(id)?;
        Ok(self
            .accounts
            .get(account)
            .and_then(|history| history.value_at(id))
            .unwrap_or(live_balance))
    }

    /// Total supply at snapshot `id`, given the live supply.
    pub fn supply_at(&self, id: SnapshotId, live_supply: Amount) -> Result<Amount, TokenError> {
        self.check_id(id)?;
        Ok(self.total_supply.value_at(id).unwrap_or(live_supply))
    }

    fn check_id(&self, id: SnapshotId) -> Result<(), TokenError> {
        if id == SnapshotId::NONE {
            return Err(TokenError::ZeroSnapshotId);
        }
        if id > self.current {
            return Err(TokenError::SnapshotNotFound { id });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoints_record_once_per_snapshot() {
        let mut cp = Checkpoints::default();
        cp.record(SnapshotId(1), 10);
        cp.record(SnapshotId(1), 99);
        assert_eq!(cp.len(), 1);
        assert_eq!(cp.value_at(SnapshotId(1)), Some(10));
    }

    #[test]
    fn test_checkpoints_ignore_before_first_snapshot() {
        let mut cp = Checkpoints::default();
        cp.record(SnapshotId::NONE, 10);
        assert!(cp.is_empty());
    }

    #[test]
    fn test_value_at_uses_next_recorded_checkpoint() {
        let mut cp = Checkpoints::default();
        // changed during snapshot 3 and 5 only
        cp.record(SnapshotId(3), 30);
        cp.record(SnapshotId(5), 50);
        assert_eq!(cp.value_at(SnapshotId(1)), Some(30));
        assert_eq!(cp.value_at(SnapshotId(3)), Some(30));
        assert_eq!(cp.value_at(SnapshotId(4)), Some(50));
        assert_eq!(cp.value_at(SnapshotId(6)), None);
    }

    #[test]
    fn test_balance_at_falls_back_to_live_value() {
        let mut ledger = SnapshotLedger::new();
        let alice = AccountId::from_label("alice");
        let id = ledger.take();
        assert_eq!(ledger.balance_at(&alice, id, 7).unwrap(), 7);

        ledger.before_balance_change(&alice, 7);
        assert_eq!(ledger.balance_at(&alice, id, 100).unwrap(), 7);
    }

    #[test]
    fn test_unknown_snapshot_ids_rejected() {
        let mut ledger = SnapshotLedger::new();
        assert_eq!(ledger.supply_at(SnapshotId(0), 0), Err(TokenError::ZeroSnapshotId));
        assert_eq!(
            ledger.supply_at(SnapshotId(1), 0),
            Err(TokenError::SnapshotNotFound { id: SnapshotId(1) })
        );
        let id = ledger.take();
        assert_eq!(ledger.supply_at(id, 42).unwrap(), 42);
    }
}
