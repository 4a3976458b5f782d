//! Shared security primitives for contract modules
//!
//! Provides the reentrancy guard, capability-based access control and pause
//! switch used by the campaign and ownership token contracts.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use offering_types::ids::AccountId;

/// Reentrancy guard preventing nested calls into protected functions.
///
/// One guard exists per contract instance. A mutating entry point calls
/// [`ReentrancyGuard::enter`] first and holds the returned [`GuardScope`] for
/// the rest of the call; the lock is released when the scope drops, on the
/// success path and on every early error return alike. Any nested entry into
/// the same or a sibling guarded operation fails while the scope is alive.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    locked: Cell<bool>,
}

impl ReentrancyGuard {
    /// Create a new unlocked guard.
    pub fn new() -> Self {
        Self {
            locked: Cell::new(false),
        }
    }

    /// Acquire the guard. Returns `None` if already held (reentrancy attempt).
    pub fn enter(&self) -> Option<GuardScope<'_>> {
        if self.locked.replace(true) {
            return None;
        }
        Some(GuardScope { guard: self })
    }

    /// Check if currently locked.
    pub fn is_locked(&self) -> bool {
        self.locked.get()
    }
}

/// Request-scoped lock returned by [`ReentrancyGuard::enter`].
#[derive(Debug)]
pub struct GuardScope<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardScope<'_> {
    fn drop(&mut self) {
        self.guard.locked.set(false);
    }
}

/// Privileged capabilities an account can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    /// Parameter changes, pausing, finalization and capability management
    Admin,
    /// Token issuance
    Minter,
    /// Taking balance snapshots
    Snapshot,
    /// Creating dividend distributions
    Distributor,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Authorization table: account -> granted capability set.
///
/// Queried at call entry before any state mutation.
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    grants: HashMap<AccountId, BTreeSet<Capability>>,
}

impl AccessControl {
    /// Create access control with an initial admin.
    pub fn new(admin: AccountId) -> Self {
        let mut ac = Self::default();
        ac.grant(admin, Capability::Admin);
        ac
    }

    /// Check if an account holds the specified capability.
    pub fn has(&self, account: &AccountId, capability: Capability) -> bool {
        self.grants
            .get(account)
            .map_or(false, |caps| caps.contains(&capability))
    }

    /// Grant a capability. Returns `false` if it was already held.
    pub fn grant(&mut self, account: AccountId, capability: Capability) -> bool {
        self.grants.entry(account).or_default().insert(capability)
    }

    /// Revoke a capability. Returns `false` if it was not held.
    pub fn revoke(&mut self, account: &AccountId, capability: Capability) -> bool {
        let Some(caps) = self.grants.get_mut(account) else {
            return false;
        };
        let removed = caps.remove(&capability);
        if caps.is_empty() {
            self.grants.remove(account);
        }
        removed
    }
}

/// Composable pause modifier.
///
/// When paused, protected operations must be rejected.
#[derive(Debug, Clone, Default)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    /// Create a new unpaused guard.
    pub fn new() -> Self {
        Self { paused: false }
    }

    /// Pause operations.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Unpause operations.
    pub fn unpause(&mut self) {
        self.paused = false;
    }

    /// Check if currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- ReentrancyGuard tests ---

    #[test]
    fn test_reentrancy_guard_enter_release() {
        let guard = ReentrancyGuard::new();
        assert!(!guard.is_locked());
        {
            let _scope = guard.enter().unwrap();
            assert!(guard.is_locked());
        }
        assert!(!guard.is_locked());
    }

    #[test]
    fn test_reentrancy_guard_nested_enter_fails() {
        let guard = ReentrancyGuard::new();
        let _scope = guard.enter().unwrap();
        assert!(guard.enter().is_none(), "Second enter must fail");
    }

    #[test]
    fn test_reentrancy_guard_released_on_error_path() {
        fn guarded(guard: &ReentrancyGuard, fail: bool) -> Result<(), &'static str> {
            let _scope = guard.enter().ok_or("reentrancy")?;
            if fail {
                return Err("boom");
            }
            Ok(())
        }

        let guard = ReentrancyGuard::new();
        assert_eq!(guarded(&guard, true), Err("boom"));
        assert!(!guard.is_locked());
        assert_eq!(guarded(&guard, false), Ok(()));
    }

    // --- AccessControl tests ---

    #[test]
    fn test_access_control_admin() {
        let alice = AccountId::from_label("alice");
        let ac = AccessControl::new(alice);
        assert!(ac.has(&alice, Capability::Admin));
        assert!(!ac.has(&AccountId::from_label("bob"), Capability::Admin));
    }

    #[test]
    fn test_access_control_grant_is_additive() {
        let bob = AccountId::from_label("bob");
        let mut ac = AccessControl::default();
        assert!(ac.grant(bob, Capability::Minter));
        assert!(ac.grant(bob, Capability::Snapshot));
        assert!(!ac.grant(bob, Capability::Minter));
        assert!(ac.has(&bob, Capability::Minter));
        assert!(ac.has(&bob, Capability::Snapshot));
        assert!(!ac.has(&bob, Capability::Admin));
    }

    #[test]
    fn test_access_control_revoke() {
        let bob = AccountId::from_label("bob");
        let mut ac = AccessControl::default();
        ac.grant(bob, Capability::Minter);
        assert!(ac.revoke(&bob, Capability::Minter));
        assert!(!ac.has(&bob, Capability::Minter));
        assert!(!ac.revoke(&bob, Capability::Minter));
        assert!(ac.grants.is_empty());
    }

    // --- PauseGuard tests ---

    #[test]
    fn test_pause_guard() {
        let mut pg = PauseGuard::new();
        assert!(!pg.is_paused());
        pg.pause();
        assert!(pg.is_paused());
        pg.unpause();
        assert!(!pg.is_paused());
    }
}
