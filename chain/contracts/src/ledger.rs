//! External asset ledger
//!
//! Payment assets and non-native dividend assets live on an external ledger
//! with standard pull (`transfer_from`) and push (`transfer`) semantics. Any
//! failure reported here is fatal to the enclosing contract operation.
//!
//! [`InMemoryLedger`] is the host-side implementation used for local
//! deployments and tests. It supports failure injection and recipient hooks
//! that run after value arrives, which is how a recipient re-enters a
//! contract in the middle of a payout.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use offering_types::asset::AssetRef;
use offering_types::ids::AccountId;
use offering_types::numeric::Amount;

use crate::errors::AssetError;

/// Pull/push value transfer on an external ledger.
pub trait AssetLedger {
    /// Balance of `account` in `asset`.
    fn balance_of(&self, asset: &AssetRef, account: &AccountId) -> Amount;

    /// Move `amount` from `from` to `to`, spent by `operator` under an
    /// allowance `from` granted earlier.
    fn transfer_from(
        &self,
        asset: &AssetRef,
        operator: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), AssetError>;

    /// Move `amount` held by `from` (the calling contract) to `to`.
    fn transfer(
        &self,
        asset: &AssetRef,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), AssetError>;
}

/// A completed value movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub asset: AssetRef,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

/// Callback run after every successful transfer.
pub type TransferHook = Rc<dyn Fn(&TransferRecord)>;

#[derive(Default)]
pub struct InMemoryLedger {
    balances: RefCell<HashMap<(AssetRef, AccountId), Amount>>,
    allowances: RefCell<HashMap<(AssetRef, AccountId, AccountId), Amount>>,
    rejected_recipients: RefCell<HashSet<AccountId>>,
    halted: Cell<bool>,
    hook: RefCell<Option<TransferHook>>,
    history: RefCell<Vec<TransferRecord>>,
}

impl fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("accounts", &self.balances.borrow().len())
            .field("transfers", &self.history.borrow().len())
            .field("halted", &self.halted.get())
            .finish()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` out of thin air (faucet / attached native value).
    pub fn credit(&self, asset: &AssetRef, account: &AccountId, amount: Amount) {
        *self
            .balances
            .borrow_mut()
            .entry((*asset, *account))
            .or_insert(0) += amount;
    }

    /// Allow `spender` to pull up to `amount` of `owner`'s `asset`.
    pub fn approve(&self, asset: &AssetRef, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances
            .borrow_mut()
            .insert((*asset, *owner, *spender), amount);
    }

    pub fn allowance(&self, asset: &AssetRef, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .borrow()
            .get(&(*asset, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Make every transfer into `account` fail (e.g. a contract that reverts
    /// on receipt, or a frozen address).
    pub fn reject_recipient(&self, account: AccountId) {
        self.rejected_recipients.borrow_mut().insert(account);
    }

    pub fn accept_recipient(&self, account: &AccountId) {
        self.rejected_recipients.borrow_mut().remove(account);
    }

    /// Fail every transfer while halted.
    pub fn set_halted(&self, halted: bool) {
        self.halted.set(halted);
    }

    /// Install a callback run after each successful transfer.
    pub fn on_transfer(&self, hook: TransferHook) {
        *self.hook.borrow_mut() = Some(hook);
    }

    pub fn clear_hook(&self) {
        self.hook.borrow_mut().take();
    }

    /// All completed transfers, oldest first.
    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.history.borrow().clone()
    }

    fn move_funds(
        &self,
        asset: &AssetRef,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), AssetError> {
        if self.halted.get() {
            return Err(AssetError::Rejected {
                reason: "ledger halted".to_string(),
            });
        }
        if self.rejected_recipients.borrow().contains(to) {
            return Err(AssetError::Rejected {
                reason: format!("recipient {} refuses {}", to, asset),
            });
        }

        {
            let mut balances = self.balances.borrow_mut();
            let available = balances.get(&(*asset, *from)).copied().unwrap_or(0);
            if available < amount {
                return Err(AssetError::InsufficientBalance {
                    asset: asset.to_string(),
                    account: *from,
                    required: amount,
                    available,
                });
            }
            balances.insert((*asset, *from), available - amount);
            *balances.entry((*asset, *to)).or_insert(0) += amount;
        }

        let record = TransferRecord {
            asset: *asset,
            from: *from,
            to: *to,
            amount,
        };
        debug!(asset = %asset, from = %from, to = %to, amount, "Ledger transfer");
        self.history.borrow_mut().push(record.clone());

        // No ledger borrow is held here: the hook may call back into anything.
        let hook = self.hook.borrow().clone();
        if let Some(hook) = hook {
            hook(&record);
        }
        Ok(())
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, asset: &AssetRef, account: &AccountId) -> Amount {
        self.balances
            .borrow()
            .get(&(*asset, *account))
            .copied()
            .unwrap_or(0)
    }

    fn transfer_from(
        &self,
        asset: &AssetRef,
        operator: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), AssetError> {
        // Native value has no allowances; the host authorizes it per call.
        if asset.is_native() {
            return self.move_funds(asset, from, to, amount);
        }

        let approved = self.allowance(asset, from, operator);
        if approved < amount {
            return Err(AssetError::InsufficientAllowance {
                required: amount,
                approved,
            });
        }
        self.move_funds(asset, from, to, amount)?;
        self.allowances
            .borrow_mut()
            .insert((*asset, *from, *operator), approved - amount);
        Ok(())
    }

    fn transfer(
        &self,
        asset: &AssetRef,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), AssetError> {
        self.move_funds(asset, from, to, amount)
    }
}
