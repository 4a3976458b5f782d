//! Ownership Token: compliance-gated balances with snapshots
//!
//! Tokens represent fractional ownership of the property. Every balance
//! change (mint, burn, transfer) goes through [`OwnershipToken::move_balance`],
//! the single point where compliance is enforced: each non-zero party must be
//! approved in the token's compliance class at the moment of the change, not
//! only when the tokens were first issued.
//!
//! The dividend engine shares this contract's balance history and is
//! implemented in [`crate::dividend`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, warn};

use offering_types::ids::{AccountId, ClassId, SnapshotId};
use offering_types::numeric::{self, Amount, TOKEN_DECIMALS};

use crate::compliance::ComplianceRegistry;
use crate::context::CallContext;
use crate::dividend::DividendDistribution;
use crate::errors::{ConfigError, TokenError};
use crate::events::{Approval, CapabilityChanged, ContractEvent, SnapshotTaken, Transfer};
use crate::ledger::AssetLedger;
use crate::security::{AccessControl, Capability, GuardScope, ReentrancyGuard};
use crate::snapshot::SnapshotLedger;

/// Mutable contract storage.
#[derive(Debug, Default)]
pub(crate) struct TokenState {
    pub(crate) balances: HashMap<AccountId, Amount>,
    pub(crate) allowances: HashMap<(AccountId, AccountId), Amount>,
    pub(crate) total_supply: Amount,
    pub(crate) snapshots: SnapshotLedger,
    pub(crate) access: AccessControl,
    /// Distribution arena, indexed by `DistributionId`
    pub(crate) distributions: Vec<DividendDistribution>,
}

impl TokenState {
    pub(crate) fn balance(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

pub struct OwnershipToken {
    address: AccountId,
    name: String,
    symbol: String,
    compliance_class: ClassId,
    registry: Rc<dyn ComplianceRegistry>,
    pub(crate) ledger: Rc<dyn AssetLedger>,
    pub(crate) state: RefCell<TokenState>,
    guard: ReentrancyGuard,
    events: RefCell<Vec<ContractEvent>>,
}

impl fmt::Debug for OwnershipToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnershipToken")
            .field("address", &self.address)
            .field("symbol", &self.symbol)
            .field("compliance_class", &self.compliance_class)
            .field("state", &self.state)
            .finish()
    }
}

impl OwnershipToken {
    /// Deploy a token at `address`. `admin` receives the Admin, Snapshot and
    /// Distributor capabilities.
    pub fn new(
        address: AccountId,
        admin: AccountId,
        name: impl Into<String>,
        symbol: impl Into<String>,
        compliance_class: ClassId,
        registry: Rc<dyn ComplianceRegistry>,
        ledger: Rc<dyn AssetLedger>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let symbol = symbol.into();
        if name.trim().is_empty() || symbol.trim().is_empty() {
            return Err(ConfigError::EmptyTokenMetadata);
        }
        if !registry.class_exists(compliance_class) {
            return Err(ConfigError::UnknownClass {
                class: compliance_class,
            });
        }

        let mut access = AccessControl::new(admin);
        access.grant(admin, Capability::Snapshot);
        access.grant(admin, Capability::Distributor);

        info!(token = %address, %symbol, class = %compliance_class, "Ownership token deployed");
        Ok(Self {
            address,
            name,
            symbol,
            compliance_class,
            registry,
            ledger,
            state: RefCell::new(TokenState {
                access,
                ..TokenState::default()
            }),
            guard: ReentrancyGuard::new(),
            events: RefCell::new(Vec::new()),
        })
    }

    /// Grant the Minter capability at construction time.
    pub fn with_minter(self, minter: AccountId) -> Self {
        self.state.borrow_mut().access.grant(minter, Capability::Minter);
        self
    }

    // ───────────────────────── Metadata ─────────────────────────

    pub fn address(&self) -> AccountId {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u32 {
        TOKEN_DECIMALS
    }

    pub fn compliance_class(&self) -> ClassId {
        self.compliance_class
    }

    // ───────────────────────── Balances ─────────────────────────

    pub fn total_supply(&self) -> Amount {
        self.state.borrow().total_supply
    }

    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.state.borrow().balance(account)
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.state
            .borrow()
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Issue `amount` new tokens to `to`. Minter-only.
    pub fn mint(&self, ctx: &CallContext, to: &AccountId, amount: Amount) -> Result<(), TokenError> {
        let _scope = self.enter(ctx)?;
        self.require(ctx, Capability::Minter)?;
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }
        if to.is_zero() {
            return Err(TokenError::ZeroAccount);
        }
        self.move_balance(&AccountId::ZERO, to, amount)
    }

    /// Destroy `amount` of the caller's own tokens.
    pub fn burn(&self, ctx: &CallContext, amount: Amount) -> Result<(), TokenError> {
        let _scope = self.enter(ctx)?;
        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }
        self.move_balance(&ctx.caller, &AccountId::ZERO, amount)
    }

    pub fn transfer(&self, ctx: &CallContext, to: &AccountId, amount: Amount) -> Result<(), TokenError> {
        let _scope = self.enter(ctx)?;
        if to.is_zero() {
            return Err(TokenError::ZeroAccount);
        }
        self.move_balance(&ctx.caller, to, amount)
    }

    pub fn approve(&self, ctx: &CallContext, spender: &AccountId, amount: Amount) -> Result<(), TokenError> {
        let _scope = self.enter(ctx)?;
        if spender.is_zero() {
            return Err(TokenError::ZeroAccount);
        }
        self.state
            .borrow_mut()
            .allowances
            .insert((ctx.caller, *spender), amount);
        self.emit(ContractEvent::Approval(Approval {
            owner: ctx.caller,
            spender: *spender,
            amount,
        }));
        Ok(())
    }

    /// Move `from`'s tokens under the caller's allowance.
    pub fn transfer_from(
        &self,
        ctx: &CallContext,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let _scope = self.enter(ctx)?;
        if to.is_zero() {
            return Err(TokenError::ZeroAccount);
        }
        let approved = self.allowance(from, &ctx.caller);
        if approved < amount {
            return Err(TokenError::InsufficientAllowance {
                required: amount,
                approved,
            });
        }
        self.move_balance(from, to, amount)?;
        self.state
            .borrow_mut()
            .allowances
            .insert((*from, ctx.caller), approved - amount);
        Ok(())
    }

    /// The one path through which balances change.
    fn move_balance(&self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<(), TokenError> {
        for party in [from, to] {
            if !party.is_zero() {
                self.registry.require_approved(self.compliance_class, party)?;
            }
        }

        {
            let mut state = self.state.borrow_mut();
            let state = &mut *state;

            // Validate everything before the first write.
            let from_balance = state.balance(from);
            let to_balance = state.balance(to);
            let mut supply = state.total_supply;
            if from.is_zero() {
                supply = numeric::add(supply, amount)?;
            } else if from_balance < amount {
                return Err(TokenError::InsufficientBalance {
                    required: amount,
                    available: from_balance,
                });
            }
            if to.is_zero() {
                supply = numeric::sub(supply, amount)?;
            } else if from != to {
                numeric::add(to_balance, amount)?;
            }

            if from.is_zero() || to.is_zero() {
                state.snapshots.before_supply_change(state.total_supply);
                state.total_supply = supply;
            }
            if !from.is_zero() {
                state.snapshots.before_balance_change(from, from_balance);
                state.balances.insert(*from, from_balance - amount);
            }
            if !to.is_zero() {
                let current = state.balance(to);
                state.snapshots.before_balance_change(to, current);
                state.balances.insert(*to, current + amount);
            }
        }

        debug!(token = %self.address, from = %from, to = %to, amount, "Token balance moved");
        self.emit(ContractEvent::Transfer(Transfer {
            from: *from,
            to: *to,
            amount,
        }));
        Ok(())
    }

    // ───────────────────────── Snapshots ─────────────────────────

    /// Freeze all balances and the total supply. Snapshot-capability only.
    pub fn snapshot(&self, ctx: &CallContext) -> Result<SnapshotId, TokenError> {
        let _scope = self.enter(ctx)?;
        self.require(ctx, Capability::Snapshot)?;
        Ok(self.take_snapshot())
    }

    pub(crate) fn take_snapshot(&self) -> SnapshotId {
        let (id, total_supply) = {
            let mut state = self.state.borrow_mut();
            (state.snapshots.take(), state.total_supply)
        };
        debug!(
            token = %self.address,
            snapshot = %id,
            total_supply = %numeric::to_units(total_supply, TOKEN_DECIMALS).unwrap_or_default(),
            "Snapshot taken"
        );
        self.emit(ContractEvent::SnapshotTaken(SnapshotTaken { id, total_supply }));
        id
    }

    pub fn current_snapshot_id(&self) -> SnapshotId {
        self.state.borrow().snapshots.current()
    }

    /// Balance of `account` when snapshot `id` was taken.
    pub fn balance_of_at(&self, account: &AccountId, id: SnapshotId) -> Result<Amount, TokenError> {
        let state = self.state.borrow();
        state.snapshots.balance_at(account, id, state.balance(account))
    }

    /// Total supply when snapshot `id` was taken.
    pub fn total_supply_at(&self, id: SnapshotId) -> Result<Amount, TokenError> {
        let state = self.state.borrow();
        state.snapshots.supply_at(id, state.total_supply)
    }

    // ───────────────────────── Access Control ─────────────────────────

    pub fn has_capability(&self, account: &AccountId, capability: Capability) -> bool {
        self.state.borrow().access.has(account, capability)
    }

    pub fn grant_capability(
        &self,
        ctx: &CallContext,
        account: &AccountId,
        capability: Capability,
    ) -> Result<(), TokenError> {
        let _scope = self.enter(ctx)?;
        self.require(ctx, Capability::Admin)?;
        if self.state.borrow_mut().access.grant(*account, capability) {
            self.emit(ContractEvent::CapabilityChanged(CapabilityChanged {
                account: *account,
                capability,
                granted: true,
                by: ctx.caller,
            }));
        }
        Ok(())
    }

    pub fn revoke_capability(
        &self,
        ctx: &CallContext,
        account: &AccountId,
        capability: Capability,
    ) -> Result<(), TokenError> {
        let _scope = self.enter(ctx)?;
        self.require(ctx, Capability::Admin)?;
        if self.state.borrow_mut().access.revoke(account, capability) {
            self.emit(ContractEvent::CapabilityChanged(CapabilityChanged {
                account: *account,
                capability,
                granted: false,
                by: ctx.caller,
            }));
        }
        Ok(())
    }

    /// Acquire the contract-wide reentrancy guard for one call.
    pub(crate) fn enter(&self, ctx: &CallContext) -> Result<GuardScope<'_>, TokenError> {
        self.guard.enter().ok_or_else(|| {
            warn!(token = %self.address, caller = %ctx.caller, "Reentrant token call rejected");
            TokenError::Reentrancy
        })
    }

    pub(crate) fn require(&self, ctx: &CallContext, capability: Capability) -> Result<(), TokenError> {
        if self.state.borrow().access.has(&ctx.caller, capability) {
            Ok(())
        } else {
            Err(TokenError::Unauthorized {
                capability: capability.to_string(),
            })
        }
    }

    pub(crate) fn registry(&self) -> &dyn ComplianceRegistry {
        self.registry.as_ref()
    }

    // ───────────────────────── Events ─────────────────────────

    pub(crate) fn emit(&self, event: ContractEvent) {
        self.events.borrow_mut().push(event);
    }

    /// Get all emitted events.
    pub fn events(&self) -> Vec<ContractEvent> {
        self.events.borrow().clone()
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&self) -> Vec<ContractEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}
