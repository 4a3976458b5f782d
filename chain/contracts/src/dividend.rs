//! Dividend Engine
//!
//! Distributions pay out value in proportion to balances frozen by a snapshot
//! taken when the distribution is created. The per-token rate is fixed at
//! creation (`total_amount * SCALE / supply_at_snapshot`) and never
//! recomputed; tokens minted after the snapshot do not participate.
//!
//! Each distribution owns its claimed-account set, and distributions are kept
//! in an arena indexed by [`DistributionId`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use offering_types::asset::AssetRef;
use offering_types::errors::NumericError;
use offering_types::ids::{AccountId, DistributionId, SnapshotId};
use offering_types::numeric::{self, Amount, Timestamp, SCALE};

use crate::context::CallContext;
use crate::errors::TokenError;
use crate::events::{ContractEvent, DistributionCreated, DividendClaimed};
use crate::security::Capability;
use crate::token::OwnershipToken;

/// One payout event computed from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendDistribution {
    pub id: DistributionId,
    pub snapshot: SnapshotId,
    pub asset: AssetRef,
    pub total_amount: Amount,
    /// Payout per whole token, scaled by `SCALE`
    pub per_token_rate: Amount,
    pub claimed_amount: Amount,
    pub funder: AccountId,
    pub created_at: Timestamp,
    claimed: HashSet<AccountId>,
}

impl DividendDistribution {
    pub fn has_claimed(&self, account: &AccountId) -> bool {
        self.claimed.contains(account)
    }

    /// Value not yet paid out (unclaimed shares plus rounding dust).
    pub fn remaining(&self) -> Amount {
        self.total_amount.saturating_sub(self.claimed_amount)
    }

    /// Payout owed for a snapshot balance, truncated toward the pool.
    pub fn payout_for(&self, balance: Amount) -> Result<Amount, NumericError> {
        numeric::mul_div(balance, self.per_token_rate, SCALE)
    }
}

impl OwnershipToken {
    /// Fund a new distribution of `amount` in `asset` against a fresh snapshot.
    ///
    /// Native distributions must carry exactly `amount` as attached value.
    /// Token distributions pull `amount` from the caller and must not carry
    /// native value. Distributor-only.
    pub fn create_dividend_distribution(
        &self,
        ctx: &CallContext,
        amount: Amount,
        asset: AssetRef,
    ) -> Result<DistributionId, TokenError> {
        let _scope = self.enter(ctx)?;
        self.require(ctx, Capability::Distributor)?;

        if amount == 0 {
            return Err(TokenError::InvalidAmount);
        }
        match asset {
            AssetRef::Native if ctx.value != amount => {
                return Err(TokenError::AttachedValueMismatch {
                    expected: amount,
                    attached: ctx.value,
                });
            }
            AssetRef::Token(_) if ctx.value != 0 => return Err(TokenError::UnexpectedAttachedValue),
            _ => {}
        }
        // The live supply is the supply the new snapshot records.
        let supply = self.total_supply();
        if supply == 0 {
            return Err(TokenError::EmptySupply);
        }
        let per_token_rate = numeric::mul_div(amount, SCALE, supply)?;

        // Taken before any value moves, so nothing a payer callback does can
        // change who participates.
        let snapshot = self.take_snapshot();

        if let AssetRef::Token(_) = asset {
            let address = self.address();
            if let Err(err) = self
                .ledger
                .transfer_from(&asset, &address, &ctx.caller, &address, amount)
            {
                warn!(token = %address, funder = %ctx.caller, %asset, amount, error = %err,
                    "Distribution funding failed; snapshot {} carries no distribution", snapshot);
                return Err(err.into());
            }
        }

        let id = {
            let mut state = self.state.borrow_mut();
            let id = DistributionId(state.distributions.len() as u64);
            state.distributions.push(DividendDistribution {
                id,
                snapshot,
                asset,
                total_amount: amount,
                per_token_rate,
                claimed_amount: 0,
                funder: ctx.caller,
                created_at: ctx.timestamp,
                claimed: HashSet::new(),
            });
            id
        };

        info!(token = %self.address(), distribution = %id, %snapshot, %asset, amount, per_token_rate,
            "Dividend distribution created");
        self.emit(ContractEvent::DistributionCreated(DistributionCreated {
            id,
            snapshot,
            asset,
            total_amount: amount,
            per_token_rate,
            funder: ctx.caller,
        }));
        Ok(id)
    }

    /// Pay the caller its share of distribution `id`. One claim per account.
    pub fn claim_dividend(&self, ctx: &CallContext, id: DistributionId) -> Result<Amount, TokenError> {
        let _scope = self.enter(ctx)?;
        self.registry()
            .require_approved(self.compliance_class(), &ctx.caller)?;

        let (asset, payout) = {
            let mut state = self.state.borrow_mut();
            let live_balance = state.balance(&ctx.caller);
            let (snapshot, already_claimed) = {
                let distribution = state
                    .distributions
                    .get(id.0 as usize)
                    .ok_or(TokenError::DistributionNotFound { id })?;
                (distribution.snapshot, distribution.has_claimed(&ctx.caller))
            };
            if already_claimed {
                return Err(TokenError::AlreadyClaimed { id });
            }
            let balance = state.snapshots.balance_at(&ctx.caller, snapshot, live_balance)?;
            if balance == 0 {
                return Err(TokenError::NoBalanceAtSnapshot { snapshot });
            }

            let distribution = &mut state.distributions[id.0 as usize];
            let payout = distribution.payout_for(balance)?;
            if payout == 0 {
                return Err(TokenError::ZeroPayout);
            }
            let claimed_amount = numeric::add(distribution.claimed_amount, payout)?;
            if claimed_amount > distribution.total_amount {
                return Err(TokenError::DistributionExhausted { id });
            }

            // Final bookkeeping before value leaves the contract.
            distribution.claimed.insert(ctx.caller);
            distribution.claimed_amount = claimed_amount;
            (distribution.asset, payout)
        };

        let address = self.address();
        if let Err(err) = self.ledger.transfer(&asset, &address, &ctx.caller, payout) {
            let mut state = self.state.borrow_mut();
            let distribution = &mut state.distributions[id.0 as usize];
            distribution.claimed.remove(&ctx.caller);
            distribution.claimed_amount -= payout;
            warn!(token = %address, account = %ctx.caller, distribution = %id, payout, error = %err,
                "Dividend payout failed; claim rolled back");
            return Err(err.into());
        }

        info!(token = %address, account = %ctx.caller, distribution = %id, payout, "Dividend claimed");
        self.emit(ContractEvent::DividendClaimed(DividendClaimed {
            id,
            account: ctx.caller,
            amount: payout,
        }));
        Ok(payout)
    }

    pub fn distribution(&self, id: DistributionId) -> Option<DividendDistribution> {
        self.state.borrow().distributions.get(id.0 as usize).cloned()
    }

    pub fn distribution_count(&self) -> u64 {
        self.state.borrow().distributions.len() as u64
    }

    pub fn has_claimed(&self, id: DistributionId, account: &AccountId) -> bool {
        self.state
            .borrow()
            .distributions
            .get(id.0 as usize)
            .map_or(false, |d| d.has_claimed(account))
    }

    /// What `account` would receive from distribution `id` right now
    /// (0 once claimed or without a snapshot balance).
    pub fn claimable_dividend(&self, id: DistributionId, account: &AccountId) -> Result<Amount, TokenError> {
        let state = self.state.borrow();
        let distribution = state
            .distributions
            .get(id.0 as usize)
            .ok_or(TokenError::DistributionNotFound { id })?;
        if distribution.has_claimed(account) {
            return Ok(0);
        }
        let balance = state
            .snapshots
            .balance_at(account, distribution.snapshot, state.balance(account))?;
        Ok(distribution.payout_for(balance)?)
    }
}
