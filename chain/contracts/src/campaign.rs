//! Fundraising Campaign: investment intake, finalization, claims and refunds
//!
//! Lifecycle:
//! `pending → active (whitelisted → open) → ended → finalized (successful | failed)`
//!
//! - Intake: compliance-checked, whitelist-gated during the first window,
//!   bounded per investor and by the hard cap
//! - Finalize: one-shot; success iff the soft cap was reached; on success the
//!   whole custody balance goes to the beneficiary
//! - Claims: after success each investor mints ownership tokens once; after
//!   failure each investor is refunded once
//!
//! Operations that move value update bookkeeping to its final value first and
//! transfer last, restoring the previous values if the transfer fails. Every
//! mutating entry point holds the contract's reentrancy guard.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use offering_types::asset::AssetRef;
use offering_types::ids::{AccountId, ClassId};
use offering_types::numeric::{self, Amount, Timestamp, SCALE, TOKEN_DECIMALS};

use crate::compliance::ComplianceRegistry;
use crate::config::{CampaignConfig, Schedule};
use crate::context::CallContext;
use crate::errors::CampaignError;
use crate::events::{
    BeneficiaryUpdated, CapabilityChanged, ContractEvent, Finalized, Invested, PauseChanged,
    PaymentAssetUpdated, Refunded, TokensClaimed, WhitelistUpdated,
};
use crate::ledger::AssetLedger;
use crate::security::{AccessControl, Capability, GuardScope, PauseGuard, ReentrancyGuard};
use crate::token::OwnershipToken;

/// Salt under which a campaign derives its ownership token's address.
pub const TOKEN_SALT: &str = "ownership-token";

/// Lifecycle state, derived from ledger time and the finalize action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignState {
    /// Before `start`
    Pending,
    /// `start ..= whitelist_end`: whitelisted accounts only
    ActiveWhitelisted,
    /// `whitelist_end < now <= end`: any approved account
    ActiveOpen,
    /// Past `end`, awaiting finalization
    Ended,
    FinalizedSuccessful,
    FinalizedFailed,
}

/// Caps and bounds fixed at deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub min_investment: Amount,
    pub max_investment: Amount,
    pub soft_cap: Amount,
    pub hard_cap: Amount,
    pub token_price: Amount,
}

#[derive(Debug)]
struct CampaignStorage {
    investments: HashMap<AccountId, Amount>,
    whitelist: HashSet<AccountId>,
    total_raised: Amount,
    finalized: bool,
    successful: bool,
    payment_asset: AssetRef,
    beneficiary: AccountId,
    pause_guard: PauseGuard,
    access_control: AccessControl,
}

impl CampaignStorage {
    fn investment(&self, investor: &AccountId) -> Amount {
        self.investments.get(investor).copied().unwrap_or(0)
    }

    /// Zero an investor's record, returning what it held.
    fn take_investment(&mut self, investor: &AccountId) -> Amount {
        self.investments.remove(investor).unwrap_or(0)
    }

    fn restore_investment(&mut self, investor: &AccountId, amount: Amount) {
        self.investments.insert(*investor, amount);
    }
}

pub struct Campaign {
    address: AccountId,
    compliance_class: ClassId,
    schedule: Schedule,
    limits: Limits,
    registry: Rc<dyn ComplianceRegistry>,
    ledger: Rc<dyn AssetLedger>,
    token: Rc<OwnershipToken>,
    state: RefCell<CampaignStorage>,
    guard: ReentrancyGuard,
    events: RefCell<Vec<ContractEvent>>,
}

impl fmt::Debug for Campaign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Campaign")
            .field("address", &self.address)
            .field("schedule", &self.schedule)
            .field("limits", &self.limits)
            .field("state", &self.state)
            .finish()
    }
}

impl Campaign {
    /// Deploy a campaign at `address` together with its ownership token.
    ///
    /// The deployer becomes Admin of both contracts; the campaign itself is
    /// the token's only Minter.
    pub fn deploy(
        ctx: &CallContext,
        address: AccountId,
        config: CampaignConfig,
        registry: Rc<dyn ComplianceRegistry>,
        ledger: Rc<dyn AssetLedger>,
    ) -> Result<Self, CampaignError> {
        config.validate(ctx.timestamp, registry.as_ref())?;

        let token = OwnershipToken::new(
            AccountId::derive(&address, TOKEN_SALT),
            ctx.caller,
            config.token_name.clone(),
            config.token_symbol.clone(),
            config.compliance_class,
            Rc::clone(&registry),
            Rc::clone(&ledger),
        )?
        .with_minter(address);

        let schedule = config.schedule();
        let limits = Limits {
            min_investment: config.min_investment,
            max_investment: config.max_investment,
            soft_cap: config.soft_cap,
            hard_cap: config.hard_cap,
            token_price: config.token_price,
        };

        info!(
            campaign = %address,
            token = %token.address(),
            admin = %ctx.caller,
            start = schedule.start,
            whitelist_end = schedule.whitelist_end,
            end = schedule.end,
            soft_cap = limits.soft_cap,
            hard_cap = limits.hard_cap,
            "Campaign deployed"
        );

        Ok(Self {
            address,
            compliance_class: config.compliance_class,
            schedule,
            limits,
            registry,
            ledger,
            token: Rc::new(token),
            state: RefCell::new(CampaignStorage {
                investments: HashMap::new(),
                whitelist: HashSet::new(),
                total_raised: 0,
                finalized: false,
                successful: false,
                payment_asset: config.payment_asset,
                beneficiary: config.beneficiary,
                pause_guard: PauseGuard::new(),
                access_control: AccessControl::new(ctx.caller),
            }),
            guard: ReentrancyGuard::new(),
            events: RefCell::new(Vec::new()),
        })
    }

    // ───────────────────────── Investment ─────────────────────────

    /// Invest `amount` of the payment asset.
    ///
    /// Checks, in order: not paused, inside `[start, end]`, not finalized,
    /// caller approved, caller whitelisted while the whitelist window is
    /// open, cumulative investment within `[min, max]`, hard cap respected,
    /// attached value consistent with the payment asset.
    ///
    /// Native payments arrive as the call's attached value, which must equal
    /// `amount`. Token payments carry no native value and are pulled from the
    /// caller under its allowance.
    pub fn invest(&self, ctx: &CallContext, amount: Amount) -> Result<(), CampaignError> {
        let _scope = self.enter(ctx)?;
        let investor = ctx.caller;
        let now = ctx.timestamp;

        let (asset, total_invested, total_raised) = {
            let mut state = self.state.borrow_mut();
            if state.pause_guard.is_paused() {
                return Err(CampaignError::Paused);
            }
            if now < self.schedule.start || now > self.schedule.end {
                return Err(CampaignError::OutsideWindow {
                    start: self.schedule.start,
                    end: self.schedule.end,
                    now,
                });
            }
            if state.finalized {
                return Err(CampaignError::AlreadyFinalized);
            }
            self.registry
                .require_approved(self.compliance_class, &investor)?;
            if now <= self.schedule.whitelist_end && !state.whitelist.contains(&investor) {
                return Err(CampaignError::NotWhitelisted { account: investor });
            }
            if amount == 0 {
                return Err(CampaignError::InvalidAmount);
            }

            let previous = state.investment(&investor);
            let total_invested = numeric::add(previous, amount)?;
            if total_invested < self.limits.min_investment {
                return Err(CampaignError::BelowMinimum {
                    total: total_invested,
                    minimum: self.limits.min_investment,
                });
            }
            if total_invested > self.limits.max_investment {
                return Err(CampaignError::AboveMaximum {
                    total: total_invested,
                    maximum: self.limits.max_investment,
                });
            }
            let total_raised = numeric::add(state.total_raised, amount)?;
            if total_raised > self.limits.hard_cap {
                return Err(CampaignError::HardCapExceeded {
                    total: total_raised,
                    hard_cap: self.limits.hard_cap,
                });
            }
            match state.payment_asset {
                AssetRef::Native if ctx.value != amount => {
                    return Err(CampaignError::AttachedValueMismatch {
                        expected: amount,
                        attached: ctx.value,
                    });
                }
                AssetRef::Token(_) if ctx.value != 0 => {
                    return Err(CampaignError::UnexpectedAttachedValue)
                }
                _ => {}
            }

            state.investments.insert(investor, total_invested);
            state.total_raised = total_raised;
            (state.payment_asset, total_invested, total_raised)
        };

        // Attached native value is already in custody.
        let pulled = if asset.is_native() {
            Ok(())
        } else {
            self.ledger
                .transfer_from(&asset, &self.address, &investor, &self.address, amount)
        };
        if let Err(err) = pulled {
            let mut state = self.state.borrow_mut();
            state.total_raised -= amount;
            let previous = total_invested - amount;
            if previous == 0 {
                state.investments.remove(&investor);
            } else {
                state.restore_investment(&investor, previous);
            }
            warn!(campaign = %self.address, investor = %investor, amount, error = %err,
                "Payment pull failed; investment rolled back");
            return Err(err.into());
        }

        info!(campaign = %self.address, investor = %investor, amount, total_invested, total_raised,
            "Investment accepted");
        self.emit(ContractEvent::Invested(Invested {
            investor,
            amount,
            total_invested,
            total_raised,
        }));
        Ok(())
    }

    // ───────────────────────── Finalization ─────────────────────────

    /// Fix the outcome. Allowed once the campaign has ended or the hard cap
    /// is reached. Admin-only.
    pub fn finalize(&self, ctx: &CallContext) -> Result<bool, CampaignError> {
        let _scope = self.enter(ctx)?;
        self.require(ctx, Capability::Admin)?;

        let (successful, total_raised, asset, beneficiary) = {
            let mut state = self.state.borrow_mut();
            if state.finalized {
                return Err(CampaignError::AlreadyFinalized);
            }
            if ctx.timestamp <= self.schedule.end && state.total_raised < self.limits.hard_cap {
                return Err(CampaignError::FinalizeTooEarly {
                    end: self.schedule.end,
                });
            }
            let successful = state.total_raised >= self.limits.soft_cap;
            state.finalized = true;
            state.successful = successful;
            (successful, state.total_raised, state.payment_asset, state.beneficiary)
        };

        let mut swept = 0;
        if successful {
            swept = self.ledger.balance_of(&asset, &self.address);
            if swept > 0 {
                if let Err(err) = self
                    .ledger
                    .transfer(&asset, &self.address, &beneficiary, swept)
                {
                    let mut state = self.state.borrow_mut();
                    state.finalized = false;
                    state.successful = false;
                    warn!(campaign = %self.address, beneficiary = %beneficiary, swept, error = %err,
                        "Custody sweep failed; finalize rolled back");
                    return Err(err.into());
                }
            }
        }

        info!(campaign = %self.address, successful, total_raised, swept, "Campaign finalized");
        self.emit(ContractEvent::Finalized(Finalized {
            successful,
            total_raised,
            beneficiary,
            swept,
            finalized_at: ctx.timestamp,
        }));
        Ok(successful)
    }

    /// Mint the caller's ownership tokens after a successful campaign.
    ///
    /// Returns the number of tokens minted:
    /// `investment * SCALE / token_price`.
    pub fn claim_tokens(&self, ctx: &CallContext) -> Result<Amount, CampaignError> {
        let _scope = self.enter(ctx)?;
        let investor = ctx.caller;

        let (investment, tokens) = {
            let mut state = self.state.borrow_mut();
            if !state.finalized {
                return Err(CampaignError::NotFinalized);
            }
            if !state.successful {
                return Err(CampaignError::CampaignFailed);
            }
            let investment = state.investment(&investor);
            if investment == 0 {
                return Err(CampaignError::NothingToClaim);
            }
            let tokens = self.token_amount_for(investment)?;
            if tokens == 0 {
                return Err(CampaignError::ZeroTokenAmount);
            }
            state.take_investment(&investor);
            (investment, tokens)
        };

        let minter = CallContext::new(self.address, ctx.timestamp);
        if let Err(err) = self.token.mint(&minter, &investor, tokens) {
            self.state
                .borrow_mut()
                .restore_investment(&investor, investment);
            warn!(campaign = %self.address, investor = %investor, tokens, error = %err,
                "Token mint refused; claim rolled back");
            return Err(err.into());
        }

        info!(
            campaign = %self.address,
            investor = %investor,
            investment,
            tokens = %numeric::to_units(tokens, TOKEN_DECIMALS).unwrap_or_default(),
            "Tokens claimed"
        );
        self.emit(ContractEvent::TokensClaimed(TokensClaimed {
            investor,
            investment,
            tokens,
        }));
        Ok(tokens)
    }

    /// Return the caller's full investment after a failed campaign.
    pub fn claim_refund(&self, ctx: &CallContext) -> Result<Amount, CampaignError> {
        let _scope = self.enter(ctx)?;
        let investor = ctx.caller;

        let (amount, asset) = {
            let mut state = self.state.borrow_mut();
            if !state.finalized {
                return Err(CampaignError::NotFinalized);
            }
            if state.successful {
                return Err(CampaignError::CampaignSucceeded);
            }
            let amount = state.take_investment(&investor);
            if amount == 0 {
                return Err(CampaignError::NothingToClaim);
            }
            (amount, state.payment_asset)
        };

        if let Err(err) = self
            .ledger
            .transfer(&asset, &self.address, &investor, amount)
        {
            self.state
                .borrow_mut()
                .restore_investment(&investor, amount);
            warn!(campaign = %self.address, investor = %investor, amount, error = %err,
                "Refund transfer failed; claim rolled back");
            return Err(err.into());
        }

        info!(campaign = %self.address, investor = %investor, amount, "Investment refunded");
        self.emit(ContractEvent::Refunded(Refunded { investor, amount }));
        Ok(amount)
    }

    // ───────────────────────── Administration ─────────────────────────

    /// Add or remove accounts from the whitelist. Admin-only.
    pub fn update_whitelist(
        &self,
        ctx: &CallContext,
        accounts: &[AccountId],
        allowed: bool,
    ) -> Result<(), CampaignError> {
        let _scope = self.enter(ctx)?;
        self.require(ctx, Capability::Admin)?;
        {
            let mut state = self.state.borrow_mut();
            for account in accounts {
                if allowed {
                    state.whitelist.insert(*account);
                } else {
                    state.whitelist.remove(account);
                }
            }
        }
        debug!(campaign = %self.address, count = accounts.len(), allowed, "Whitelist updated");
        for account in accounts {
            self.emit(ContractEvent::WhitelistUpdated(WhitelistUpdated {
                account: *account,
                allowed,
            }));
        }
        Ok(())
    }

    /// Switch the payment asset. Only before the first investment. Admin-only.
    pub fn set_payment_asset(&self, ctx: &CallContext, asset: AssetRef) -> Result<(), CampaignError> {
        let _scope = self.enter(ctx)?;
        self.require(ctx, Capability::Admin)?;
        let previous = {
            let mut state = self.state.borrow_mut();
            if state.total_raised > 0 || !state.investments.is_empty() {
                return Err(CampaignError::InvestmentsRecorded);
            }
            std::mem::replace(&mut state.payment_asset, asset)
        };
        info!(campaign = %self.address, %previous, current = %asset, "Payment asset updated");
        self.emit(ContractEvent::PaymentAssetUpdated(PaymentAssetUpdated {
            previous,
            current: asset,
        }));
        Ok(())
    }

    /// Change who receives the raised funds. Admin-only.
    pub fn set_beneficiary(&self, ctx: &CallContext, beneficiary: &AccountId) -> Result<(), CampaignError> {
        let _scope = self.enter(ctx)?;
        self.require(ctx, Capability::Admin)?;
        if beneficiary.is_zero() {
            return Err(CampaignError::ZeroAccount {
                role: "beneficiary".to_string(),
            });
        }
        let previous = std::mem::replace(&mut self.state.borrow_mut().beneficiary, *beneficiary);
        info!(campaign = %self.address, %previous, current = %beneficiary, "Beneficiary updated");
        self.emit(ContractEvent::BeneficiaryUpdated(BeneficiaryUpdated {
            previous,
            current: *beneficiary,
        }));
        Ok(())
    }

    /// Stop investment intake. Claims, refunds and finalize are unaffected.
    pub fn pause(&self, ctx: &CallContext) -> Result<(), CampaignError> {
        self.set_paused(ctx, true)
    }

    pub fn unpause(&self, ctx: &CallContext) -> Result<(), CampaignError> {
        self.set_paused(ctx, false)
    }

    fn set_paused(&self, ctx: &CallContext, paused: bool) -> Result<(), CampaignError> {
        let _scope = self.enter(ctx)?;
        self.require(ctx, Capability::Admin)?;
        {
            let mut state = self.state.borrow_mut();
            if paused {
                state.pause_guard.pause();
            } else {
                state.pause_guard.unpause();
            }
        }
        warn!(campaign = %self.address, by = %ctx.caller, paused, "Investment intake pause changed");
        self.emit(ContractEvent::PauseChanged(PauseChanged {
            paused,
            by: ctx.caller,
        }));
        Ok(())
    }

    pub fn grant_capability(
        &self,
        ctx: &CallContext,
        account: &AccountId,
        capability: Capability,
    ) -> Result<(), CampaignError> {
        self.change_capability(ctx, account, capability, true)
    }

    pub fn revoke_capability(
        &self,
        ctx: &CallContext,
        account: &AccountId,
        capability: Capability,
    ) -> Result<(), CampaignError> {
        self.change_capability(ctx, account, capability, false)
    }

    fn change_capability(
        &self,
        ctx: &CallContext,
        account: &AccountId,
        capability: Capability,
        granted: bool,
    ) -> Result<(), CampaignError> {
        let _scope = self.enter(ctx)?;
        self.require(ctx, Capability::Admin)?;
        let changed = {
            let mut state = self.state.borrow_mut();
            if granted {
                state.access_control.grant(*account, capability)
            } else {
                state.access_control.revoke(account, capability)
            }
        };
        if changed {
            info!(campaign = %self.address, account = %account, %capability, granted, "Capability changed");
            self.emit(ContractEvent::CapabilityChanged(CapabilityChanged {
                account: *account,
                capability,
                granted,
                by: ctx.caller,
            }));
        }
        Ok(())
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn address(&self) -> AccountId {
        self.address
    }

    /// The ownership token this campaign mints.
    pub fn token(&self) -> Rc<OwnershipToken> {
        Rc::clone(&self.token)
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn compliance_class(&self) -> ClassId {
        self.compliance_class
    }

    /// Lifecycle state at ledger time `now`.
    pub fn state(&self, now: Timestamp) -> CampaignState {
        let state = self.state.borrow();
        if state.finalized {
            return if state.successful {
                CampaignState::FinalizedSuccessful
            } else {
                CampaignState::FinalizedFailed
            };
        }
        if now < self.schedule.start {
            CampaignState::Pending
        } else if now <= self.schedule.whitelist_end {
            CampaignState::ActiveWhitelisted
        } else if now <= self.schedule.end {
            CampaignState::ActiveOpen
        } else {
            CampaignState::Ended
        }
    }

    pub fn investment_of(&self, investor: &AccountId) -> Amount {
        self.state.borrow().investment(investor)
    }

    /// Number of investors with an unclaimed record.
    pub fn investor_count(&self) -> usize {
        self.state.borrow().investments.len()
    }

    pub fn total_raised(&self) -> Amount {
        self.state.borrow().total_raised
    }

    pub fn is_finalized(&self) -> bool {
        self.state.borrow().finalized
    }

    pub fn is_successful(&self) -> bool {
        self.state.borrow().successful
    }

    pub fn is_paused(&self) -> bool {
        self.state.borrow().pause_guard.is_paused()
    }

    pub fn is_whitelisted(&self, account: &AccountId) -> bool {
        self.state.borrow().whitelist.contains(account)
    }

    pub fn payment_asset(&self) -> AssetRef {
        self.state.borrow().payment_asset
    }

    pub fn beneficiary(&self) -> AccountId {
        self.state.borrow().beneficiary
    }

    pub fn has_capability(&self, account: &AccountId, capability: Capability) -> bool {
        self.state.borrow().access_control.has(account, capability)
    }

    /// Payment asset currently held by the campaign.
    pub fn custody_balance(&self) -> Amount {
        let asset = self.payment_asset();
        self.ledger.balance_of(&asset, &self.address)
    }

    /// Tokens an investment of `amount` buys.
    pub fn token_amount_for(&self, amount: Amount) -> Result<Amount, CampaignError> {
        Ok(numeric::mul_div(amount, SCALE, self.limits.token_price)?)
    }

    /// `total_raised / hard_cap`.
    pub fn funding_progress(&self) -> Decimal {
        numeric::ratio(self.total_raised(), self.limits.hard_cap).unwrap_or(Decimal::ZERO)
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> Vec<ContractEvent> {
        self.events.borrow().clone()
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&self) -> Vec<ContractEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    // ───────────────────────── Internal Guards ─────────────────────────

    fn enter(&self, ctx: &CallContext) -> Result<GuardScope<'_>, CampaignError> {
        self.guard.enter().ok_or_else(|| {
            warn!(campaign = %self.address, caller = %ctx.caller, "Reentrant campaign call rejected");
            CampaignError::Reentrancy
        })
    }

    fn require(&self, ctx: &CallContext, capability: Capability) -> Result<(), CampaignError> {
        if self.has_capability(&ctx.caller, capability) {
            Ok(())
        } else {
            Err(CampaignError::Unauthorized {
                capability: capability.to_string(),
            })
        }
    }

    fn emit(&self, event: ContractEvent) {
        self.events.borrow_mut().push(event);
    }
}
