//! Shared deployment fixture for the integration suites.

#![allow(dead_code)]

use std::rc::Rc;

use chrono::{TimeZone, Utc};

use offering_contracts::campaign::Campaign;
use offering_contracts::compliance::{ComplianceRegistry, InMemoryRegistry};
use offering_contracts::config::CampaignConfig;
use offering_contracts::context::CallContext;
use offering_contracts::errors::CampaignError;
use offering_contracts::ledger::{AssetLedger, InMemoryLedger};
use offering_types::asset::AssetRef;
use offering_types::ids::{AccountId, ClassId};
use offering_types::numeric::{Amount, Timestamp};

pub const KYC: ClassId = ClassId(7);
pub const DEPLOYED: Timestamp = 1_800_000_000;
pub const START: Timestamp = DEPLOYED + 3_600;
pub const WHITELIST_END: Timestamp = START + 86_400;
pub const END: Timestamp = START + 30 * 86_400;
pub const OPEN: Timestamp = WHITELIST_END + 1;
pub const AFTER_END: Timestamp = END + 1;

pub const FUNDING: Amount = 1_000_000;

pub struct Env {
    pub registry: Rc<InMemoryRegistry>,
    pub ledger: Rc<InMemoryLedger>,
    pub campaign: Rc<Campaign>,
    pub admin: AccountId,
    pub owner: AccountId,
    pub asset: AssetRef,
}

impl Env {
    /// Approve, fund and (for token payments) pre-approve an investor.
    pub fn investor(&self, label: &str) -> AccountId {
        let account = AccountId::from_label(label);
        self.registry.approve(KYC, account);
        self.ledger.credit(&self.asset, &account, FUNDING);
        self.ledger
            .approve(&self.asset, &account, &self.campaign.address(), FUNDING);
        account
    }

    pub fn invest(&self, investor: AccountId, amount: Amount, now: Timestamp) {
        self.try_invest(investor, amount, now).unwrap();
    }

    /// Invest the way the host submits the call: native payments carry the
    /// amount as attached value, credited to the campaign before it runs.
    pub fn try_invest(&self, investor: AccountId, amount: Amount, now: Timestamp) -> Result<(), CampaignError> {
        let mut ctx = CallContext::new(investor, now);
        if self.asset.is_native() {
            self.ledger
                .transfer(&AssetRef::Native, &investor, &self.campaign.address(), amount)
                .unwrap();
            ctx = ctx.with_value(amount);
        }
        self.campaign.invest(&ctx, amount)
    }

    /// Distribute native value through the campaign's token, as the host
    /// would: the attached value is credited to the token before the call.
    pub fn distribute_native(&self, amount: Amount, now: Timestamp) -> offering_types::ids::DistributionId {
        let token = self.campaign.token();
        self.ledger
            .credit(&AssetRef::Native, &token.address(), amount);
        token
            .create_dividend_distribution(
                &CallContext::new(self.admin, now).with_value(amount),
                amount,
                AssetRef::Native,
            )
            .unwrap()
    }
}

pub fn config(asset: AssetRef, beneficiary: AccountId) -> CampaignConfig {
    CampaignConfig {
        compliance_class: KYC,
        payment_asset: asset,
        beneficiary,
        start_time: Utc.timestamp_opt(START, 0).unwrap(),
        whitelist_end_time: Utc.timestamp_opt(WHITELIST_END, 0).unwrap(),
        end_time: Utc.timestamp_opt(END, 0).unwrap(),
        min_investment: 100,
        max_investment: 10_000,
        soft_cap: 50_000,
        hard_cap: 100_000,
        token_price: 1,
        token_name: "Harbor Street Property".to_string(),
        token_symbol: "HSP".to_string(),
    }
}

pub fn deploy(asset: AssetRef) -> Env {
    deploy_with(asset, |_| {})
}

/// Deploy after letting the caller adjust the default configuration.
pub fn deploy_with(asset: AssetRef, adjust: impl FnOnce(&mut CampaignConfig)) -> Env {
    try_deploy_with(asset, adjust).unwrap()
}

pub fn try_deploy_with(
    asset: AssetRef,
    adjust: impl FnOnce(&mut CampaignConfig),
) -> Result<Env, CampaignError> {
    init_tracing();
    let registry = Rc::new(InMemoryRegistry::new());
    registry.create_class(KYC);
    let ledger = Rc::new(InMemoryLedger::new());
    let admin = AccountId::from_label("deployer");
    let owner = AccountId::from_label("property-owner");
    let mut cfg = config(asset, owner);
    adjust(&mut cfg);

    let registry_dyn: Rc<dyn ComplianceRegistry> = registry.clone();
    let ledger_dyn: Rc<dyn AssetLedger> = ledger.clone();
    let campaign = Campaign::deploy(
        &CallContext::new(admin, DEPLOYED),
        AccountId::derive(&admin, "campaign"),
        cfg,
        registry_dyn,
        ledger_dyn,
    )?;

    Ok(Env {
        registry,
        ledger,
        campaign: Rc::new(campaign),
        admin,
        owner,
        asset,
    })
}

pub fn usdc() -> AssetRef {
    AssetRef::Token(AccountId::from_label("usdc"))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
