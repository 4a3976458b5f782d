//! Contract-specific error types
//!
//! Error taxonomy for the compliance gate, external asset ledger,
//! configuration, ownership token / dividend engine and fundraising campaign.
//! Every variant maps onto an [`ErrorCategory`].

use offering_types::errors::{ErrorCategory, NumericError};
use offering_types::ids::{AccountId, ClassId, DistributionId, SnapshotId};
use offering_types::numeric::{Amount, Timestamp};
use thiserror::Error;

/// Compliance registry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComplianceError {
    #[error("Compliance class does not exist: {class}")]
    UnknownClass { class: ClassId },

    #[error("Account not approved for {class}: {account}")]
    NotApproved { class: ClassId, account: AccountId },
}

impl ComplianceError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Compliance
    }
}

/// External asset ledger errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("Insufficient {asset} balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        asset: String,
        account: AccountId,
        required: Amount,
        available: Amount,
    },

    #[error("Insufficient allowance: required {required}, approved {approved}")]
    InsufficientAllowance { required: Amount, approved: Amount },

    #[error("Transfer rejected: {reason}")]
    Rejected { reason: String },
}

impl AssetError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::ExternalTransfer
    }
}

/// Deployment configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Start time must be in the future")]
    StartInPast,

    #[error("Schedule must satisfy start <= whitelist end < end")]
    InvalidSchedule,

    #[error("Investment bounds must satisfy 0 < min <= max")]
    InvalidInvestmentBounds,

    #[error("Caps must satisfy 0 < soft cap <= hard cap")]
    InvalidCaps,

    #[error("Token price must be positive")]
    InvalidPrice,

    #[error("Hard cap {hard_cap} cannot be converted to tokens without overflow")]
    TokenAmountOverflow { hard_cap: Amount },

    #[error("Minimum investment {min_investment} buys no tokens at price {token_price}")]
    MinimumBuysNoTokens {
        min_investment: Amount,
        token_price: Amount,
    },

    #[error("Token name and symbol must be non-empty")]
    EmptyTokenMetadata,

    #[error("Beneficiary must not be the zero account")]
    ZeroBeneficiary,

    #[error("Compliance class does not exist: {class}")]
    UnknownClass { class: ClassId },

    #[error("Malformed configuration: {0}")]
    Malformed(String),
}

impl ConfigError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConfigError::UnknownClass { .. } => ErrorCategory::Compliance,
            _ => ErrorCategory::Bound,
        }
    }
}

/// Ownership token and dividend engine errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("Unauthorized: caller lacks {capability} capability")]
    Unauthorized { capability: String },

    #[error("Reentrancy detected")]
    Reentrancy,

    #[error("Compliance error: {0}")]
    Compliance(#[from] ComplianceError),

    #[error("Asset transfer failed: {0}")]
    Asset(#[from] AssetError),

    #[error("Arithmetic error: {0}")]
    Numeric(#[from] NumericError),

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Zero account is not a valid counterparty")]
    ZeroAccount,

    #[error("Insufficient token balance: required {required}, available {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Insufficient token allowance: required {required}, approved {approved}")]
    InsufficientAllowance { required: Amount, approved: Amount },

    #[error("Snapshot id must be positive")]
    ZeroSnapshotId,

    #[error("Snapshot not yet created: {id}")]
    SnapshotNotFound { id: SnapshotId },

    #[error("Total supply is zero")]
    EmptySupply,

    #[error("Attached value {attached} does not match distribution amount {expected}")]
    AttachedValueMismatch { expected: Amount, attached: Amount },

    #[error("Native value attached to a token-denominated distribution")]
    UnexpectedAttachedValue,

    #[error("Distribution not found: {id}")]
    DistributionNotFound { id: DistributionId },

    #[error("Dividend already claimed from distribution {id}")]
    AlreadyClaimed { id: DistributionId },

    #[error("No balance at snapshot {snapshot}")]
    NoBalanceAtSnapshot { snapshot: SnapshotId },

    #[error("Computed dividend payout is zero")]
    ZeroPayout,

    #[error("Distribution {id} would pay out more than it holds")]
    DistributionExhausted { id: DistributionId },
}

impl TokenError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TokenError::Unauthorized { .. } => ErrorCategory::Authorization,
            TokenError::Compliance(_) => ErrorCategory::Compliance,
            TokenError::Asset(_) => ErrorCategory::ExternalTransfer,
            TokenError::Numeric(_) => ErrorCategory::Arithmetic,
            TokenError::Reentrancy
            | TokenError::ZeroSnapshotId
            | TokenError::SnapshotNotFound { .. }
            | TokenError::EmptySupply
            | TokenError::DistributionNotFound { .. }
            | TokenError::AlreadyClaimed { .. }
            | TokenError::NoBalanceAtSnapshot { .. }
            | TokenError::DistributionExhausted { .. } => ErrorCategory::State,
            TokenError::InvalidAmount
            | TokenError::ZeroAccount
            | TokenError::InsufficientBalance { .. }
            | TokenError::InsufficientAllowance { .. }
            | TokenError::AttachedValueMismatch { .. }
            | TokenError::UnexpectedAttachedValue
            | TokenError::ZeroPayout => ErrorCategory::Bound,
        }
    }
}

/// Fundraising campaign errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CampaignError {
    #[error("Unauthorized: caller lacks {capability} capability")]
    Unauthorized { capability: String },

    #[error("Reentrancy detected")]
    Reentrancy,

    #[error("Investment intake is paused")]
    Paused,

    #[error("Outside the investment window [{start}, {end}] at {now}")]
    OutsideWindow {
        start: Timestamp,
        end: Timestamp,
        now: Timestamp,
    },

    #[error("Campaign already finalized")]
    AlreadyFinalized,

    #[error("Campaign not finalized")]
    NotFinalized,

    #[error("Campaign did not reach its soft cap")]
    CampaignFailed,

    #[error("Campaign succeeded; refunds are unavailable")]
    CampaignSucceeded,

    #[error("Finalization not yet allowed: campaign ends at {end}")]
    FinalizeTooEarly { end: Timestamp },

    #[error("Account not whitelisted: {account}")]
    NotWhitelisted { account: AccountId },

    #[error("Cumulative investment {total} below minimum {minimum}")]
    BelowMinimum { total: Amount, minimum: Amount },

    #[error("Cumulative investment {total} above maximum {maximum}")]
    AboveMaximum { total: Amount, maximum: Amount },

    #[error("Investment would raise {total}, above hard cap {hard_cap}")]
    HardCapExceeded { total: Amount, hard_cap: Amount },

    #[error("Investment amount must be positive")]
    InvalidAmount,

    #[error("Attached value {attached} does not match investment {expected}")]
    AttachedValueMismatch { expected: Amount, attached: Amount },

    #[error("Token-denominated investment must not carry native value")]
    UnexpectedAttachedValue,

    #[error("Nothing to claim")]
    NothingToClaim,

    #[error("Investment too small to buy any tokens")]
    ZeroTokenAmount,

    #[error("Payment asset cannot change after investments were recorded")]
    InvestmentsRecorded,

    #[error("Zero account is not a valid {role}")]
    ZeroAccount { role: String },

    #[error("Compliance error: {0}")]
    Compliance(#[from] ComplianceError),

    #[error("Asset transfer failed: {0}")]
    Asset(#[from] AssetError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Arithmetic error: {0}")]
    Numeric(#[from] NumericError),
}

impl CampaignError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CampaignError::Unauthorized { .. } => ErrorCategory::Authorization,
            CampaignError::Compliance(_) | CampaignError::NotWhitelisted { .. } => {
                ErrorCategory::Compliance
            }
            CampaignError::Asset(_) => ErrorCategory::ExternalTransfer,
            CampaignError::Token(inner) => inner.category(),
            CampaignError::Config(inner) => inner.category(),
            CampaignError::Numeric(_) => ErrorCategory::Arithmetic,
            CampaignError::Reentrancy
            | CampaignError::Paused
            | CampaignError::AlreadyFinalized
            | CampaignError::NotFinalized
            | CampaignError::CampaignFailed
            | CampaignError::CampaignSucceeded
            | CampaignError::FinalizeTooEarly { .. }
            | CampaignError::NothingToClaim
            | CampaignError::InvestmentsRecorded => ErrorCategory::State,
            CampaignError::OutsideWindow { .. }
            | CampaignError::BelowMinimum { .. }
            | CampaignError::AboveMaximum { .. }
            | CampaignError::HardCapExceeded { .. }
            | CampaignError::InvalidAmount
            | CampaignError::AttachedValueMismatch { .. }
            | CampaignError::UnexpectedAttachedValue
            | CampaignError::ZeroTokenAmount
            | CampaignError::ZeroAccount { .. } => ErrorCategory::Bound,
        }
    }
}
