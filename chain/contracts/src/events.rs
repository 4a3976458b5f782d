//! Contract events
//!
//! Events are immutable audit records appended by contract operations and
//! observable by anyone watching the ledger.

use serde::{Deserialize, Serialize};

use offering_types::asset::AssetRef;
use offering_types::ids::{AccountId, DistributionId, SnapshotId};
use offering_types::numeric::{Amount, Timestamp};

use crate::security::Capability;

/// Investment accepted into custody
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invested {
    pub investor: AccountId,
    pub amount: Amount,
    pub total_invested: Amount,
    pub total_raised: Amount,
}

/// Campaign outcome fixed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finalized {
    pub successful: bool,
    pub total_raised: Amount,
    pub beneficiary: AccountId,
    pub swept: Amount,
    pub finalized_at: Timestamp,
}

/// Ownership tokens issued for an investment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensClaimed {
    pub investor: AccountId,
    pub investment: Amount,
    pub tokens: Amount,
}

/// Investment returned after a failed campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refunded {
    pub investor: AccountId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistUpdated {
    pub account: AccountId,
    pub allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAssetUpdated {
    pub previous: AssetRef,
    pub current: AssetRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryUpdated {
    pub previous: AccountId,
    pub current: AccountId,
}

/// Investment intake paused or resumed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseChanged {
    pub paused: bool,
    pub by: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityChanged {
    pub account: AccountId,
    pub capability: Capability,
    pub granted: bool,
    pub by: AccountId,
}

/// Token balance movement; mints come from and burns go to the zero account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub owner: AccountId,
    pub spender: AccountId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTaken {
    pub id: SnapshotId,
    pub total_supply: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionCreated {
    pub id: DistributionId,
    pub snapshot: SnapshotId,
    pub asset: AssetRef,
    pub total_amount: Amount,
    pub per_token_rate: Amount,
    pub funder: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendClaimed {
    pub id: DistributionId,
    pub account: AccountId,
    pub amount: Amount,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    Invested(Invested),
    Finalized(Finalized),
    TokensClaimed(TokensClaimed),
    Refunded(Refunded),
    WhitelistUpdated(WhitelistUpdated),
    PaymentAssetUpdated(PaymentAssetUpdated),
    BeneficiaryUpdated(BeneficiaryUpdated),
    PauseChanged(PauseChanged),
    CapabilityChanged(CapabilityChanged),
    Transfer(Transfer),
    Approval(Approval),
    SnapshotTaken(SnapshotTaken),
    DistributionCreated(DistributionCreated),
    DividendClaimed(DividendClaimed),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invested_serialization() {
        let event = ContractEvent::Invested(Invested {
            investor: AccountId::from_label("alice"),
            amount: 10_000,
            total_invested: 10_000,
            total_raised: 50_000,
        });
        let json = serde_json::to_string(&event).unwrap();
        let deser: ContractEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_distribution_created_serialization() {
        let event = DistributionCreated {
            id: DistributionId(0),
            snapshot: SnapshotId(1),
            asset: AssetRef::Native,
            total_amount: 1_000,
            per_token_rate: 4_000_000_000_000_000_000,
            funder: AccountId::from_label("funder"),
        };
        let json = serde_json::to_string(&event).unwrap();
        let deser: DistributionCreated = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_contract_event_enum_variant() {
        let event = ContractEvent::Transfer(Transfer {
            from: AccountId::ZERO,
            to: AccountId::from_label("alice"),
            amount: 5,
        });
        assert!(matches!(event, ContractEvent::Transfer(_)));
    }
}
