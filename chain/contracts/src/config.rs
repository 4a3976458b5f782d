//! Campaign deployment configuration
//!
//! Constructor-time parameters, deserializable from JSON. Schedule times are
//! calendar timestamps here and become ledger seconds at deployment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use offering_types::asset::AssetRef;
use offering_types::ids::{AccountId, ClassId};
use offering_types::numeric::{self, Amount, Timestamp, SCALE};

use crate::compliance::ComplianceRegistry;
use crate::errors::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Compliance class investors and token holders must belong to
    pub compliance_class: ClassId,
    /// Asset investors pay with
    pub payment_asset: AssetRef,
    /// Receives the raised funds after a successful campaign
    pub beneficiary: AccountId,
    pub start_time: DateTime<Utc>,
    /// Only whitelisted accounts may invest up to and including this instant
    pub whitelist_end_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Per-investor cumulative bounds
    pub min_investment: Amount,
    pub max_investment: Amount,
    pub soft_cap: Amount,
    pub hard_cap: Amount,
    /// Payment units per whole token
    pub token_price: Amount,
    pub token_name: String,
    pub token_symbol: String,
}

/// Validated schedule in ledger seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub start: Timestamp,
    pub whitelist_end: Timestamp,
    pub end: Timestamp,
}

impl CampaignConfig {
    /// Parse a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    pub fn schedule(&self) -> Schedule {
        Schedule {
            start: self.start_time.timestamp(),
            whitelist_end: self.whitelist_end_time.timestamp(),
            end: self.end_time.timestamp(),
        }
    }

    /// Check every parameter against deployment time `now`.
    pub fn validate(&self, now: Timestamp, registry: &dyn ComplianceRegistry) -> Result<(), ConfigError> {
        let schedule = self.schedule();
        if schedule.start <= now {
            return Err(ConfigError::StartInPast);
        }
        if !(schedule.start <= schedule.whitelist_end && schedule.whitelist_end < schedule.end) {
            return Err(ConfigError::InvalidSchedule);
        }
        if self.min_investment == 0 || self.min_investment > self.max_investment {
            return Err(ConfigError::InvalidInvestmentBounds);
        }
        if self.soft_cap == 0 || self.soft_cap > self.hard_cap {
            return Err(ConfigError::InvalidCaps);
        }
        if self.token_price == 0 {
            return Err(ConfigError::InvalidPrice);
        }
        // Investment records and total raised never exceed the hard cap, so
        // every claim and the final supply fit if the hard cap converts.
        if numeric::mul_div(self.hard_cap, SCALE, self.token_price).is_err() {
            return Err(ConfigError::TokenAmountOverflow {
                hard_cap: self.hard_cap,
            });
        }
        if numeric::mul_div(self.min_investment, SCALE, self.token_price) == Ok(0) {
            return Err(ConfigError::MinimumBuysNoTokens {
                min_investment: self.min_investment,
                token_price: self.token_price,
            });
        }
        if self.token_name.trim().is_empty() || self.token_symbol.trim().is_empty() {
            return Err(ConfigError::EmptyTokenMetadata);
        }
        if self.beneficiary.is_zero() {
            return Err(ConfigError::ZeroBeneficiary);
        }
        if !registry.class_exists(self.compliance_class) {
            return Err(ConfigError::UnknownClass {
                class: self.compliance_class,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::InMemoryRegistry;
    use chrono::TimeZone;

    const NOW: Timestamp = 1_700_000_000;

    fn registry() -> InMemoryRegistry {
        let registry = InMemoryRegistry::new();
        registry.create_class(ClassId(1));
        registry
    }

    fn valid() -> CampaignConfig {
        CampaignConfig {
            compliance_class: ClassId(1),
            payment_asset: AssetRef::Token(AccountId::from_label("usdc")),
            beneficiary: AccountId::from_label("owner"),
            start_time: Utc.timestamp_opt(NOW + 100, 0).unwrap(),
            whitelist_end_time: Utc.timestamp_opt(NOW + 200, 0).unwrap(),
            end_time: Utc.timestamp_opt(NOW + 300, 0).unwrap(),
            min_investment: 100,
            max_investment: 10_000,
            soft_cap: 50_000,
            hard_cap: 100_000,
            token_price: 1,
            token_name: "Harbor Street Property".to_string(),
            token_symbol: "HSP".to_string(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate(NOW, &registry()).is_ok());
        assert_eq!(
            valid().schedule(),
            Schedule {
                start: NOW + 100,
                whitelist_end: NOW + 200,
                end: NOW + 300
            }
        );
    }

    #[test]
    fn test_start_must_be_future() {
        let config = valid();
        assert_eq!(
            config.validate(NOW + 100, &registry()),
            Err(ConfigError::StartInPast)
        );
    }

    #[test]
    fn test_schedule_ordering() {
        let mut config = valid();
        config.whitelist_end_time = config.end_time;
        assert_eq!(config.validate(NOW, &registry()), Err(ConfigError::InvalidSchedule));

        let mut config = valid();
        config.whitelist_end_time = Utc.timestamp_opt(NOW + 50, 0).unwrap();
        assert_eq!(config.validate(NOW, &registry()), Err(ConfigError::InvalidSchedule));
    }

    #[test]
    fn test_bounds_and_caps() {
        let mut config = valid();
        config.min_investment = 20_000;
        assert_eq!(
            config.validate(NOW, &registry()),
            Err(ConfigError::InvalidInvestmentBounds)
        );

        let mut config = valid();
        config.soft_cap = 200_000;
        assert_eq!(config.validate(NOW, &registry()), Err(ConfigError::InvalidCaps));

        let mut config = valid();
        config.token_price = 0;
        assert_eq!(config.validate(NOW, &registry()), Err(ConfigError::InvalidPrice));
    }

    #[test]
    fn test_hard_cap_must_convert_to_tokens() {
        // 400 whole units of an 18-decimal asset at 1 base unit per token
        let mut config = valid();
        config.max_investment = 400 * SCALE;
        config.soft_cap = 400 * SCALE;
        config.hard_cap = 400 * SCALE;
        assert_eq!(
            config.validate(NOW, &registry()),
            Err(ConfigError::TokenAmountOverflow {
                hard_cap: 400 * SCALE
            })
        );

        // Same raise priced at one whole payment unit per token
        config.token_price = SCALE;
        assert!(config.validate(NOW, &registry()).is_ok());
    }

    #[test]
    fn test_minimum_must_buy_tokens() {
        let mut config = valid();
        config.token_price = 100 * SCALE + 1;
        assert_eq!(
            config.validate(NOW, &registry()),
            Err(ConfigError::MinimumBuysNoTokens {
                min_investment: 100,
                token_price: 100 * SCALE + 1
            })
        );

        config.token_price = 100 * SCALE;
        assert!(config.validate(NOW, &registry()).is_ok());
    }

    #[test]
    fn test_metadata_beneficiary_and_class() {
        let mut config = valid();
        config.token_symbol = String::new();
        assert_eq!(
            config.validate(NOW, &registry()),
            Err(ConfigError::EmptyTokenMetadata)
        );

        let mut config = valid();
        config.beneficiary = AccountId::ZERO;
        assert_eq!(config.validate(NOW, &registry()), Err(ConfigError::ZeroBeneficiary));

        let mut config = valid();
        config.compliance_class = ClassId(9);
        assert_eq!(
            config.validate(NOW, &registry()),
            Err(ConfigError::UnknownClass { class: ClassId(9) })
        );
    }

    #[test]
    fn test_json_round_trip() {
        let json = serde_json::to_string(&valid()).unwrap();
        let parsed = CampaignConfig::from_json(&json).unwrap();
        assert_eq!(parsed, valid());
    }

    #[test]
    fn test_json_document() {
        let json = r#"{
            "compliance_class": 1,
            "payment_asset": "native",
            "beneficiary": "00000000-0000-7000-8000-000000000001",
            "start_time": "2030-01-01T00:00:00Z",
            "whitelist_end_time": "2030-01-08T00:00:00Z",
            "end_time": "2030-02-01T00:00:00Z",
            "min_investment": 100,
            "max_investment": 10000,
            "soft_cap": 50000,
            "hard_cap": 100000,
            "token_price": 1,
            "token_name": "Harbor Street Property",
            "token_symbol": "HSP"
        }"#;
        let config = CampaignConfig::from_json(json).unwrap();
        assert_eq!(config.payment_asset, AssetRef::Native);
        assert!(config.validate(NOW, &registry()).is_ok());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            CampaignConfig::from_json("{"),
            Err(ConfigError::Malformed(_))
        ));
    }
}
