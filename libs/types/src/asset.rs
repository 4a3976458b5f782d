//! Asset references
//!
//! An asset is either the ledger's native value (attached to calls) or an
//! external token contract identified by its account.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetRef {
    /// Native ledger value
    Native,
    /// External token contract
    Token(AccountId),
}

impl AssetRef {
    pub fn is_native(&self) -> bool {
        matches!(self, AssetRef::Native)
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Native => write!(f, "native"),
            AssetRef::Token(id) => write!(f, "token:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_serialization() {
        let json = serde_json::to_string(&AssetRef::Native).unwrap();
        assert_eq!(json, "\"native\"");
    }

    #[test]
    fn test_token_round_trip() {
        let asset = AssetRef::Token(AccountId::from_label("usdc"));
        let json = serde_json::to_string(&asset).unwrap();
        assert!(json.starts_with("{\"token\":"));
        let back: AssetRef = serde_json::from_str(&json).unwrap();
        assert_eq!(asset, back);
    }

    #[test]
    fn test_is_native() {
        assert!(AssetRef::Native.is_native());
        assert!(!AssetRef::Token(AccountId::from_label("usdc")).is_native());
    }
}
