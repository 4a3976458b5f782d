//! Identifier types for offering entities
//!
//! Accounts use UUID v7 for time-sortable ordering. Contract accounts are
//! derived deterministically from their deployer so that every party can
//! compute a contract's address ahead of deployment.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an account (investor, operator or contract)
///
/// The nil UUID is reserved as the zero sentinel: it is the implicit
/// counterparty of mints and burns and can never hold a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// The zero/burn sentinel.
    pub const ZERO: AccountId = AccountId(Uuid::nil());

    /// Create a new AccountId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Derive a stable identifier from a human-readable label.
    ///
    /// The same label always yields the same account.
    pub fn from_label(label: &str) -> Self {
        Self::hashed(&[&b"account:"[..], label.as_bytes()])
    }

    /// Derive the address of a contract deployed by `deployer` under `salt`.
    pub fn derive(deployer: &AccountId, salt: &str) -> Self {
        Self::hashed(&[&b"contract:"[..], &deployer.0.as_bytes()[..], salt.as_bytes()])
    }

    fn hashed(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(Uuid::from_bytes(bytes))
    }

    /// Get inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Whether this is the zero/burn sentinel.
    pub fn is_zero(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compliance class identifier (e.g. "KYC passed" bucket in the registry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub u32);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// Balance snapshot identifier. Ids start at 1 and increase monotonically;
/// 0 means "no snapshot taken yet".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub u64);

impl SnapshotId {
    pub const NONE: SnapshotId = SnapshotId(0);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dividend distribution identifier, an index into the distribution arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistributionId(pub u64);

impl fmt::Display for DistributionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
