//! Contract Logic for Fractional Property Offerings
//!
//! This crate implements the contract layer of a property offering: a
//! time-boxed fundraising campaign, the compliance-gated ownership token it
//! issues, and snapshot-based dividend distribution to token holders.
//!
//! # Modules
//! - `errors`: Contract-specific error types
//! - `events`: Contract events
//! - `security`: Shared security primitives (reentrancy guard, capabilities, pause)
//! - `context`: Per-call caller, ledger time and attached value
//! - `compliance`: Compliance registry boundary and in-memory registry
//! - `ledger`: Asset ledger boundary and in-memory ledger
//! - `config`: Campaign deployment configuration
//! - `snapshot`: Lazy balance checkpoints
//! - `token`: Ownership token balances, allowances and snapshots
//! - `dividend`: Dividend distributions against snapshots
//! - `campaign`: Investment intake, finalization, token claims and refunds
//!
//! # Version
//! v0.1.0

pub mod errors;
pub mod events;
pub mod security;
pub mod context;
pub mod compliance;
pub mod ledger;
pub mod config;
pub mod snapshot;
pub mod token;
pub mod dividend;
pub mod campaign;

/// Contract ABI version, frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
