//! Types library for the property offering contracts
//!
//! Shared definitions used by the fundraising, ownership token and dividend
//! contracts.
//!
//! # Modules
//! - `ids`: Account, compliance class, snapshot and distribution identifiers
//! - `asset`: Native vs external token asset references
//! - `numeric`: Fixed-point amounts and truncating proportional math
//! - `errors`: Error categories and numeric failures

pub mod ids;
pub mod asset;
pub mod numeric;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";
