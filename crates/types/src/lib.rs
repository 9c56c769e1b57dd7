#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! # Querynet Types
//!
//! Foundational library for the querynet settlement contract, containing the
//! shared value types, error enums, the canonical state codec and the
//! well-known state-key constants.
//!
//! ## Architectural Role
//!
//! As the base crate, `querynet-types` has minimal dependencies and is a
//! dependency of every other crate in the workspace. Keeping the canonical
//! definitions of `AccountId`, `Money`, `Manifest` and the error enums here
//! prevents circular dependencies between the host-runtime API and the
//! contract logic.

/// A crate-wide `Result` alias defaulting to the contract error type.
pub type Result<T, E = crate::error::ContractError> = std::result::Result<T, E>;

/// The canonical, deterministic binary codec for contract state.
pub mod codec;
/// Error types for state access, host transfers and contract aborts.
pub mod error;
/// Constants for the well-known state keys of the settlement contract.
pub mod keys;
/// Marketplace value types and node-facing wire records.
pub mod market;
