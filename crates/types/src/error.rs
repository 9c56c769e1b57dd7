//! Error types for the querynet settlement contract.
//!
//! Every failure aborts the current operation: the executor discards the
//! call's state overlay, so no variant here ever leaves partial mutations
//! behind. Host runtimes map aborts onto their native revert primitive using
//! the stable string codes from [`ErrorCode`].

use crate::market::{DbId, Money};
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised by the key-value state backend.
#[derive(Error, Debug)]
pub enum StateError {
    /// An error occurred in the state backend.
    #[error("State backend error: {0}")]
    Backend(String),
    /// A stored value failed to decode.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The provided value was invalid.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "STATE_BACKEND_ERROR",
            Self::Decode(_) => "STATE_DECODE_ERROR",
            Self::InvalidValue(_) => "STATE_INVALID_VALUE",
        }
    }
}

/// Errors raised by the host runtime's transfer primitive.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The contract balance cannot cover the requested transfer.
    #[error("Contract balance too low for transfer of {requested}")]
    InsufficientBalance {
        /// The amount the contract attempted to pay out.
        requested: Money,
    },
    /// A host-specific transfer failure.
    #[error("Transfer failed: {0}")]
    Other(String),
}

impl ErrorCode for RuntimeError {
    fn code(&self) -> &'static str {
        match self {
            Self::InsufficientBalance { .. } => "RUNTIME_INSUFFICIENT_BALANCE",
            Self::Other(_) => "RUNTIME_TRANSFER_FAILED",
        }
    }
}

/// Errors that abort a settlement-contract operation.
///
/// The first group maps one-to-one onto the contract's documented abort
/// conditions; the remaining variants cover dispatch and infrastructure
/// faults.
#[derive(Error, Debug)]
pub enum ContractError {
    /// The referenced database id has not been deployed.
    #[error("Database {0} does not exist")]
    UnknownDb(DbId),
    /// The deployed manifest failed validation.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),
    /// The caller's security deposit does not meet the required threshold.
    #[error("Security deposit too low: required {required}, got {got}")]
    InsufficientDeposit {
        /// The security-deposit threshold.
        required: Money,
        /// The deposit the caller would hold after this call.
        got: Money,
    },
    /// The caller has no deposit entry to withdraw.
    #[error("Caller did not pay a deposit")]
    NoDeposit,
    /// The fee escrow's TTL already lies in the past.
    #[error("Fee payment is expired: ttl {ttl} below height {height}")]
    Expired {
        /// The TTL the caller supplied.
        ttl: u64,
        /// The current block height.
        height: u64,
    },
    /// Only the contract owner may recover slashed funds.
    #[error("Must be contract owner to recover funds")]
    NotOwner,
    /// The slashed pool cannot cover the requested recovery.
    #[error("Recovery of {requested} exceeds available funds {available}")]
    InsufficientFunds {
        /// The amount requested.
        requested: Money,
        /// The slashed pool balance.
        available: Money,
    },

    /// The dispatched method name is not part of the contract ABI.
    #[error("Unsupported method: {0}")]
    Unsupported(String),
    /// Call parameters failed to decode.
    #[error("Deserialization error: {0}")]
    Deserialization(String),
    /// An error originating from the state backend.
    #[error("State error: {0}")]
    State(#[from] StateError),
    /// An error originating from the host runtime.
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl ErrorCode for ContractError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownDb(_) => "CONTRACT_UNKNOWN_DB",
            Self::InvalidManifest(_) => "CONTRACT_INVALID_MANIFEST",
            Self::InsufficientDeposit { .. } => "CONTRACT_INSUFFICIENT_DEPOSIT",
            Self::NoDeposit => "CONTRACT_NO_DEPOSIT",
            Self::Expired { .. } => "CONTRACT_EXPIRED",
            Self::NotOwner => "CONTRACT_NOT_OWNER",
            Self::InsufficientFunds { .. } => "CONTRACT_INSUFFICIENT_FUNDS",
            Self::Unsupported(_) => "CONTRACT_UNSUPPORTED_METHOD",
            Self::Deserialization(_) => "CONTRACT_DESERIALIZATION_ERROR",
            Self::State(_) => "CONTRACT_STATE_ERROR",
            Self::Runtime(_) => "CONTRACT_RUNTIME_ERROR",
        }
    }
}
