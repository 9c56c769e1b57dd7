//! Defines the stable context for contract-call execution.

use querynet_types::market::{AccountId, Money, Pubkey};

/// Read-only context the host runtime supplies for a single invocation.
///
/// The host chain authenticates the caller before the contract runs, so
/// `caller` is authoritative for every permission check. The context is
/// passed by reference into each operation and must never be retained
/// across calls.
#[derive(Clone, Debug)]
pub struct CallContext {
    /// The authenticated account that signed the current transaction.
    pub caller: AccountId,
    /// The public key the transaction was signed with.
    pub signer_key: Pubkey,
    /// The token amount attached to the call, already credited to the
    /// contract's balance by the host runtime.
    pub amount: Money,
    /// The current block height, monotonic in call order.
    pub height: u64,
}

impl CallContext {
    /// Convenience constructor for hosts and tests.
    pub fn new(caller: impl Into<AccountId>, amount: Money, height: u64) -> Self {
        Self {
            caller: caller.into(),
            signer_key: Pubkey::default(),
            amount,
            height,
        }
    }
}

