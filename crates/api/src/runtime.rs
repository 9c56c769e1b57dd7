//! The host transfer primitive and the per-call transfer outbox.
//!
//! Monetary transfers out of the contract are the only external side effect
//! of any operation. Operations never pay out directly: they queue
//! [`Transfer`]s in an [`Outbox`], and the executor performs them through the
//! [`HostRuntime`] after dispatch succeeds but before the call's state
//! overlay is committed. A failed transfer therefore aborts the whole call
//! with the base store untouched.

use querynet_types::error::RuntimeError;
use querynet_types::market::{AccountId, Money};

/// A single outbound payment from the contract balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// The receiving account.
    pub to: AccountId,
    /// The amount to pay.
    pub amount: Money,
}

/// The queue of outbound transfers produced by one contract call.
#[derive(Debug, Default)]
pub struct Outbox {
    transfers: Vec<Transfer>,
}

impl Outbox {
    /// Creates an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a payment to `to`. Zero amounts are dropped.
    pub fn transfer(&mut self, to: AccountId, amount: Money) {
        if amount.is_zero() {
            return;
        }
        self.transfers.push(Transfer { to, amount });
    }

    /// Consumes the outbox, yielding the queued transfers in queue order.
    pub fn into_transfers(self) -> Vec<Transfer> {
        self.transfers
    }

    /// Returns true if no transfers are queued.
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}

/// The primitive a host runtime must provide to move funds out of the
/// contract.
pub trait HostRuntime {
    /// Atomically credits `to` with `amount` from the contract's balance.
    ///
    /// Must fail (and leave both balances untouched) when the contract
    /// balance cannot cover the amount; the executor turns that failure into
    /// an abort of the whole operation.
    fn transfer_to(&mut self, to: &AccountId, amount: Money) -> Result<(), RuntimeError>;
}
