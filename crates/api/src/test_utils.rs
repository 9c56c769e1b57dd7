//! Mock host runtime for tests.

use crate::runtime::{HostRuntime, Transfer};
use querynet_types::error::RuntimeError;
use querynet_types::market::{AccountId, Money};
use std::collections::BTreeMap;

/// A ledger-tracking [`HostRuntime`] for tests.
///
/// Tracks the contract's own balance plus a per-account ledger, and records
/// every transfer it performed. Attached deposits are modeled explicitly:
/// the test harness calls [`MockHost::credit_contract`] before an operation
/// with an attached amount and [`MockHost::refund`] when the operation
/// aborts, mirroring the host chain's credit-then-revert behavior.
#[derive(Debug, Default)]
pub struct MockHost {
    /// The contract's spendable balance.
    pub contract_balance: Money,
    /// Per-account balances credited by outbound transfers.
    pub balances: BTreeMap<AccountId, Money>,
    /// Every transfer performed, in execution order.
    pub transfers: Vec<Transfer>,
}

impl MockHost {
    /// Creates a host with an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits the contract balance with a call's attached deposit.
    pub fn credit_contract(&mut self, amount: Money) {
        self.contract_balance = self.contract_balance.saturating_add(amount);
    }

    /// Reverts an attached deposit after an aborted call.
    pub fn refund(&mut self, to: &AccountId, amount: Money) {
        self.contract_balance = self.contract_balance.saturating_sub(amount);
        let entry = self.balances.entry(to.clone()).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// The balance an account has received from the contract so far.
    pub fn balance_of(&self, account: &AccountId) -> Money {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Total amount paid out across all transfers.
    pub fn total_paid_out(&self) -> Money {
        self.transfers
            .iter()
            .fold(Money::ZERO, |acc, t| acc.saturating_add(t.amount))
    }
}

impl HostRuntime for MockHost {
    fn transfer_to(&mut self, to: &AccountId, amount: Money) -> Result<(), RuntimeError> {
        if self.contract_balance < amount {
            return Err(RuntimeError::InsufficientBalance { requested: amount });
        }
        self.contract_balance = self.contract_balance.saturating_sub(amount);
        let entry = self.balances.entry(to.clone()).or_default();
        *entry = entry.saturating_add(amount);
        self.transfers.push(Transfer {
            to: to.clone(),
            amount,
        });
        Ok(())
    }
}
