//! Per-query result election.
//!
//! A single-use accumulator over host votes for result hashes. A result hash
//! either sends all of its voters into the super-majority or none of them;
//! the cutoff is the integer `200 * num_voters / 3`, and a count `v`
//! qualifies iff `100 * v >= cutoff`. For three voters this admits 2-of-3;
//! for two voters only unanimity qualifies.

use querynet_types::market::{AccountId, ResultCid};
use std::collections::BTreeMap;

/// A single host's vote for a result hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Vote {
    /// The voting host.
    pub voter: AccountId,
    /// The result hash the host produced.
    pub result: ResultCid,
}

/// Accumulates votes and answers membership in the super-majority and
/// minority partitions.
///
/// The contract guarantees at most one vote per host because the stored
/// ballot is a map keyed by host; the election itself makes no uniqueness
/// claim and counts repeated voters as additional votes.
#[derive(Debug, Default)]
pub struct Election {
    votes: Vec<Vote>,
    tally: BTreeMap<ResultCid, usize>,
}

impl Election {
    /// Creates an empty election.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a vote and bumps the tally of its result hash.
    pub fn add_vote(&mut self, voter: AccountId, result: ResultCid) {
        *self.tally.entry(result.clone()).or_insert(0) += 1;
        self.votes.push(Vote { voter, result });
    }

    /// Total number of votes cast.
    pub fn num_voters(&self) -> usize {
        self.votes.len()
    }

    /// Number of votes inside the super-majority partition.
    pub fn num_super_majority(&self) -> usize {
        let cutoff = self.cutoff();
        self.votes
            .iter()
            .filter(|v| self.count(&v.result) * 100 >= cutoff)
            .count()
    }

    /// True iff exactly one distinct result hash received votes.
    pub fn is_unanimous(&self) -> bool {
        self.tally.len() == 1
    }

    /// True iff any result hash meets the cutoff.
    pub fn is_super_majority(&self) -> bool {
        let cutoff = self.cutoff();
        self.tally.values().any(|&count| count * 100 >= cutoff)
    }

    /// Votes whose result hash met the cutoff, in insertion order.
    pub fn super_majority(&self) -> Vec<Vote> {
        let cutoff = self.cutoff();
        self.votes
            .iter()
            .filter(|v| self.count(&v.result) * 100 >= cutoff)
            .cloned()
            .collect()
    }

    /// Votes whose result hash failed the cutoff, in insertion order.
    pub fn minority(&self) -> Vec<Vote> {
        let cutoff = self.cutoff();
        self.votes
            .iter()
            .filter(|v| self.count(&v.result) * 100 < cutoff)
            .cloned()
            .collect()
    }

    fn count(&self, result: &ResultCid) -> usize {
        self.tally.get(result).copied().unwrap_or(0)
    }

    fn cutoff(&self) -> usize {
        200 * self.votes.len() / 3
    }
}
