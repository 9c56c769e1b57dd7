//! Constants and builders for the well-known state keys of the settlement
//! contract.
//!
//! This module is the single source of truth for the contract's keyspace.
//! Per-database keys embed the `DbId` as 8 big-endian bytes directly after
//! the prefix so that lexicographic scan order equals numeric database
//! order; per-query keys append the raw query-CID bytes after the id;
//! per-account keys terminate with the raw account-id bytes so the account
//! parses as an unambiguous suffix.

use crate::market::{AccountId, DbId, QueryCid};

/// The state key for the contract owner allowed to recover slashed funds.
pub const MARKET_OWNER_KEY: &[u8] = b"market::owner";

/// The state key for the next database id to assign on deploy.
pub const MARKET_NEXT_ID_KEY: &[u8] = b"market::next_id";

/// The state key for the pool of forfeited funds.
pub const MARKET_SLASHED_KEY: &[u8] = b"market::slashed";

/// Key prefix for the deploying developer of a database: `{prefix}{dbid}`.
pub const DB_OWNER_PREFIX: &[u8] = b"market::db::owner::";

/// Key prefix for a database's immutable manifest: `{prefix}{dbid}`.
pub const DB_MANIFEST_PREFIX: &[u8] = b"market::db::manifest::";

/// Key prefix for registered host endpoints: `{prefix}{dbid}{account}`.
pub const API_REGISTRY_PREFIX: &[u8] = b"market::api::";

/// Key prefix for locked security deposits: `{prefix}{dbid}{account}`.
pub const DEPOSIT_PREFIX: &[u8] = b"market::deposit::";

/// Key prefix for settlement-window close heights: `{prefix}{dbid}{query}`.
pub const RESULT_TTL_PREFIX: &[u8] = b"market::ttl::";

/// Key prefix for per-query result ballots: `{prefix}{dbid}{query}`.
pub const PENDING_RESULTS_PREFIX: &[u8] = b"market::results::";

/// Key prefix for escrowed query fees: `{prefix}{dbid}{query}`.
pub const PENDING_FEES_PREFIX: &[u8] = b"market::fees::";

/// Key prefix for withdrawable settled fees: `{prefix}{account}`.
pub const SETTLED_FEES_PREFIX: &[u8] = b"market::earned::";

/// Key prefix for withdrawable royalties: `{prefix}{account}`.
pub const SETTLED_ROYALTIES_PREFIX: &[u8] = b"market::royalties::";

/// The key holding a database's deploying developer.
pub fn db_owner_key(db: DbId) -> Vec<u8> {
    [DB_OWNER_PREFIX, &db.to_key_bytes()].concat()
}

/// The key holding a database's immutable manifest.
pub fn db_manifest_key(db: DbId) -> Vec<u8> {
    [DB_MANIFEST_PREFIX, &db.to_key_bytes()].concat()
}

/// The key holding one host's endpoint registration for a database.
pub fn api_key(db: DbId, host: &AccountId) -> Vec<u8> {
    [API_REGISTRY_PREFIX, &db.to_key_bytes(), host.as_ref()].concat()
}

/// The scan prefix covering every endpoint registered for a database.
pub fn api_scan_prefix(db: DbId) -> Vec<u8> {
    [API_REGISTRY_PREFIX, &db.to_key_bytes()].concat()
}

/// The key holding one host's security deposit for a database.
pub fn deposit_key(db: DbId, host: &AccountId) -> Vec<u8> {
    [DEPOSIT_PREFIX, &db.to_key_bytes(), host.as_ref()].concat()
}

/// The key holding a pending query's settlement-window close height.
pub fn ttl_key(db: DbId, query: &QueryCid) -> Vec<u8> {
    [RESULT_TTL_PREFIX, &db.to_key_bytes(), query.as_ref()].concat()
}

/// The key holding a pending query's per-host result ballot.
pub fn results_key(db: DbId, query: &QueryCid) -> Vec<u8> {
    [PENDING_RESULTS_PREFIX, &db.to_key_bytes(), query.as_ref()].concat()
}

/// The key holding a pending query's escrowed fee.
pub fn fees_key(db: DbId, query: &QueryCid) -> Vec<u8> {
    [PENDING_FEES_PREFIX, &db.to_key_bytes(), query.as_ref()].concat()
}

/// The key holding an account's withdrawable settled fees.
pub fn earned_key(account: &AccountId) -> Vec<u8> {
    [SETTLED_FEES_PREFIX, account.as_ref()].concat()
}

/// The key holding an account's withdrawable royalties.
pub fn royalties_key(account: &AccountId) -> Vec<u8> {
    [SETTLED_ROYALTIES_PREFIX, account.as_ref()].concat()
}
