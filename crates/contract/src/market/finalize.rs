//! TTL-driven settlement of expired queries.
//!
//! Runs before any payout: every query whose settlement window has closed is
//! settled exactly once, in ascending (database, query) order, and its
//! pending entries are removed regardless of outcome.

use crate::market::election::Election;
use crate::market::{
    credit, read_money, read_value, write_value, ResultBallot, SECURITY_DEPOSIT,
    SLASHED_DEPOSIT_BIPS,
};
use log::{debug, info, warn};
use querynet_api::state::StateAccess;
use querynet_types::codec;
use querynet_types::error::{ContractError, StateError};
use querynet_types::keys::{
    api_key, db_manifest_key, db_owner_key, deposit_key, earned_key, fees_key, results_key,
    royalties_key, ttl_key, MARKET_SLASHED_KEY, RESULT_TTL_PREFIX,
};
use querynet_types::market::{AccountId, DbId, Manifest, QueryCid, BIPS_DENOMINATOR};

/// Settles every query whose TTL lies at or below `height`.
pub(crate) fn finalize_expired(
    state: &mut dyn StateAccess,
    height: u64,
) -> Result<(), ContractError> {
    // Collect before mutating. The scan is already ordered, but the set is
    // sorted explicitly so payouts stay replica-identical even on backends
    // with looser ordering guarantees.
    let mut expired: Vec<(DbId, QueryCid)> = Vec::new();
    for item in state.prefix_scan(RESULT_TTL_PREFIX)? {
        let (key, value) = item?;
        let ttl: u64 = codec::from_bytes_canonical(&value).map_err(StateError::Decode)?;
        if ttl > height {
            continue;
        }
        expired.push(parse_ttl_key(&key)?);
    }
    expired.sort();

    for (db, query) in expired {
        debug!("finalizing query {} for database {}", query, db);
        settle_query(state, db, &query)?;
    }
    Ok(())
}

/// Splits a `market::ttl::` key back into its database id and query hash.
fn parse_ttl_key(key: &[u8]) -> Result<(DbId, QueryCid), ContractError> {
    let suffix = key.get(RESULT_TTL_PREFIX.len()..).unwrap_or_default();
    if suffix.len() < 8 {
        return Err(StateError::InvalidValue("malformed ttl key".into()).into());
    }
    let (id_bytes, query) = suffix.split_at(8);
    let id_bytes: [u8; 8] = id_bytes
        .try_into()
        .map_err(|_| StateError::InvalidValue("malformed ttl key".into()))?;
    Ok((DbId(u64::from_be_bytes(id_bytes)), QueryCid(query.to_vec())))
}

fn settle_query(
    state: &mut dyn StateAccess,
    db: DbId,
    query: &QueryCid,
) -> Result<(), ContractError> {
    let fee_key = fees_key(db, query);
    let ballot_key = results_key(db, query);
    let window_key = ttl_key(db, query);

    let mut fee = read_money(state, &fee_key)?;
    if !fee.is_zero() {
        // developer royalty comes off the top
        let royalty_bips = read_value::<Manifest>(state, &db_manifest_key(db))?
            .map(|m| m.royalty_bips)
            .unwrap_or(0);
        if royalty_bips > 0 {
            if let Some(owner) =
                read_value::<AccountId>(state, &db_owner_key(db))?
            {
                let royalty = fee.mul(u64::from(royalty_bips)).div(BIPS_DENOMINATOR);
                credit(state, &royalties_key(&owner), royalty)?;
                fee = fee.saturating_sub(royalty);
            }
        }

        let ballot: ResultBallot = read_value(state, &ballot_key)?.unwrap_or_default();
        let mut election = Election::new();
        for (host, result) in &ballot {
            election.add_vote(host.clone(), result.clone());
        }

        if election.is_super_majority() {
            // winners split the fee by an equal bips share, computed once
            // from the pre-loop remainder so per-winner amounts are uniform
            let winners = election.super_majority();
            let share_bips = BIPS_DENOMINATOR / winners.len() as u64;
            let fee_share = fee.mul(share_bips).div(BIPS_DENOMINATOR);
            for vote in &winners {
                fee = fee.saturating_sub(fee_share);
                credit(state, &earned_key(&vote.voter), fee_share)?;
            }
            info!(
                "query {} on database {} settled: {} hosts earn {} each",
                query,
                db,
                winners.len(),
                fee_share
            );
            // rounding dust joins the slashed pool
            credit(state, MARKET_SLASHED_KEY, fee)?;

            if !election.is_unanimous() {
                for vote in election.minority() {
                    slash_deposit(state, db, &vote.voter)?;
                }
            }
        } else {
            // no agreement, or a paid fee with no results at all: the whole
            // remainder is forfeited
            info!(
                "query {} on database {} had no super-majority, {} forfeited",
                query, db, fee
            );
            credit(state, MARKET_SLASHED_KEY, fee)?;
        }
    }

    // the three pending entries live and die together
    state.delete(&fee_key)?;
    state.delete(&ballot_key)?;
    state.delete(&window_key)?;
    Ok(())
}

/// Confiscates a minority host's deposit into the slashed pool.
///
/// The nominal charge `deposit * 10000 / SLASHED_DEPOSIT_BIPS` exceeds the
/// full deposit whenever the bips constant is below 10000, so the charge is
/// capped at the remaining balance; the emptied entry is removed, which also
/// drops the host's endpoint registration below the admission threshold, so
/// that registration is purged too.
fn slash_deposit(
    state: &mut dyn StateAccess,
    db: DbId,
    host: &AccountId,
) -> Result<(), ContractError> {
    let key = deposit_key(db, host);
    let deposit = read_money(state, &key)?;
    if deposit.is_zero() {
        return Ok(());
    }

    let nominal = deposit.mul(BIPS_DENOMINATOR).div(SLASHED_DEPOSIT_BIPS);
    let slashed = nominal.min(deposit);
    let remaining = deposit.saturating_sub(slashed);
    if remaining.is_zero() {
        state.delete(&key)?;
        state.delete(&api_key(db, host))?;
    } else if remaining < SECURITY_DEPOSIT {
        write_value(state, &key, &remaining)?;
        state.delete(&api_key(db, host))?;
    } else {
        write_value(state, &key, &remaining)?;
    }
    credit(state, MARKET_SLASHED_KEY, slashed)?;
    warn!(
        "slashed {} from host {} on database {} for a minority result",
        slashed, host, db
    );
    Ok(())
}
