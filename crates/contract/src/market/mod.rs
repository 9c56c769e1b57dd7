//! The query-marketplace settlement contract.
//!
//! One `QueryMarketService` manages every deployed database: developer
//! manifests, host security deposits and endpoint registrations, per-query
//! fee escrow and result ballots, and the claimable balances produced by
//! settlement. All state lives behind [`StateAccess`]; all aborts are
//! [`ContractError`] values, never panics, so the host runtime's revert
//! semantics stay in charge.

use log::info;
use parity_scale_codec::{Decode, Encode};
use querynet_api::context::CallContext;
use querynet_api::runtime::{HostRuntime, Outbox};
use querynet_api::state::{StateAccess, StateOverlay};
use querynet_types::codec;
use querynet_types::error::{ContractError, StateError};
use querynet_types::keys::{
    api_key, api_scan_prefix, db_manifest_key, db_owner_key, deposit_key, earned_key, fees_key,
    results_key, royalties_key, ttl_key, DB_MANIFEST_PREFIX, MARKET_NEXT_ID_KEY, MARKET_OWNER_KEY,
    MARKET_SLASHED_KEY,
};
use querynet_types::market::{
    AccountId, ApiEndpoint, DbId, Manifest, Money, QueryCid, ResultCid, BIPS_DENOMINATOR,
};
use std::collections::BTreeMap;

pub mod election;
mod finalize;

/// Blocks a query's settlement window stays open when the first result
/// arrives before any fee escrow fixed a TTL.
pub const MAX_BLOCKS_TO_SETTLE: u64 = 120;

/// Minimum locked deposit a host needs to register and submit results.
pub const SECURITY_DEPOSIT: Money = Money(10_000);

/// Basis-point divisor of the deposit-slashing formula.
pub const SLASHED_DEPOSIT_BIPS: u64 = 1_000;

/// The per-host result ballot of a pending query.
pub type ResultBallot = BTreeMap<AccountId, ResultCid>;

// --- Service Method Parameter Structs (The Contract's Public ABI) ---

/// Parameters of `deploy@v1`.
#[derive(Encode, Decode)]
pub struct DeployParams {
    /// The manifest of the database being deployed.
    pub manifest: Manifest,
}

/// Parameters of `deposit@v1` and `withdraw@v1`.
#[derive(Encode, Decode)]
pub struct DepositParams {
    /// The database the deposit is locked for.
    pub db: DbId,
}

/// Parameters of `register_api@v1`.
#[derive(Encode, Decode)]
pub struct RegisterApiParams {
    /// The database to register for.
    pub db: DbId,
    /// The endpoint URI; empty unregisters.
    pub uri: ApiEndpoint,
}

/// Parameters of `discover@v1`.
#[derive(Encode, Decode)]
pub struct DiscoverParams {
    /// The database to discover hosts for.
    pub db: DbId,
}

/// Parameters of `escrow_fee@v1`.
#[derive(Encode, Decode)]
pub struct EscrowFeeParams {
    /// The database the query targets.
    pub db: DbId,
    /// Content hash of the query being paid for.
    pub query: QueryCid,
    /// Block height at which the settlement window closes.
    pub ttl: u64,
}

/// Parameters of `settle@v1`.
#[derive(Encode, Decode)]
pub struct SettleParams {
    /// The database the query targeted.
    pub db: DbId,
    /// Content hash of the executed query.
    pub query: QueryCid,
    /// Content hash of the result the calling host produced.
    pub result: ResultCid,
}

/// Parameters of `recover@v1`.
#[derive(Encode, Decode)]
pub struct RecoverParams {
    /// Amount to drain from the slashed pool.
    pub amount: Money,
    /// Receiving account.
    pub target: AccountId,
}

// --- Shared state helpers, also used by the finalizer ---

pub(crate) fn read_value<T: Decode>(
    state: &dyn StateAccess,
    key: &[u8],
) -> Result<Option<T>, ContractError> {
    match state.get(key)? {
        Some(bytes) => codec::from_bytes_canonical(&bytes)
            .map(Some)
            .map_err(|e| StateError::Decode(e).into()),
        None => Ok(None),
    }
}

pub(crate) fn write_value<T: Encode>(
    state: &mut dyn StateAccess,
    key: &[u8],
    value: &T,
) -> Result<(), ContractError> {
    state
        .insert(key, &codec::to_bytes_canonical(value))
        .map_err(Into::into)
}

pub(crate) fn read_money(state: &dyn StateAccess, key: &[u8]) -> Result<Money, ContractError> {
    Ok(read_value(state, key)?.unwrap_or_default())
}

/// Adds `amount` to the money value stored under `key`; zero is a no-op so
/// settlement never leaves empty zero entries behind.
pub(crate) fn credit(
    state: &mut dyn StateAccess,
    key: &[u8],
    amount: Money,
) -> Result<(), ContractError> {
    if amount.is_zero() {
        return Ok(());
    }
    let balance = read_money(state, key)?.saturating_add(amount);
    write_value(state, key, &balance)
}

/// The settlement contract of the query marketplace.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryMarketService;

impl QueryMarketService {
    fn next_db_id(state: &dyn StateAccess) -> Result<DbId, ContractError> {
        Ok(read_value(state, MARKET_NEXT_ID_KEY)?.unwrap_or_default())
    }

    fn require_known_db(state: &dyn StateAccess, db: DbId) -> Result<(), ContractError> {
        if db >= Self::next_db_id(state)? {
            return Err(ContractError::UnknownDb(db));
        }
        Ok(())
    }

    // --- Lifecycle ---

    /// Writes the genesis state: the contract owner and the id counter.
    pub fn init_genesis(
        &self,
        state: &mut dyn StateAccess,
        owner: AccountId,
    ) -> Result<(), ContractError> {
        write_value(state, MARKET_OWNER_KEY, &owner)?;
        write_value(state, MARKET_NEXT_ID_KEY, &DbId(0))
    }

    // --- Operations ---

    /// Registers a new database and returns its id.
    ///
    /// Called by: developer. An empty manifest author is replaced with the
    /// caller.
    pub fn deploy(
        &self,
        state: &mut dyn StateAccess,
        mut manifest: Manifest,
        ctx: &CallContext,
    ) -> Result<DbId, ContractError> {
        if u64::from(manifest.royalty_bips) > BIPS_DENOMINATOR {
            return Err(ContractError::InvalidManifest(format!(
                "royalty basis points out of range: {}",
                manifest.royalty_bips
            )));
        }
        if manifest.code_cid.as_ref().is_empty() {
            return Err(ContractError::InvalidManifest("empty code CID".into()));
        }
        if manifest.author.is_empty() {
            manifest.author = ctx.caller.clone();
        }

        let id = Self::next_db_id(state)?;
        write_value(state, &db_owner_key(id), &ctx.caller)?;
        write_value(state, &db_manifest_key(id), &manifest)?;
        write_value(state, MARKET_NEXT_ID_KEY, &id.next())?;
        info!("deployed database {} for {}", id, ctx.caller);
        Ok(id)
    }

    /// Locks the attached amount as security deposit for `db`, joining the
    /// database or topping up a slashed deposit.
    ///
    /// Called by: host. The resulting deposit must reach the threshold; a
    /// partial top-up is rejected wholesale.
    pub fn deposit(
        &self,
        state: &mut dyn StateAccess,
        db: DbId,
        ctx: &CallContext,
    ) -> Result<(), ContractError> {
        Self::require_known_db(state, db)?;
        let key = deposit_key(db, &ctx.caller);
        let balance = read_money(state, &key)?.saturating_add(ctx.amount);
        if balance < SECURITY_DEPOSIT {
            return Err(ContractError::InsufficientDeposit {
                required: SECURITY_DEPOSIT,
                got: balance,
            });
        }
        write_value(state, &key, &balance)
    }

    /// Unlocks and returns the caller's security deposit on leave.
    ///
    /// Called by: host. The endpoint registration is removed in the same
    /// call so a deposit-less host never stays discoverable.
    pub fn withdraw(
        &self,
        state: &mut dyn StateAccess,
        outbox: &mut Outbox,
        db: DbId,
        ctx: &CallContext,
    ) -> Result<(), ContractError> {
        Self::require_known_db(state, db)?;
        let key = deposit_key(db, &ctx.caller);
        let deposit: Money = read_value(state, &key)?.ok_or(ContractError::NoDeposit)?;
        state.delete(&key)?;
        state.delete(&api_key(db, &ctx.caller))?;
        outbox.transfer(ctx.caller.clone(), deposit);
        Ok(())
    }

    /// Registers, replaces or (with an empty URI) removes the caller's API
    /// endpoint for `db`.
    ///
    /// Called by: host. Requires a full security deposit.
    pub fn register_api(
        &self,
        state: &mut dyn StateAccess,
        db: DbId,
        uri: ApiEndpoint,
        ctx: &CallContext,
    ) -> Result<(), ContractError> {
        Self::require_known_db(state, db)?;
        let deposit = read_money(state, &deposit_key(db, &ctx.caller))?;
        if deposit < SECURITY_DEPOSIT {
            return Err(ContractError::InsufficientDeposit {
                required: SECURITY_DEPOSIT,
                got: deposit,
            });
        }
        let key = api_key(db, &ctx.caller);
        if uri.is_empty() {
            state.delete(&key)?;
        } else {
            write_value(state, &key, &uri)?;
        }
        Ok(())
    }

    /// Views all registered databases.
    pub fn databases(
        &self,
        state: &dyn StateAccess,
    ) -> Result<BTreeMap<DbId, Manifest>, ContractError> {
        let mut out = BTreeMap::new();
        for item in state.prefix_scan(DB_MANIFEST_PREFIX)? {
            let (key, value) = item?;
            let id_bytes: [u8; 8] = key
                .get(DB_MANIFEST_PREFIX.len()..)
                .and_then(|suffix| suffix.try_into().ok())
                .ok_or_else(|| StateError::InvalidValue("malformed manifest key".into()))?;
            let manifest: Manifest =
                codec::from_bytes_canonical(&value).map_err(StateError::Decode)?;
            out.insert(DbId(u64::from_be_bytes(id_bytes)), manifest);
        }
        Ok(out)
    }

    /// Views all registered API endpoints for a database.
    pub fn discover(
        &self,
        state: &dyn StateAccess,
        db: DbId,
    ) -> Result<Vec<ApiEndpoint>, ContractError> {
        Self::require_known_db(state, db)?;
        let mut uris = Vec::new();
        for item in state.prefix_scan(&api_scan_prefix(db))? {
            let (_, value) = item?;
            uris.push(codec::from_bytes_canonical(&value).map_err(StateError::Decode)?);
        }
        Ok(uris)
    }

    /// Escrows the attached amount as fee for query `query` on `db` and
    /// fixes the settlement window.
    ///
    /// Called by: user, possibly relayed by a host. The TTL is written
    /// unconditionally: a fee escrow may raise or lower a window that a
    /// prior `settle` initialized.
    pub fn escrow_fee(
        &self,
        state: &mut dyn StateAccess,
        db: DbId,
        query: QueryCid,
        ttl: u64,
        ctx: &CallContext,
    ) -> Result<(), ContractError> {
        Self::require_known_db(state, db)?;
        if ttl < ctx.height {
            return Err(ContractError::Expired {
                ttl,
                height: ctx.height,
            });
        }
        let fee_key = fees_key(db, &query);
        let total = read_money(state, &fee_key)?.saturating_add(ctx.amount);
        write_value(state, &fee_key, &total)?;
        write_value(state, &ttl_key(db, &query), &ttl)
    }

    /// Records the caller's result hash for a pending query.
    ///
    /// Called by: host, after serving the query off-chain. When no fee
    /// escrow has fixed a window yet the call opens one, so the query can be
    /// garbage-collected even if the fee transaction never lands. A
    /// submission after the window closed is dropped silently: hosts
    /// legitimately race the TTL boundary.
    pub fn settle(
        &self,
        state: &mut dyn StateAccess,
        db: DbId,
        query: QueryCid,
        result: ResultCid,
        ctx: &CallContext,
    ) -> Result<(), ContractError> {
        Self::require_known_db(state, db)?;
        let deposit = read_money(state, &deposit_key(db, &ctx.caller))?;
        if deposit < SECURITY_DEPOSIT {
            return Err(ContractError::InsufficientDeposit {
                required: SECURITY_DEPOSIT,
                got: deposit,
            });
        }

        let window_key = ttl_key(db, &query);
        match read_value::<u64>(state, &window_key)? {
            None => {
                write_value(state, &window_key, &(ctx.height + MAX_BLOCKS_TO_SETTLE))?;
            }
            Some(ttl) if ttl <= ctx.height => return Ok(()),
            Some(_) => {}
        }

        let ballot_key = results_key(db, &query);
        let mut ballot: ResultBallot = read_value(state, &ballot_key)?.unwrap_or_default();
        ballot.insert(ctx.caller.clone(), result);
        write_value(state, &ballot_key, &ballot)
    }

    /// Settles every expired query, then pays out the caller's earned fees.
    ///
    /// Called by: host.
    pub fn claim_fees(
        &self,
        state: &mut dyn StateAccess,
        outbox: &mut Outbox,
        ctx: &CallContext,
    ) -> Result<(), ContractError> {
        finalize::finalize_expired(state, ctx.height)?;
        let key = earned_key(&ctx.caller);
        let earned = read_money(state, &key)?;
        if !earned.is_zero() {
            state.delete(&key)?;
            outbox.transfer(ctx.caller.clone(), earned);
        }
        Ok(())
    }

    /// Settles every expired query, then pays out the caller's royalties.
    ///
    /// Called by: developer.
    pub fn claim_royalties(
        &self,
        state: &mut dyn StateAccess,
        outbox: &mut Outbox,
        ctx: &CallContext,
    ) -> Result<(), ContractError> {
        finalize::finalize_expired(state, ctx.height)?;
        let key = royalties_key(&ctx.caller);
        let earned = read_money(state, &key)?;
        if !earned.is_zero() {
            state.delete(&key)?;
            outbox.transfer(ctx.caller.clone(), earned);
        }
        Ok(())
    }

    /// Drains `amount` from the slashed pool to `target`.
    ///
    /// Called by: contract owner.
    pub fn recover(
        &self,
        state: &mut dyn StateAccess,
        outbox: &mut Outbox,
        amount: Money,
        target: AccountId,
        ctx: &CallContext,
    ) -> Result<(), ContractError> {
        let owner: Option<AccountId> = read_value(state, MARKET_OWNER_KEY)?;
        if owner.as_ref() != Some(&ctx.caller) {
            return Err(ContractError::NotOwner);
        }
        let slashed = read_money(state, MARKET_SLASHED_KEY)?;
        if slashed < amount {
            return Err(ContractError::InsufficientFunds {
                requested: amount,
                available: slashed,
            });
        }
        write_value(state, MARKET_SLASHED_KEY, &slashed.saturating_sub(amount))?;
        outbox.transfer(target.clone(), amount);
        info!("recovered {} from slashed pool to {}", amount, target);
        Ok(())
    }

    // --- Dispatch ---

    /// Routes a versioned method call onto the typed operations, decoding
    /// SCALE parameters and encoding the result.
    pub fn handle_call(
        &self,
        state: &mut dyn StateAccess,
        outbox: &mut Outbox,
        method: &str,
        params: &[u8],
        ctx: &CallContext,
    ) -> Result<Vec<u8>, ContractError> {
        match method {
            "deploy@v1" => {
                let p: DeployParams = decode_params(params)?;
                let id = self.deploy(state, p.manifest, ctx)?;
                Ok(codec::to_bytes_canonical(&id))
            }
            "deposit@v1" => {
                let p: DepositParams = decode_params(params)?;
                self.deposit(state, p.db, ctx)?;
                Ok(Vec::new())
            }
            "withdraw@v1" => {
                let p: DepositParams = decode_params(params)?;
                self.withdraw(state, outbox, p.db, ctx)?;
                Ok(Vec::new())
            }
            "register_api@v1" => {
                let p: RegisterApiParams = decode_params(params)?;
                self.register_api(state, p.db, p.uri, ctx)?;
                Ok(Vec::new())
            }
            "databases@v1" => {
                let dbs = self.databases(&*state)?;
                Ok(codec::to_bytes_canonical(&dbs))
            }
            "discover@v1" => {
                let p: DiscoverParams = decode_params(params)?;
                let uris = self.discover(&*state, p.db)?;
                Ok(codec::to_bytes_canonical(&uris))
            }
            "escrow_fee@v1" => {
                let p: EscrowFeeParams = decode_params(params)?;
                self.escrow_fee(state, p.db, p.query, p.ttl, ctx)?;
                Ok(Vec::new())
            }
            "settle@v1" => {
                let p: SettleParams = decode_params(params)?;
                self.settle(state, p.db, p.query, p.result, ctx)?;
                Ok(Vec::new())
            }
            "claim_fees@v1" => {
                self.claim_fees(state, outbox, ctx)?;
                Ok(Vec::new())
            }
            "claim_royalties@v1" => {
                self.claim_royalties(state, outbox, ctx)?;
                Ok(Vec::new())
            }
            "recover@v1" => {
                let p: RecoverParams = decode_params(params)?;
                self.recover(state, outbox, p.amount, p.target, ctx)?;
                Ok(Vec::new())
            }
            _ => Err(ContractError::Unsupported(method.to_string())),
        }
    }

    /// Transactional entry point: runs `handle_call` on a state overlay,
    /// performs the queued transfers, and commits the overlay only when
    /// every step succeeded. Any error leaves the base store untouched; the
    /// host runtime is expected to revert the attached deposit on abort.
    pub fn execute(
        &self,
        state: &mut dyn StateAccess,
        host: &mut dyn HostRuntime,
        method: &str,
        params: &[u8],
        ctx: &CallContext,
    ) -> Result<Vec<u8>, ContractError> {
        let (value, changes, transfers) = {
            let mut overlay = StateOverlay::new(&*state);
            let mut outbox = Outbox::new();
            let value = self.handle_call(&mut overlay, &mut outbox, method, params, ctx)?;
            (value, overlay.into_ordered_batch(), outbox.into_transfers())
        };
        for transfer in &transfers {
            host.transfer_to(&transfer.to, transfer.amount)?;
        }
        let (inserts, deletes) = changes;
        state.batch_apply(&inserts, &deletes)?;
        Ok(value)
    }
}

fn decode_params<T: Decode>(params: &[u8]) -> Result<T, ContractError> {
    codec::from_bytes_canonical(params).map_err(ContractError::Deserialization)
}
