//! Shared test bench: an in-memory host chain around the contract.
#![allow(dead_code)] // each test binary uses a different slice of the bench

use querynet_api::context::CallContext;
use querynet_api::state::{MemoryState, StateAccess};
use querynet_api::test_utils::MockHost;
use querynet_contract::market::{
    DeployParams, DepositParams, DiscoverParams, EscrowFeeParams, QueryMarketService,
    RecoverParams, RegisterApiParams, SettleParams,
};
use querynet_types::codec;
use querynet_types::error::ContractError;
use querynet_types::keys;
use querynet_types::market::{
    AccountId, ApiEndpoint, DbId, Manifest, Money, QueryCid, ResultCid,
};

/// An in-memory stand-in for the host chain: state store, balance ledger and
/// the attached-deposit credit/refund cycle around every call.
pub struct Bench {
    pub svc: QueryMarketService,
    pub state: MemoryState,
    pub host: MockHost,
    /// Sum of attached amounts of calls that did not abort.
    pub total_attached: Money,
}

impl Bench {
    pub fn new(owner: &str) -> Self {
        let svc = QueryMarketService;
        let mut state = MemoryState::new();
        svc.init_genesis(&mut state, AccountId::from(owner)).unwrap();
        Self {
            svc,
            state,
            host: MockHost::new(),
            total_attached: Money::ZERO,
        }
    }

    /// Executes one contract call with an attached amount, reverting the
    /// attachment when the call aborts, as the host chain would.
    pub fn call(
        &mut self,
        caller: &str,
        amount: u128,
        height: u64,
        method: &str,
        params: Vec<u8>,
    ) -> Result<Vec<u8>, ContractError> {
        let ctx = CallContext::new(caller, Money(amount), height);
        self.host.credit_contract(Money(amount));
        let res = self
            .svc
            .execute(&mut self.state, &mut self.host, method, &params, &ctx);
        match &res {
            Ok(_) => self.total_attached = self.total_attached.saturating_add(Money(amount)),
            Err(_) => self.host.refund(&ctx.caller, Money(amount)),
        }
        res
    }

    // --- typed call wrappers ---

    pub fn deploy(
        &mut self,
        caller: &str,
        height: u64,
        manifest: Manifest,
    ) -> Result<DbId, ContractError> {
        let params = codec::to_bytes_canonical(&DeployParams { manifest });
        let ret = self.call(caller, 0, height, "deploy@v1", params)?;
        Ok(codec::from_bytes_canonical(&ret).unwrap())
    }

    pub fn deposit(
        &mut self,
        caller: &str,
        amount: u128,
        height: u64,
        db: DbId,
    ) -> Result<(), ContractError> {
        let params = codec::to_bytes_canonical(&DepositParams { db });
        self.call(caller, amount, height, "deposit@v1", params).map(drop)
    }

    pub fn withdraw(&mut self, caller: &str, height: u64, db: DbId) -> Result<(), ContractError> {
        let params = codec::to_bytes_canonical(&DepositParams { db });
        self.call(caller, 0, height, "withdraw@v1", params).map(drop)
    }

    pub fn register(
        &mut self,
        caller: &str,
        height: u64,
        db: DbId,
        uri: &str,
    ) -> Result<(), ContractError> {
        let params = codec::to_bytes_canonical(&RegisterApiParams {
            db,
            uri: ApiEndpoint::from(uri),
        });
        self.call(caller, 0, height, "register_api@v1", params).map(drop)
    }

    pub fn discover(&mut self, height: u64, db: DbId) -> Result<Vec<ApiEndpoint>, ContractError> {
        let params = codec::to_bytes_canonical(&DiscoverParams { db });
        let ret = self.call("viewer.near", 0, height, "discover@v1", params)?;
        Ok(codec::from_bytes_canonical(&ret).unwrap())
    }

    pub fn escrow(
        &mut self,
        caller: &str,
        amount: u128,
        height: u64,
        db: DbId,
        query: &QueryCid,
        ttl: u64,
    ) -> Result<(), ContractError> {
        let params = codec::to_bytes_canonical(&EscrowFeeParams {
            db,
            query: query.clone(),
            ttl,
        });
        self.call(caller, amount, height, "escrow_fee@v1", params).map(drop)
    }

    pub fn settle(
        &mut self,
        caller: &str,
        height: u64,
        db: DbId,
        query: &QueryCid,
        result: &ResultCid,
    ) -> Result<(), ContractError> {
        let params = codec::to_bytes_canonical(&SettleParams {
            db,
            query: query.clone(),
            result: result.clone(),
        });
        self.call(caller, 0, height, "settle@v1", params).map(drop)
    }

    pub fn claim_fees(&mut self, caller: &str, height: u64) -> Result<(), ContractError> {
        self.call(caller, 0, height, "claim_fees@v1", Vec::new()).map(drop)
    }

    pub fn claim_royalties(&mut self, caller: &str, height: u64) -> Result<(), ContractError> {
        self.call(caller, 0, height, "claim_royalties@v1", Vec::new()).map(drop)
    }

    pub fn recover(
        &mut self,
        caller: &str,
        height: u64,
        amount: u128,
        target: &str,
    ) -> Result<(), ContractError> {
        let params = codec::to_bytes_canonical(&RecoverParams {
            amount: Money(amount),
            target: AccountId::from(target),
        });
        self.call(caller, 0, height, "recover@v1", params).map(drop)
    }

    // --- state readers ---

    fn read_money_at(&self, key: &[u8]) -> Money {
        self.state
            .get(key)
            .unwrap()
            .map(|b| codec::from_bytes_canonical(&b).unwrap())
            .unwrap_or_default()
    }

    pub fn slashed(&self) -> Money {
        self.read_money_at(keys::MARKET_SLASHED_KEY)
    }

    pub fn earned(&self, account: &str) -> Money {
        self.read_money_at(&keys::earned_key(&AccountId::from(account)))
    }

    pub fn royalties(&self, account: &str) -> Money {
        self.read_money_at(&keys::royalties_key(&AccountId::from(account)))
    }

    pub fn deposit_of(&self, db: DbId, host: &str) -> Money {
        self.read_money_at(&keys::deposit_key(db, &AccountId::from(host)))
    }

    /// True while any of the three pending entries of (db, query) exists.
    pub fn has_pending(&self, db: DbId, query: &QueryCid) -> bool {
        self.state.get(&keys::fees_key(db, query)).unwrap().is_some()
            || self.state.get(&keys::results_key(db, query)).unwrap().is_some()
            || self.state.get(&keys::ttl_key(db, query)).unwrap().is_some()
    }

    /// Sums every `Money` value stored under a key prefix.
    pub fn sum_prefix(&self, prefix: &[u8]) -> Money {
        self.state
            .prefix_scan(prefix)
            .unwrap()
            .map(|item| {
                let (_, value) = item.unwrap();
                codec::from_bytes_canonical::<Money>(&value).unwrap()
            })
            .fold(Money::ZERO, |acc, m| acc.saturating_add(m))
    }

    /// Everything the contract still holds: deposits, escrowed fees,
    /// claimable balances and the slashed pool.
    pub fn held_by_contract(&self) -> Money {
        self.sum_prefix(keys::DEPOSIT_PREFIX)
            .saturating_add(self.sum_prefix(keys::PENDING_FEES_PREFIX))
            .saturating_add(self.sum_prefix(keys::SETTLED_FEES_PREFIX))
            .saturating_add(self.sum_prefix(keys::SETTLED_ROYALTIES_PREFIX))
            .saturating_add(self.slashed())
    }
}

pub fn manifest(author: &str, royalty_bips: u16) -> Manifest {
    Manifest {
        author: AccountId::from(author),
        name: "chinook".into(),
        license: "MIT".into(),
        code_cid: querynet_types::market::CodeCid::from("bafy-code"),
        royalty_bips,
    }
}
