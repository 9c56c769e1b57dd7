//! End-to-end settlement flows against the in-memory host bench.

mod common;

use common::{manifest, Bench};
use querynet_api::state::StateAccess;
use querynet_types::error::ContractError;
use querynet_types::market::{AccountId, Money, QueryCid, ResultCid};

const DAO: &str = "dao.near";
const DEV: &str = "dev.near";
const USER: &str = "user.near";

#[test]
fn single_host_unanimous_payout_with_royalty() {
    let mut bench = Bench::new(DAO);

    let db = bench.deploy(DEV, 1, manifest(DEV, 1000)).unwrap();
    bench.deposit("h1", 10_000, 2, db).unwrap();
    bench.register("h1", 3, db, "u1").unwrap();

    let q = QueryCid::from("cid-Q");
    bench.escrow(USER, 1_000_000, 10, db, &q, 110).unwrap();
    bench.settle("h1", 11, db, &q, &ResultCid::from("cid-R")).unwrap();

    bench.claim_fees("h1", 200).unwrap();

    // 10% royalty off the top, the rest to the only voter
    assert_eq!(bench.host.balance_of(&AccountId::from("h1")), Money(900_000));
    assert_eq!(bench.royalties(DEV), Money(100_000));
    assert!(!bench.has_pending(db, &q));
    assert_eq!(bench.slashed(), Money::ZERO);

    bench.claim_royalties(DEV, 201).unwrap();
    assert_eq!(bench.host.balance_of(&AccountId::from(DEV)), Money(100_000));
    assert_eq!(bench.royalties(DEV), Money::ZERO);
}

#[test]
fn two_against_one_pays_majority_and_slashes_minority() {
    let mut bench = Bench::new(DAO);

    let db = bench.deploy(DEV, 1, manifest(DEV, 0)).unwrap();
    for host in ["h1", "h2", "h3"] {
        bench.deposit(host, 10_000, 2, db).unwrap();
    }

    let q = QueryCid::from("cid-Q");
    bench.escrow(USER, 1000, 10, db, &q, 110).unwrap();
    let good = ResultCid::from("cid-A");
    bench.settle("h1", 11, db, &q, &good).unwrap();
    bench.settle("h2", 12, db, &q, &good).unwrap();
    bench.settle("h3", 13, db, &q, &ResultCid::from("cid-B")).unwrap();

    bench.claim_fees("h1", 200).unwrap();

    // share = 10000/2 bips; each winner earns 1000 * 5000 / 10000 = 500
    assert_eq!(bench.host.balance_of(&AccountId::from("h1")), Money(500));
    assert_eq!(bench.earned("h2"), Money(500));
    assert_eq!(bench.earned("h3"), Money::ZERO);

    // the nominal slash (10x deposit) saturates at the whole deposit
    assert_eq!(bench.deposit_of(db, "h3"), Money::ZERO);
    assert_eq!(bench.slashed(), Money(10_000));
    assert_eq!(bench.deposit_of(db, "h1"), Money(10_000));
    assert_eq!(bench.deposit_of(db, "h2"), Money(10_000));
    assert!(!bench.has_pending(db, &q));
}

#[test]
fn three_way_tie_forfeits_the_fee() {
    let mut bench = Bench::new(DAO);

    let db = bench.deploy(DEV, 1, manifest(DEV, 0)).unwrap();
    for host in ["h1", "h2", "h3"] {
        bench.deposit(host, 10_000, 2, db).unwrap();
    }

    let q = QueryCid::from("cid-Q");
    bench.escrow(USER, 1000, 10, db, &q, 110).unwrap();
    bench.settle("h1", 11, db, &q, &ResultCid::from("cid-A")).unwrap();
    bench.settle("h2", 12, db, &q, &ResultCid::from("cid-B")).unwrap();
    bench.settle("h3", 13, db, &q, &ResultCid::from("cid-C")).unwrap();

    bench.claim_fees("h1", 200).unwrap();

    // nobody gets paid and nobody is slashed; the fee is forfeited
    for host in ["h1", "h2", "h3"] {
        assert_eq!(bench.earned(host), Money::ZERO);
        assert_eq!(bench.deposit_of(db, host), Money(10_000));
    }
    assert_eq!(bench.slashed(), Money(1000));
    assert!(!bench.has_pending(db, &q));
}

#[test]
fn late_settle_is_a_silent_noop() {
    let mut bench = Bench::new(DAO);

    let db = bench.deploy(DEV, 1, manifest(DEV, 0)).unwrap();
    bench.deposit("h1", 10_000, 2, db).unwrap();

    let q = QueryCid::from("cid-Q");
    bench.escrow(USER, 10, 10, db, &q, 100).unwrap();

    // height 101 is past the window: accepted, but no vote is recorded
    bench.settle("h1", 101, db, &q, &ResultCid::from("cid-R")).unwrap();
    assert!(bench
        .state
        .get(&querynet_types::keys::results_key(db, &q))
        .unwrap()
        .is_none());

    // finalization forfeits the fee since no results were collected
    bench.claim_fees("h1", 200).unwrap();
    assert_eq!(bench.earned("h1"), Money::ZERO);
    assert_eq!(bench.slashed(), Money(10));
}

#[test]
fn expired_escrow_aborts_without_side_effects() {
    let mut bench = Bench::new(DAO);

    let db = bench.deploy(DEV, 1, manifest(DEV, 0)).unwrap();
    let q = QueryCid::from("cid-Q");

    let err = bench.escrow(USER, 50, 10, db, &q, 5).unwrap_err();
    assert!(matches!(err, ContractError::Expired { ttl: 5, height: 10 }));
    assert!(!bench.has_pending(db, &q));
    // the attachment was reverted to the user
    assert_eq!(bench.host.contract_balance, Money::ZERO);
    assert_eq!(bench.host.balance_of(&AccountId::from(USER)), Money(50));
}

#[test]
fn recover_is_owner_gated_and_exact() {
    let mut bench = Bench::new(DAO);

    // fund the slashed pool through a tied election
    let db = bench.deploy(DEV, 1, manifest(DEV, 0)).unwrap();
    bench.deposit("h1", 10_000, 2, db).unwrap();
    bench.deposit("h2", 10_000, 2, db).unwrap();
    let q = QueryCid::from("cid-Q");
    bench.escrow(USER, 900, 10, db, &q, 110).unwrap();
    bench.settle("h1", 11, db, &q, &ResultCid::from("cid-A")).unwrap();
    bench.settle("h2", 12, db, &q, &ResultCid::from("cid-B")).unwrap();
    bench.claim_fees("h1", 200).unwrap();
    assert_eq!(bench.slashed(), Money(900));

    assert!(matches!(
        bench.recover(DEV, 201, 1, "treasury.near").unwrap_err(),
        ContractError::NotOwner
    ));
    assert!(matches!(
        bench.recover(DAO, 202, 901, "treasury.near").unwrap_err(),
        ContractError::InsufficientFunds { .. }
    ));

    bench.recover(DAO, 203, 600, "treasury.near").unwrap();
    assert_eq!(bench.slashed(), Money(300));
    assert_eq!(
        bench.host.balance_of(&AccountId::from("treasury.near")),
        Money(600)
    );
}

#[test]
fn escrow_after_settle_reschedules_the_window() {
    let mut bench = Bench::new(DAO);

    let db = bench.deploy(DEV, 1, manifest(DEV, 0)).unwrap();
    bench.deposit("h1", 10_000, 2, db).unwrap();

    // settle first: the window opens at height + 120
    let q = QueryCid::from("cid-Q");
    bench.settle("h1", 10, db, &q, &ResultCid::from("cid-R")).unwrap();

    // a late escrow pulls the window in; the vote already cast survives
    bench.escrow(USER, 400, 20, db, &q, 30).unwrap();

    bench.claim_fees("h1", 31).unwrap();
    assert_eq!(bench.host.balance_of(&AccountId::from("h1")), Money(400));
    assert!(!bench.has_pending(db, &q));
}

#[test]
fn claims_settle_every_expired_query_at_once() {
    let mut bench = Bench::new(DAO);

    let db = bench.deploy(DEV, 1, manifest(DEV, 0)).unwrap();
    bench.deposit("h1", 10_000, 2, db).unwrap();

    let q1 = QueryCid::from("cid-1");
    let q2 = QueryCid::from("cid-2");
    bench.escrow(USER, 100, 10, db, &q1, 50).unwrap();
    bench.escrow(USER, 200, 10, db, &q2, 60).unwrap();
    bench.settle("h1", 11, db, &q1, &ResultCid::from("r1")).unwrap();
    bench.settle("h1", 12, db, &q2, &ResultCid::from("r2")).unwrap();

    // only q1 is expired at height 55
    bench.claim_fees("h1", 55).unwrap();
    assert_eq!(bench.host.balance_of(&AccountId::from("h1")), Money(100));
    assert!(!bench.has_pending(db, &q1));
    assert!(bench.has_pending(db, &q2));

    bench.claim_fees("h1", 61).unwrap();
    assert_eq!(bench.host.balance_of(&AccountId::from("h1")), Money(300));
    assert!(!bench.has_pending(db, &q2));
}
