//! # Querynet Contract Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
#![forbid(unsafe_code)]

//! # Querynet Contract
//!
//! The settlement contract of the querynet marketplace: independent hosts
//! execute queries against developer-deployed databases on behalf of paying
//! users, and this contract escrows the fees, collects per-host result
//! votes, pays out the super-majority, slashes dishonest minorities and
//! garbage-collects expired queries.
//!
//! The contract is a pure state machine over the host-runtime traits of
//! `querynet-api`; it performs no I/O, verifies no signatures and executes
//! no queries.

pub mod market;
