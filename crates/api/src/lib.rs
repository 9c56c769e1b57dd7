//! # Querynet API Crate Lints
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

//! # Querynet API
//!
//! The surface between the settlement contract and its host runtime: the
//! [`state::StateAccess`] key-value trait, the copy-on-write
//! [`state::StateOverlay`] that gives every call all-or-nothing semantics,
//! the per-invocation [`context::CallContext`], and the
//! [`runtime::HostRuntime`] transfer primitive with its queued-transfer
//! [`runtime::Outbox`].
//!
//! The contract never talks to a concrete store or token ledger; it only
//! sees the traits defined here. Hosts embed the contract by implementing
//! `StateAccess` over their native KV store and `HostRuntime` over their
//! native balance-transfer primitive.

/// The ambient per-call context supplied by the host runtime.
pub mod context;
/// The host transfer primitive and the per-call transfer outbox.
pub mod runtime;
/// State access traits, the transactional overlay and the in-memory backend.
pub mod state;
/// Mock host runtime for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
