//! Marketplace value types and node-facing wire records.
//!
//! Everything here is a plain value: the contract compares, orders and hashes
//! these types but never interprets their contents beyond what the settlement
//! rules require. All consensus-critical types carry both the SCALE derives
//! (for canonical state encoding) and serde derives (for host tooling).

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The number of basis points in one whole: 10_000 bips = 100%.
pub const BIPS_DENOMINATOR: u64 = 10_000;

/// A human-readable identifier of an on-chain account.
///
/// The host chain authenticates callers before invoking the contract, so the
/// contract treats account ids as opaque ordered strings.
#[derive(
    Encode, Decode, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default,
    Hash,
)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    /// Returns true for the empty sentinel (e.g. an unset manifest author).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The account id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The public key a call was signed with.
///
/// Carried in the call context for completeness; the contract never verifies
/// signatures itself.
#[derive(
    Encode, Decode, Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default, Hash,
)]
#[serde(transparent)]
pub struct Pubkey(pub String);

impl From<&str> for Pubkey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A non-negative quantity of the chain's base token, in yocto denomination.
///
/// Multiplication saturates and division truncates toward zero; the payout
/// and slashing arithmetic depends on exactly those integer semantics, so
/// they live here rather than at the call sites.
#[derive(
    Encode,
    Decode,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    Default,
    Hash,
)]
#[serde(transparent)]
pub struct Money(pub u128);

impl Money {
    /// The zero amount.
    pub const ZERO: Money = Money(0);

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating multiplication by a plain integer factor.
    pub fn mul(self, n: u64) -> Money {
        Money(self.0.saturating_mul(n as u128))
    }

    /// Division by a plain integer divisor, truncating toward zero.
    ///
    /// A zero divisor yields zero rather than trapping; the settlement rules
    /// never divide by zero but a defect must not take the chain down.
    pub fn div(self, n: u64) -> Money {
        if n == 0 {
            return Money::ZERO;
        }
        Money(self.0 / n as u128)
    }

    /// Saturating addition.
    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction; never underflows below zero.
    pub fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// The smaller of two amounts.
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }
}

impl From<u128> for Money {
    fn from(v: u128) -> Self {
        Money(v)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monotonically assigned database identifier, starting at 0.
#[derive(
    Encode,
    Decode,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    Default,
    Hash,
)]
#[serde(transparent)]
pub struct DbId(pub u64);

impl DbId {
    /// The id that follows this one.
    pub fn next(self) -> DbId {
        DbId(self.0 + 1)
    }

    /// Big-endian key bytes, so lexicographic scan order equals numeric order.
    pub fn to_key_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl core::fmt::Display for DbId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! opaque_cid {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Encode,
            Decode,
            Serialize,
            Deserialize,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Debug,
            Default,
            Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub Vec<u8>);

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.as_bytes().to_vec())
            }
        }

        impl From<Vec<u8>> for $name {
            fn from(b: Vec<u8>) -> Self {
                Self(b)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", hex::encode(&self.0))
            }
        }
    };
}

opaque_cid!(
    /// Content hash of a query, as published by the querying user.
    QueryCid
);
opaque_cid!(
    /// Content hash of a query result, as voted on by hosts.
    ResultCid
);
opaque_cid!(
    /// Content hash of a database's code/schema bundle.
    CodeCid
);

/// A host's API endpoint URI. The empty string is the unregister sentinel.
#[derive(
    Encode, Decode, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default,
    Hash,
)]
#[serde(transparent)]
pub struct ApiEndpoint(pub String);

impl ApiEndpoint {
    /// Returns true for the unregister sentinel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ApiEndpoint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Immutable metadata of a deployed database.
#[derive(Encode, Decode, Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default)]
pub struct Manifest {
    /// The royalty recipient. An empty author is replaced with the deploying
    /// caller at deploy time.
    pub author: AccountId,
    /// Human-readable database name.
    pub name: String,
    /// License string, uninterpreted.
    pub license: String,
    /// Content hash of the database code bundle.
    pub code_cid: CodeCid,
    /// Royalty in basis points, in `[0, 10_000]`. Unsigned on the wire, so
    /// negative values are unrepresentable; out-of-range values are rejected
    /// at deploy time.
    pub royalty_bips: u16,
}

/// A query as submitted to an off-chain query node.
///
/// The node protocol itself (transport, retries, result hashing) lives
/// outside this repository; the record is defined here because the contract
/// and the node must agree on its shape.
#[derive(Encode, Decode, Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct SignedQuery {
    /// Target database.
    pub db: DbId,
    /// The query text, uninterpreted by the contract.
    pub query: String,
    /// Content hash of the query.
    pub cid: QueryCid,
    /// Pre-signed fee transaction the node broadcasts on the user's behalf.
    pub fee_tx: Vec<u8>,
}

/// A node's response to a [`SignedQuery`].
#[derive(Encode, Decode, Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct SignedResult {
    /// Echo of the query hash.
    pub query_cid: QueryCid,
    /// Content hash of the serialized result.
    pub result_cid: ResultCid,
    /// The opaque result payload; hashed, never inspected.
    pub result: Vec<u8>,
    /// The node's signature over the record.
    pub signature: Vec<u8>,
}
