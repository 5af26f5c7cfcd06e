//! # Error Module
//!
//! Every failure aborts the enclosing operation with no state change.
//! There is no local recovery; callers decide whether to resubmit.

use crate::{Holder, IdentityId};
use thiserror::Error;

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors produced by the evaluation ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A raw point, skill index or batch length is outside its domain.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// The referenced identity has no token.
    #[error("identity {0} is not minted")]
    NotMinted(IdentityId),

    /// The caller lacks the required identity or administrative relationship.
    #[error("{caller} is not permitted to {action}")]
    NotOwner { caller: Holder, action: &'static str },

    /// The mint target already holds an identity.
    #[error("{0} already holds an identity")]
    AlreadyExists(Holder),

    /// Normalization against a rater whose standard deviation is zero.
    #[error("rater {rater} has zero deviation for skill {skill}")]
    DivisionByZero { rater: IdentityId, skill: usize },

    /// A normalized score does not fit the 8-bit score range.
    #[error("normalized score {0} does not fit in 8 bits")]
    NarrowingOverflow(i64),

    /// Identities never move between holders.
    #[error("identity {0} is non-transferable")]
    NonTransferable(IdentityId),

    /// The receiver capability check refused the token.
    #[error("{0} does not accept identity tokens")]
    ReceiverRejected(Holder),

    /// A checked integer operation overflowed.
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// Snapshot bytes are malformed or inconsistent.
    #[error("format error: {0}")]
    Format(String),

    /// The persistent store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Shorthand for a permission failure.
    #[must_use]
    pub fn not_owner(caller: &Holder, action: &'static str) -> Self {
        Self::NotOwner {
            caller: caller.clone(),
            action,
        }
    }
}

impl From<postcard::Error> for LedgerError {
    fn from(err: postcard::Error) -> Self {
        Self::Format(err.to_string())
    }
}

impl From<redb::Error> for LedgerError {
    fn from(err: redb::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

macro_rules! storage_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for LedgerError {
                fn from(err: $ty) -> Self {
                    Self::Storage(err.to_string())
                }
            }
        )*
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_owner_message_names_caller_and_action() {
        let err = LedgerError::not_owner(&Holder::new("mallory"), "evaluate");
        assert_eq!(err.to_string(), "mallory is not permitted to evaluate");
    }

    #[test]
    fn division_by_zero_message() {
        let err = LedgerError::DivisionByZero {
            rater: IdentityId(7),
            skill: 2,
        };
        assert_eq!(err.to_string(), "rater 7 has zero deviation for skill 2");
    }
}
