//! Transaction and savepoint control.
//!
//! The commands to send are chosen from the current status only. The status
//! itself is never advanced here; it is recomputed from the reply's status
//! flags after each command.

use crate::protocol::TransactionStatus;

use super::result::QueryResult;

/// Savepoint used for nested transaction scopes.
pub const SAVEPOINT_NAME: &str = "zero_savepoint";

/// Scope of a begin/commit/rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// Top-level transaction (BEGIN / COMMIT / ROLLBACK)
    #[default]
    Transaction,
    /// Savepoint inside an open transaction
    Savepoint,
}

/// Outcome of a transaction control call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    /// Commands were sent; carries the result of the last one
    Completed(QueryResult),
    /// The mode does not apply in the current status; nothing was sent
    Unchanged(TransactionStatus),
}

impl TransactionOutcome {
    /// Transaction status after the call.
    pub fn status(&self) -> TransactionStatus {
        match self {
            TransactionOutcome::Completed(result) => result.transaction_status,
            TransactionOutcome::Unchanged(status) => *status,
        }
    }
}

const BEGIN: &[&str] = &["BEGIN"];
const SAVEPOINT: &[&str] = &["SAVEPOINT zero_savepoint"];
const COMMIT: &[&str] = &["COMMIT"];
const RELEASE: &[&str] = &["RELEASE SAVEPOINT zero_savepoint"];
const ROLLBACK: &[&str] = &["ROLLBACK"];
const ROLLBACK_TO: &[&str] = &[
    "ROLLBACK TO SAVEPOINT zero_savepoint",
    "RELEASE SAVEPOINT zero_savepoint",
];

/// Commands for `begin`, or `None` if the call is a no-op.
pub(crate) fn begin_commands(
    status: TransactionStatus,
    mode: TransactionMode,
) -> Option<&'static [&'static str]> {
    match (mode, status) {
        (TransactionMode::Transaction, TransactionStatus::Idle) => Some(BEGIN),
        (TransactionMode::Savepoint, TransactionStatus::InTransaction) => Some(SAVEPOINT),
        _ => None,
    }
}

/// Commands for `commit`, or `None` if the call is a no-op.
pub(crate) fn commit_commands(
    status: TransactionStatus,
    mode: TransactionMode,
) -> Option<&'static [&'static str]> {
    match (mode, status) {
        (TransactionMode::Transaction, TransactionStatus::InTransaction) => Some(COMMIT),
        (TransactionMode::Savepoint, TransactionStatus::InTransaction) => Some(RELEASE),
        _ => None,
    }
}

/// Commands for `rollback`, or `None` if the call is a no-op.
///
/// A savepoint rollback is two commands; the second must only run if the first succeeded.
pub(crate) fn rollback_commands(
    status: TransactionStatus,
    mode: TransactionMode,
) -> Option<&'static [&'static str]> {
    match (mode, status) {
        (TransactionMode::Transaction, TransactionStatus::InTransaction) => Some(ROLLBACK),
        (TransactionMode::Savepoint, TransactionStatus::InTransaction) => Some(ROLLBACK_TO),
        _ => None,
    }
}
