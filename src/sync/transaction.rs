//! Transaction support for synchronous MySQL sessions.

use super::Conn;
use crate::error::{Error, Result};
use crate::state::transaction::{TransactionMode, TransactionOutcome};
use crate::transport::Transport;

/// An open transaction, handed to the closure of [`Conn::run_transaction`].
///
/// The session is passed to each method to run the command. Methods fail
/// with `Error::InvalidUsage` when given a different session than the one
/// that started the transaction.
pub struct Transaction {
    connection_id: u32,
}

impl Transaction {
    /// Create a new transaction (internal use only).
    pub(crate) fn new(connection_id: u32) -> Self {
        Self { connection_id }
    }

    fn check<T: Transport>(&self, conn: &Conn<T>) -> Result<()> {
        let actual = conn.connection_id();
        if self.connection_id != actual {
            return Err(Error::InvalidUsage(format!(
                "connection mismatch: expected {}, got {}",
                self.connection_id, actual
            )));
        }
        Ok(())
    }

    /// Commit the transaction.
    pub fn commit<T: Transport>(self, conn: &mut Conn<T>) -> Result<()> {
        self.check(conn)?;
        conn.commit(TransactionMode::Transaction)?;
        Ok(())
    }

    /// Roll back the transaction.
    pub fn rollback<T: Transport>(self, conn: &mut Conn<T>) -> Result<()> {
        self.check(conn)?;
        conn.rollback(TransactionMode::Transaction)?;
        Ok(())
    }

    /// Set the savepoint.
    pub fn savepoint<T: Transport>(&self, conn: &mut Conn<T>) -> Result<TransactionOutcome> {
        self.check(conn)?;
        conn.begin(TransactionMode::Savepoint)
    }

    /// Release the savepoint, keeping its changes.
    pub fn release_savepoint<T: Transport>(
        &self,
        conn: &mut Conn<T>,
    ) -> Result<TransactionOutcome> {
        self.check(conn)?;
        conn.commit(TransactionMode::Savepoint)
    }

    /// Undo changes made since the savepoint, then release it.
    pub fn rollback_to_savepoint<T: Transport>(
        &self,
        conn: &mut Conn<T>,
    ) -> Result<TransactionOutcome> {
        self.check(conn)?;
        conn.rollback(TransactionMode::Savepoint)
    }
}
