//! Cursor protocol state.
//!
//! A cursor turns one prepared statement into a resumable row stream:
//!
//! ```text
//! declare ──► AwaitingFirstFetch ──execute(read-only cursor)──► Streaming ──fetch*──► exhausted
//! ```
//!
//! Whether the stream goes on is decided solely from the server's status
//! flags after each round trip.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::protocol::{ColumnDef, StatusFlags};
use crate::value::Value;

use super::result::QueryResult;

/// Rows fetched per round trip when the caller gives no limit.
pub const DEFAULT_MAX_ROWS: u32 = 500;

/// Caller-visible handle to an open cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorHandle(u64);

impl CursorHandle {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Outcome of a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    /// More rows remain on the server
    Continue(QueryResult),
    /// The stream is exhausted; this is the final batch
    Halt(QueryResult),
}

impl Fetch {
    /// The batch carried by this outcome.
    pub fn result(&self) -> &QueryResult {
        match self {
            Fetch::Continue(result) | Fetch::Halt(result) => result,
        }
    }

    /// Take the batch.
    pub fn into_result(self) -> QueryResult {
        match self {
            Fetch::Continue(result) | Fetch::Halt(result) => result,
        }
    }

    /// Returns true if the stream is exhausted.
    pub fn is_halt(&self) -> bool {
        matches!(self, Fetch::Halt(_))
    }
}

/// Cursor phase.
#[derive(Debug, Clone)]
pub(crate) enum CursorPhase {
    /// Declared but not executed; holds the bound parameters
    AwaitingFirstFetch { params: Vec<Value> },
    /// Executed; holds the column definitions needed by COM_STMT_FETCH
    Streaming { columns: Vec<ColumnDef> },
}

/// Whether to keep fetching after a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Continue,
    Halt,
}

/// Local bookkeeping for an open cursor.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    pub(crate) statement_id: u32,
    pub(crate) statement: Arc<str>,
    pub(crate) phase: CursorPhase,
}

impl Cursor {
    pub(crate) fn new(statement_id: u32, statement: Arc<str>, params: Vec<Value>) -> Self {
        Self {
            statement_id,
            statement,
            phase: CursorPhase::AwaitingFirstFetch { params },
        }
    }

    /// Decide how the stream continues after a batch and advance the phase.
    ///
    /// On error the cursor is left untouched.
    pub(crate) fn advance(&mut self, result: &QueryResult) -> Result<Step> {
        match self.phase {
            CursorPhase::AwaitingFirstFetch { .. } => {
                let Some(columns) = result.columns() else {
                    // Statement produced no rows at all
                    return Ok(Step::Halt);
                };
                let step = after_first_batch(result.status_flags);
                self.phase = CursorPhase::Streaming {
                    columns: columns.to_vec(),
                };
                Ok(step)
            }
            CursorPhase::Streaming { .. } => after_fetch(result.status_flags),
        }
    }
}

/// Decision after the execute that opens the cursor.
pub(crate) fn after_first_batch(flags: StatusFlags) -> Step {
    if flags.contains(StatusFlags::CURSOR_EXISTS) {
        Step::Continue
    } else {
        Step::Halt
    }
}

/// Decision after a COM_STMT_FETCH batch.
///
/// A closed cursor must come with `LAST_ROW_SENT`; anything else would mean
/// the stream ended without the server saying so.
pub(crate) fn after_fetch(flags: StatusFlags) -> Result<Step> {
    if flags.contains(StatusFlags::CURSOR_EXISTS) {
        Ok(Step::Continue)
    } else if flags.contains(StatusFlags::LAST_ROW_SENT) {
        Ok(Step::Halt)
    } else {
        Err(Error::Protocol(format!(
            "cursor closed without LAST_ROW_SENT (status flags {:#06x})",
            flags.bits()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::TransactionStatus;
    use crate::row::Row;
    use crate::state::result::ResultKind;

    fn batch(rows: usize, flags: StatusFlags) -> QueryResult {
        QueryResult {
            connection_id: 1,
            transaction_status: TransactionStatus::Idle,
            status_flags: flags,
            num_warnings: 0,
            kind: ResultKind::Rows {
                columns: vec![ColumnDef::named("n")],
                num_rows: rows as u64,
                rows: vec![Row::default(); rows],
            },
        }
    }

    #[test]
    fn test_first_batch() {
        assert_eq!(after_first_batch(StatusFlags::CURSOR_EXISTS), Step::Continue);
        assert_eq!(after_first_batch(StatusFlags::AUTOCOMMIT), Step::Halt);
    }

    #[test]
    fn test_fetch_batches() {
        assert_eq!(
            after_fetch(StatusFlags::CURSOR_EXISTS).unwrap(),
            Step::Continue
        );
        assert_eq!(after_fetch(StatusFlags::LAST_ROW_SENT).unwrap(), Step::Halt);
        assert!(after_fetch(StatusFlags::AUTOCOMMIT).unwrap_err().is_protocol_fault());
    }

    #[test]
    fn test_advance_moves_to_streaming() {
        let mut cursor = Cursor::new(3, Arc::from("SELECT n FROM t"), vec![Value::Int(1)]);
        let step = cursor
            .advance(&batch(0, StatusFlags::CURSOR_EXISTS))
            .unwrap();
        assert_eq!(step, Step::Continue);
        match &cursor.phase {
            CursorPhase::Streaming { columns } => assert_eq!(columns[0].name, "n"),
            other => panic!("unexpected phase: {other:?}"),
        }
    }

    #[test]
    fn test_advance_fault_leaves_cursor() {
        let mut cursor = Cursor::new(3, Arc::from("SELECT n FROM t"), Vec::new());
        cursor.advance(&batch(0, StatusFlags::CURSOR_EXISTS)).unwrap();
        assert!(cursor.advance(&batch(1, StatusFlags::empty())).is_err());
        assert!(matches!(cursor.phase, CursorPhase::Streaming { .. }));
    }

    #[test]
    fn test_fetch_outcome_accessors() {
        let fetch = Fetch::Halt(batch(2, StatusFlags::LAST_ROW_SENT));
        assert!(fetch.is_halt());
        assert_eq!(fetch.result().num_rows(), 2);
        assert_eq!(fetch.into_result().rows().len(), 2);
    }
}
