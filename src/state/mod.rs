//! Sans-I/O session state.
//!
//! These modules decide what a session does next without performing any I/O.
//! The connection in [`crate::sync`] sends the commands they choose and feeds
//! the replies back.

pub mod cursor;
pub mod result;
pub mod transaction;

pub use cursor::{CursorHandle, DEFAULT_MAX_ROWS, Fetch};
pub use result::{DisconnectPolicy, QueryResult, ResultKind, ResultTranslator};
pub use transaction::{SAVEPOINT_NAME, TransactionMode, TransactionOutcome};
