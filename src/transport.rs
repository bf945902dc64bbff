//! The command transport a session runs on.
//!
//! A transport owns the socket, the handshake and the packet codec. The session
//! only ever sees decoded replies. Any `Err` returned from a command method is
//! treated as a transport-level failure and tears the session down.

use std::time::Duration;

use crate::error::Result;
use crate::opts::Opts;
use crate::protocol::{ColumnDef, CursorType, PrepareResponse, Response, ServerHandshake};
use crate::value::Value;

/// Typed request/response commands over one physical connection.
pub trait Transport: Sized {
    /// Open a connection and complete the handshake.
    ///
    /// Errors are connect-time failures (unreachable address, authentication).
    fn connect(opts: &Opts) -> Result<Self>;

    /// Handshake information for this connection.
    fn handshake(&self) -> &ServerHandshake;

    /// COM_QUERY: run a statement through the text protocol.
    fn query(&mut self, sql: &str) -> Result<Response>;

    /// COM_STMT_PREPARE.
    fn prepare(&mut self, sql: &str) -> Result<PrepareResponse>;

    /// COM_STMT_EXECUTE.
    fn execute(
        &mut self,
        statement_id: u32,
        params: &[Value],
        cursor: CursorType,
    ) -> Result<Response>;

    /// COM_STMT_FETCH: pull up to `max_rows` rows from an open cursor.
    fn fetch(&mut self, statement_id: u32, columns: &[ColumnDef], max_rows: u32)
    -> Result<Response>;

    /// COM_STMT_CLOSE. The server sends no reply.
    fn close_statement(&mut self, statement_id: u32) -> Result<()>;

    /// COM_STMT_RESET: discard cursor and long-data state of a statement.
    fn reset_statement(&mut self, statement_id: u32) -> Result<Response>;

    /// COM_PING, bounded by `timeout`.
    fn ping(&mut self, timeout: Duration) -> Result<Response>;

    /// COM_QUIT and release the socket.
    fn quit(&mut self) -> Result<()>;
}
