//! Server reply packets, as decoded by a transport.

use crate::row::Row;

use super::types::StatusFlags;

/// Handshake information captured by the transport while connecting.
#[derive(Debug, Clone, Default)]
pub struct ServerHandshake {
    /// Server-assigned connection (thread) id
    pub connection_id: u32,
    /// Server version string
    pub server_version: String,
    /// Status flags from the final OK packet of the handshake
    pub status_flags: StatusFlags,
}

/// OK packet - a command completed without producing rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OkPacket {
    pub affected_rows: u64,
    pub last_insert_id: u64,
    pub status_flags: StatusFlags,
    pub num_warnings: u16,
    /// Human-readable status information
    pub info: String,
}

/// ERR packet - the server rejected the command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrPacket {
    pub code: u16,
    pub sql_state: Option<String>,
    pub message: String,
}

/// Column definition packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column alias as seen by the client
    pub name: String,
    /// Original column name
    pub org_name: String,
    /// Table alias
    pub table: String,
    /// Column type byte (MYSQL_TYPE_*)
    pub column_type: u8,
    /// Column flags (NOT_NULL, UNSIGNED, ...)
    pub flags: u16,
    pub character_set: u16,
    pub column_length: u32,
    pub decimals: u8,
}

impl ColumnDef {
    /// Create a column definition with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A complete result set: column definitions, rows, and the terminator's flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Row>,
    pub status_flags: StatusFlags,
    pub num_warnings: u16,
}

impl ResultSet {
    /// Number of rows carried by this result set.
    pub fn num_rows(&self) -> u64 {
        self.rows.len() as u64
    }
}

/// Reply to COM_QUERY, COM_STMT_EXECUTE, COM_STMT_FETCH, COM_STMT_RESET and COM_PING.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok(OkPacket),
    Err(ErrPacket),
    ResultSet(ResultSet),
    /// The server sent more than one result set for a single command
    MultipleResultSets(Vec<ResultSet>),
}

/// COM_STMT_PREPARE_OK packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StmtPrepareOk {
    pub statement_id: u32,
    pub num_columns: u16,
    pub num_params: u16,
    pub num_warnings: u16,
}

/// Reply to COM_STMT_PREPARE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareResponse {
    Ok(StmtPrepareOk),
    Err(ErrPacket),
}
