//! Translation of server replies into results and classified errors.

use crate::error::{Error, Result, ServerError};
use crate::protocol::error_codes;
use crate::protocol::{ColumnDef, ErrPacket, PrepareResponse, Response, StatusFlags, StmtPrepareOk};
use crate::protocol::TransactionStatus;
use crate::row::{FromRow, Row};

/// Uniform outcome of a successful command.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Server-assigned id of the connection that ran the command
    pub connection_id: u32,
    /// Transaction status after the command
    pub transaction_status: TransactionStatus,
    /// Raw status flags of the reply
    pub status_flags: StatusFlags,
    pub num_warnings: u16,
    pub kind: ResultKind,
}

/// Mutation or row-set payload of a [`QueryResult`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResultKind {
    /// The command produced no rows (OK packet)
    Mutation {
        last_insert_id: u64,
        affected_rows: u64,
    },
    /// The command produced a result set
    Rows {
        columns: Vec<ColumnDef>,
        num_rows: u64,
        rows: Vec<Row>,
    },
}

impl QueryResult {
    /// Rows of a row-set result; empty for mutations.
    pub fn rows(&self) -> &[Row] {
        match &self.kind {
            ResultKind::Rows { rows, .. } => rows,
            ResultKind::Mutation { .. } => &[],
        }
    }

    /// Column definitions of a row-set result.
    pub fn columns(&self) -> Option<&[ColumnDef]> {
        match &self.kind {
            ResultKind::Rows { columns, .. } => Some(columns),
            ResultKind::Mutation { .. } => None,
        }
    }

    /// Column names of a row-set result.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns()
            .map(|cols| cols.iter().map(|c| c.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Number of rows returned, or rows affected for mutations.
    pub fn num_rows(&self) -> u64 {
        match &self.kind {
            ResultKind::Rows { num_rows, .. } => *num_rows,
            ResultKind::Mutation { affected_rows, .. } => *affected_rows,
        }
    }

    /// Last insert id of a mutation.
    pub fn last_insert_id(&self) -> Option<u64> {
        match &self.kind {
            ResultKind::Mutation { last_insert_id, .. } => Some(*last_insert_id),
            ResultKind::Rows { .. } => None,
        }
    }

    /// Returns true for row-set results.
    pub fn has_rows(&self) -> bool {
        matches!(self.kind, ResultKind::Rows { .. })
    }

    /// Decode every row.
    pub fn collect<T: FromRow>(&self) -> Result<Vec<T>> {
        self.rows().iter().map(T::from_row).collect()
    }
}

/// Server error names that turn a recoverable error into a disconnect.
#[derive(Debug, Clone)]
pub struct DisconnectPolicy {
    names: Vec<String>,
}

impl DisconnectPolicy {
    /// Always-present names.
    pub const BUILT_IN: &'static [&'static str] = &["ER_MAX_PREPARED_STMT_COUNT_REACHED"];

    /// Build the policy from the built-in set plus configured names.
    pub fn new(extra: &[String]) -> Self {
        let mut names: Vec<String> = Self::BUILT_IN.iter().map(|s| s.to_string()).collect();
        for name in extra {
            if error_codes::code_of(name).is_none() {
                tracing::warn!(name = name.as_str(), "unknown server error name in disconnect_on_error_codes");
            }
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        Self { names }
    }

    /// Returns true if errors with this name force a disconnect.
    pub fn contains(&self, name: Option<&str>) -> bool {
        name.is_some_and(|name| self.names.iter().any(|n| n == name))
    }

    /// Configured names, built-in first.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for DisconnectPolicy {
    fn default() -> Self {
        Self::new(&[])
    }
}

/// Converts replies into results or classified errors for one connection.
pub struct ResultTranslator<'a> {
    connection_id: u32,
    policy: &'a DisconnectPolicy,
}

impl<'a> ResultTranslator<'a> {
    pub fn new(connection_id: u32, policy: &'a DisconnectPolicy) -> Self {
        Self {
            connection_id,
            policy,
        }
    }

    /// Translate the reply to a query, execute, fetch or reset command.
    pub fn translate(&self, response: Result<Response>, statement: &str) -> Result<QueryResult> {
        match response {
            Err(e) => Err(self.transport_failure(e)),
            Ok(Response::Ok(ok)) => Ok(QueryResult {
                connection_id: self.connection_id,
                transaction_status: TransactionStatus::from_flags(ok.status_flags),
                status_flags: ok.status_flags,
                num_warnings: ok.num_warnings,
                kind: ResultKind::Mutation {
                    last_insert_id: ok.last_insert_id,
                    affected_rows: ok.affected_rows,
                },
            }),
            Ok(Response::ResultSet(set)) => Ok(QueryResult {
                connection_id: self.connection_id,
                transaction_status: TransactionStatus::from_flags(set.status_flags),
                status_flags: set.status_flags,
                num_warnings: set.num_warnings,
                kind: ResultKind::Rows {
                    num_rows: set.num_rows(),
                    columns: set.columns,
                    rows: set.rows,
                },
            }),
            Ok(Response::Err(packet)) => Err(self.server_error(packet, statement)),
            Ok(Response::MultipleResultSets(sets)) => {
                tracing::error!(count = sets.len(), statement, "multiple result sets in one reply");
                Err(Error::Protocol(format!(
                    "expected a single result set, got {}",
                    sets.len()
                )))
            }
        }
    }

    /// Translate the reply to a prepare command.
    pub fn translate_prepare(
        &self,
        response: Result<PrepareResponse>,
        statement: &str,
    ) -> Result<StmtPrepareOk> {
        match response {
            Err(e) => Err(self.transport_failure(e)),
            Ok(PrepareResponse::Ok(ok)) => Ok(ok),
            Ok(PrepareResponse::Err(packet)) => match self.server_error(packet, statement) {
                Error::Server(e) if e.is_unsupported_prepared_statement() => {
                    tracing::debug!(statement, "server cannot prepare statement");
                    Err(Error::PreparedStatementUnsupported(e))
                }
                other => Err(other),
            },
        }
    }

    /// Build a server error and apply the disconnect policy.
    pub fn server_error(&self, packet: ErrPacket, statement: &str) -> Error {
        let error = ServerError {
            code: packet.code,
            name: error_codes::name_of(packet.code),
            sql_state: packet.sql_state,
            message: packet.message,
            statement: Some(statement.to_string()),
            connection_id: self.connection_id,
        };
        if self.policy.contains(error.name) {
            tracing::warn!(
                connection_id = self.connection_id,
                code = error.code,
                "server error forces disconnect"
            );
            Error::Server(error).disconnect()
        } else {
            Error::Server(error)
        }
    }

    /// Classify a transport failure. These are never recoverable.
    pub fn transport_failure(&self, error: Error) -> Error {
        tracing::warn!(connection_id = self.connection_id, error = %error, "transport failure");
        error.disconnect()
    }
}
