//! Error types for zero-mysql-session.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::error_codes;

/// Result type for zero-mysql-session operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error reported by the server in an ERR packet, enriched with session context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// Numeric server error code (e.g. 1062)
    pub code: u16,
    /// Symbolic name from the fixed code table (e.g. `ER_DUP_ENTRY`), if known
    pub name: Option<&'static str>,
    /// SQLSTATE marker (5 characters), if the server sent one
    pub sql_state: Option<String>,
    /// Human-readable message
    pub message: String,
    /// Statement text that triggered the error
    pub statement: Option<String>,
    /// Server-assigned id of the connection that received the error
    pub connection_id: u32,
}

impl ServerError {
    /// Build a server error, resolving the symbolic name from the code table.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            name: error_codes::name_of(code),
            sql_state: None,
            message: message.into(),
            statement: None,
            connection_id: 0,
        }
    }

    /// Returns true if the server refused to prepare the statement.
    pub fn is_unsupported_prepared_statement(&self) -> bool {
        self.code == error_codes::ER_UNSUPPORTED_PS
    }
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.code)?;
        if let Some(name) = self.name {
            write!(f, " ({})", name)?;
        }
        write!(f, " {}", self.message)?;
        if let Some(sql_state) = &self.sql_state {
            write!(f, " (SQLSTATE {})", sql_state)?;
        }
        if let Some(statement) = &self.statement {
            write!(f, "\nSTATEMENT: {}", statement)?;
        }
        Ok(())
    }
}

/// Error type for zero-mysql-session.
#[derive(Debug, Error)]
pub enum Error {
    /// Server error response; the connection is still usable
    #[error("MySQL error: {0}")]
    Server(ServerError),

    /// The server cannot prepare this statement; a caller may retry it as a text query
    #[error("Prepared statement unsupported: {0}")]
    PreparedStatementUnsupported(ServerError),

    /// The connection must be torn down; the wrapped error is the cause
    #[error("Disconnect: {0}")]
    Disconnect(Box<Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport timed out waiting for a reply
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Transport was closed by the peer
    #[error("Connection closed")]
    Closed,

    /// TLS error
    #[error("TLS error: {0}")]
    Tls(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Protocol error (server behavior this session does not support or expect)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Connection already produced a disconnect instruction and cannot be reused
    #[error("Connection is broken")]
    ConnectionBroken,

    /// Invalid usage (e.g., unknown cursor, wrong parameter count)
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),

    /// Value decoding error
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<std::convert::Infallible> for Error {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}

impl Error {
    /// Wrap an error as a disconnect instruction. Already-fatal errors are not re-wrapped.
    pub fn disconnect(self) -> Self {
        if self.is_disconnect() {
            self
        } else {
            Error::Disconnect(Box::new(self))
        }
    }

    /// Returns true if the pool must close the connection after this error.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Error::Disconnect(_) | Error::ConnectionBroken)
    }

    /// Alias of [`is_disconnect`](Self::is_disconnect).
    pub fn is_connection_broken(&self) -> bool {
        self.is_disconnect()
    }

    /// Returns true for transport-level failures (socket, timeout, TLS).
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Io(_) | Error::Timeout(_) | Error::Closed | Error::Tls(_) => true,
            Error::Disconnect(inner) => inner.is_transport(),
            _ => false,
        }
    }

    /// Returns true for local protocol violations.
    pub fn is_protocol_fault(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }

    /// Get the server error, looking through a disconnect wrapper.
    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            Error::Server(e) | Error::PreparedStatementUnsupported(e) => Some(e),
            Error::Disconnect(inner) => inner.server_error(),
            _ => None,
        }
    }

    /// Get the numeric server error code if this is a server error.
    pub fn server_code(&self) -> Option<u16> {
        self.server_error().map(|e| e.code)
    }

    /// Get the symbolic server error name if this is a server error with a known code.
    pub fn server_error_name(&self) -> Option<&'static str> {
        self.server_error().and_then(|e| e.name)
    }
}
