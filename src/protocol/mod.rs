//! Decoded MySQL protocol packets.
//!
//! Byte-level encoding and decoding is the [`Transport`](crate::transport::Transport)'s job.
//! This module only defines the typed packets a transport hands back to the session.
//!
//! # Structure
//!
//! - `packet`: Server replies (OK, ERR, result sets, prepare OK, handshake)
//! - `types`: Status flags, transaction status, cursor type
//! - `error_codes`: Fixed server error code ↔ name table

pub mod error_codes;
pub mod packet;
pub mod types;

pub use packet::{
    ColumnDef, ErrPacket, OkPacket, PrepareResponse, Response, ResultSet, ServerHandshake,
    StmtPrepareOk,
};
pub use types::{CursorType, StatusFlags, TransactionStatus};
