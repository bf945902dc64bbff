//! Synchronous MySQL session.

mod conn;
mod pool;
mod transaction;

pub use conn::Conn;
pub use pool::{Pool, PooledConn};
pub use transaction::Transaction;
