use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;
use std_semaphore::Semaphore;

use crate::error::Result;
use crate::opts::Opts;
use crate::state::transaction::TransactionMode;
use crate::transport::Transport;

use super::Conn;

pub struct Pool<T: Transport> {
    opts: Opts,
    conns: ArrayQueue<Conn<T>>,
    semaphore: Option<Semaphore>,
}

impl<T: Transport> Pool<T> {
    pub fn new(opts: Opts) -> Self {
        let semaphore = opts
            .pool_max_concurrency
            .map(|n| Semaphore::new(n as isize));
        Self {
            conns: ArrayQueue::new(opts.pool_max_idle_conn.max(1)),
            opts,
            semaphore,
        }
    }

    /// Number of idle sessions.
    pub fn idle(&self) -> usize {
        self.conns.len()
    }

    pub fn get(self: &Arc<Self>) -> Result<PooledConn<T>> {
        if let Some(sem) = &self.semaphore {
            sem.acquire();
        }
        match self.check_out() {
            Ok(conn) => Ok(PooledConn {
                conn: ManuallyDrop::new(conn),
                pool: Arc::clone(self),
            }),
            Err(e) => {
                if let Some(sem) = &self.semaphore {
                    sem.release();
                }
                Err(e)
            }
        }
    }

    fn check_out(&self) -> Result<Conn<T>> {
        while let Some(mut conn) = self.conns.pop() {
            match conn.ping().and_then(|()| conn.checkout()) {
                Ok(()) => return Ok(conn),
                // Connection dead, try next one
                Err(e) => conn.disconnect(&e),
            }
        }
        let mut conn = Conn::new(self.opts.clone())?;
        conn.checkout()?;
        Ok(conn)
    }

    fn check_in(&self, mut conn: Conn<T>) {
        if let Err(e) = conn.checkin() {
            conn.disconnect(&e);
            return;
        }
        if conn.in_transaction() {
            if let Err(e) = conn.rollback(TransactionMode::Transaction) {
                conn.disconnect(&e);
                return;
            }
        }
        if let Err(conn) = self.conns.push(conn) {
            if let Err(e) = conn.close() {
                tracing::debug!(error = %e, "close of surplus idle session failed");
            }
        }
    }
}

pub struct PooledConn<T: Transport> {
    pool: Arc<Pool<T>>,
    conn: ManuallyDrop<Conn<T>>,
}

impl<T: Transport> Deref for PooledConn<T> {
    type Target = Conn<T>;
    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<T: Transport> DerefMut for PooledConn<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl<T: Transport> Drop for PooledConn<T> {
    fn drop(&mut self) {
        // SAFETY: conn is never accessed after this
        let conn = unsafe { ManuallyDrop::take(&mut self.conn) };
        self.pool.check_in(conn);
        if let Some(sem) = &self.pool.semaphore {
            sem.release();
        }
    }
}
