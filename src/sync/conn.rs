//! Synchronous MySQL session.

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::StatementCache;
use crate::error::{Error, Result};
use crate::opts::{Opts, PrepareMode};
use crate::protocol::{CursorType, TransactionStatus};
use crate::state::cursor::{Cursor, CursorHandle, CursorPhase, DEFAULT_MAX_ROWS, Fetch, Step};
use crate::state::result::{DisconnectPolicy, QueryResult, ResultTranslator};
use crate::state::transaction::{self, TransactionMode, TransactionOutcome};
use crate::statement::{Query, QueryId};
use crate::transport::Transport;
use crate::value::ToParams;

use super::transaction::Transaction;

/// One session over one physical connection.
///
/// Every operation takes `&mut self`; a session runs a single command at a time.
pub struct Conn<T: Transport> {
    transport: T,
    connection_id: u32,
    transaction_status: TransactionStatus,
    prepare_mode: PrepareMode,
    policy: DisconnectPolicy,
    ping_timeout: Duration,
    last_query: Option<Query>,
    cache: StatementCache,
    /// Live server statements of queries the cache does not hold
    uncached: HashMap<QueryId, u32>,
    cursors: HashMap<CursorHandle, Cursor>,
    next_cursor: u64,
    next_name: u64,
    is_broken: bool,
    closed: bool,
}

impl<T: Transport> Conn<T> {
    /// Connect to a MySQL server.
    ///
    /// Connect-time failures are returned as-is; no session exists afterwards.
    pub fn new<O: TryInto<Opts>>(opts: O) -> Result<Self>
    where
        Error: From<O::Error>,
    {
        let opts = opts.try_into()?;
        let transport = T::connect(&opts)?;
        Ok(Self::new_with_transport(transport, &opts))
    }

    /// Start a session on an already connected transport.
    pub fn new_with_transport(transport: T, opts: &Opts) -> Self {
        let handshake = transport.handshake();
        let connection_id = handshake.connection_id;
        let transaction_status = TransactionStatus::from_flags(handshake.status_flags);
        tracing::debug!(
            connection_id,
            server_version = handshake.server_version.as_str(),
            prepare = ?opts.prepare,
            "session started"
        );

        Self {
            transport,
            connection_id,
            transaction_status,
            prepare_mode: opts.prepare,
            policy: DisconnectPolicy::new(&opts.disconnect_on_error_codes),
            ping_timeout: opts.ping_timeout,
            last_query: None,
            cache: StatementCache::new(),
            uncached: HashMap::new(),
            cursors: HashMap::new(),
            next_cursor: 1,
            next_name: 1,
            is_broken: false,
            closed: false,
        }
    }

    /// Get the server-assigned connection id.
    pub fn connection_id(&self) -> u32 {
        self.connection_id
    }

    /// Get the current transaction status.
    pub fn status(&self) -> TransactionStatus {
        self.transaction_status
    }

    /// Check if currently in a transaction.
    pub fn in_transaction(&self) -> bool {
        self.transaction_status.in_transaction()
    }

    /// Check if the connection is broken.
    ///
    /// A broken session has produced a disconnect instruction and only
    /// [`disconnect`](Self::disconnect) remains meaningful.
    pub fn is_broken(&self) -> bool {
        self.is_broken
    }

    /// Get the prepare mode this session was configured with.
    pub fn prepare_mode(&self) -> PrepareMode {
        self.prepare_mode
    }

    /// The most recently prepared or executed query.
    pub fn last_query(&self) -> Option<&Query> {
        self.last_query.as_ref()
    }

    /// Number of statement cache entries.
    pub fn cached_statements(&self) -> usize {
        self.cache.len()
    }

    /// Number of open cursors.
    pub fn open_cursors(&self) -> usize {
        self.cursors.len()
    }

    /// Hand the session to a caller.
    pub fn checkout(&mut self) -> Result<()> {
        self.ensure_usable()?;
        tracing::trace!(connection_id = self.connection_id, "checkout");
        Ok(())
    }

    /// Take the session back from a caller.
    pub fn checkin(&mut self) -> Result<()> {
        self.ensure_usable()?;
        if !self.cursors.is_empty() {
            tracing::debug!(
                connection_id = self.connection_id,
                open_cursors = self.cursors.len(),
                "checkin with open cursors"
            );
        }
        Ok(())
    }

    // === Prepared statements ===

    /// Prepare a query, or resolve it from the statement cache.
    ///
    /// The returned query carries the server binding. Under
    /// [`PrepareMode::Unnamed`] the previously prepared statement is closed first.
    pub fn prepare(&mut self, query: Query) -> Result<Query> {
        self.ensure_usable()?;
        let result = self.prepare_inner(query);
        self.finish(result)
    }

    fn prepare_inner(&mut self, mut query: Query) -> Result<Query> {
        if self.prepare_mode == PrepareMode::Unnamed {
            query.set_name(String::new());
        }
        self.maybe_close(&query)?;

        if let Some(cached) = self.cache.get(&self.cache_form(&query)) {
            tracing::trace!(
                connection_id = self.connection_id,
                statement_id = cached.statement_id(),
                "statement cache hit"
            );
            self.last_query = Some(cached.clone());
            return Ok(cached);
        }

        if self.prepare_mode == PrepareMode::ForceNamed {
            let name = format!("zero_stmt_{}_{}", self.connection_id, self.next_name);
            self.next_name += 1;
            query.set_name(name);
        }
        // An uncached statement prepared earlier for this query is replaced, not leaked
        if let Some(previous) = self.uncached.remove(&query.id()) {
            self.release(previous)?;
        }
        self.prepare_network(query)
    }

    fn prepare_network(&mut self, mut query: Query) -> Result<Query> {
        tracing::debug!(
            connection_id = self.connection_id,
            name = query.name(),
            statement = query.statement(),
            "preparing statement"
        );
        let response = self.transport.prepare(query.statement());
        let ok = self.translator().translate_prepare(response, query.statement())?;

        query.bind(ok.statement_id, ok.num_params);
        if query.is_cacheable() {
            self.cache.put(&query);
        } else {
            self.uncached.insert(query.id(), ok.statement_id);
        }
        self.last_query = Some(query.clone());
        Ok(query)
    }

    /// The form of `query` the cache is keyed on. Force-named queries are
    /// always prepared under a name, so an unnamed one is looked up as named.
    fn cache_form<'q>(&self, query: &'q Query) -> Cow<'q, Query> {
        if self.prepare_mode == PrepareMode::ForceNamed && query.is_unnamed() {
            let mut named = query.clone();
            named.set_name("zero_stmt".to_string());
            return Cow::Owned(named);
        }
        Cow::Borrowed(query)
    }

    /// Under unnamed mode, close the previous statement when a different one comes in.
    fn maybe_close(&mut self, query: &Query) -> Result<()> {
        if self.prepare_mode != PrepareMode::Unnamed {
            return Ok(());
        }
        match self.last_query.take() {
            Some(last) if last.id() != query.id() => self.close_inner(&last),
            last => {
                self.last_query = last;
                Ok(())
            }
        }
    }

    /// Resolve a query for execution: the last query, then the cache, then the network.
    fn maybe_reprepare(&mut self, query: &Query) -> Result<Query> {
        if let Some(last) = &self.last_query {
            if last.id() == query.id() && last.is_prepared() {
                return Ok(last.clone());
            }
        }
        if let Some(cached) = self.cache.get(&self.cache_form(query)) {
            tracing::trace!(
                connection_id = self.connection_id,
                statement_id = cached.statement_id(),
                "statement cache hit"
            );
            self.last_query = Some(cached.clone());
            return Ok(cached);
        }
        let live = self.uncached.get(&query.id()).copied();
        if live.is_some() && live == query.statement_id() {
            self.last_query = Some(query.clone());
            return Ok(query.clone());
        }
        self.prepare_inner(query.clone())
    }

    /// Execute a prepared query, re-preparing it if needed.
    ///
    /// `query` is updated with the binding it was executed under.
    pub fn exec<P: ToParams>(&mut self, query: &mut Query, params: P) -> Result<QueryResult> {
        self.ensure_usable()?;
        let result = self.exec_inner(query, params);
        self.finish(result)
    }

    fn exec_inner<P: ToParams>(&mut self, query: &mut Query, params: P) -> Result<QueryResult> {
        *query = self.maybe_reprepare(query)?;
        check_param_count(query, &params)?;
        let statement_id = bound_statement_id(query)?;

        let values = params.into_values();
        let response = self
            .transport
            .execute(statement_id, &values, CursorType::NoCursor);
        let result = self.translator().translate(response, query.statement());
        self.record(result)
    }

    /// Execute a statement through the text protocol.
    pub fn query(&mut self, sql: &str) -> Result<QueryResult> {
        self.ensure_usable()?;
        let result = self.query_inner(sql);
        self.finish(result)
    }

    fn query_inner(&mut self, sql: &str) -> Result<QueryResult> {
        let response = self.transport.query(sql);
        let result = self.translator().translate(response, sql);
        self.record(result)
    }

    /// Execute a text query and decode the first column of the first row.
    pub fn query_first<V: crate::value::FromValue>(&mut self, sql: &str) -> Result<Option<V>> {
        let result = self.query(sql)?;
        result.rows().first().map(|row| row.get(0)).transpose()
    }

    /// Close a prepared statement on the server and forget it locally.
    ///
    /// The statement closed is the one the session currently holds for
    /// `query`, which may differ from the binding a stale copy carries.
    /// Queries the session holds nothing for are only forgotten.
    pub fn close_statement(&mut self, query: &Query) -> Result<()> {
        self.ensure_usable()?;
        let result = self.close_inner(query);
        self.finish(result)
    }

    fn close_inner(&mut self, query: &Query) -> Result<()> {
        let key = self.cache_form(query).into_owned();
        let statement_id = self
            .cache
            .get(&key)
            .and_then(|cached| cached.statement_id())
            .or_else(|| self.uncached.remove(&query.id()));

        self.cache.delete(&key);
        if self
            .last_query
            .as_ref()
            .is_some_and(|last| last.id() == query.id())
        {
            self.last_query = None;
        }

        match statement_id {
            Some(statement_id) => self.release(statement_id),
            None => Ok(()),
        }
    }

    /// Close a server statement and drop everything still bound to it.
    fn release(&mut self, statement_id: u32) -> Result<()> {
        if self
            .last_query
            .as_ref()
            .is_some_and(|last| last.statement_id() == Some(statement_id))
        {
            self.last_query = None;
        }
        self.uncached.retain(|_, live| *live != statement_id);
        self.cursors
            .retain(|_, cursor| cursor.statement_id != statement_id);

        tracing::debug!(
            connection_id = self.connection_id,
            statement_id,
            "closing statement"
        );
        self.transport
            .close_statement(statement_id)
            .map_err(|e| self.translator().transport_failure(e))
    }

    // === Cursors ===

    /// Declare a cursor over a query. No rows are requested until [`fetch`](Self::fetch).
    pub fn declare<P: ToParams>(&mut self, query: &mut Query, params: P) -> Result<CursorHandle> {
        self.ensure_usable()?;
        let result = self.declare_inner(query, params);
        self.finish(result)
    }

    fn declare_inner<P: ToParams>(&mut self, query: &mut Query, params: P) -> Result<CursorHandle> {
        *query = self.maybe_reprepare(query)?;
        check_param_count(query, &params)?;
        let statement_id = bound_statement_id(query)?;

        let handle = CursorHandle::new(self.next_cursor);
        self.next_cursor += 1;
        self.cursors.insert(
            handle,
            Cursor::new(statement_id, query.statement_arc(), params.into_values()),
        );
        tracing::debug!(
            connection_id = self.connection_id,
            statement_id,
            cursor = ?handle,
            "cursor declared"
        );
        Ok(handle)
    }

    /// Fetch the next batch of a cursor, up to `max_rows` rows (default 500).
    ///
    /// [`Fetch::Halt`] closes the cursor; the handle is unknown afterwards.
    /// On error the cursor is left as it was.
    pub fn fetch(&mut self, cursor: CursorHandle, max_rows: Option<u32>) -> Result<Fetch> {
        self.ensure_usable()?;
        let max_rows = max_rows.unwrap_or(DEFAULT_MAX_ROWS);
        if max_rows == 0 {
            return Err(Error::InvalidUsage("max_rows must be positive".into()));
        }
        let result = self.fetch_inner(cursor, max_rows);
        self.finish(result)
    }

    fn fetch_inner(&mut self, handle: CursorHandle, max_rows: u32) -> Result<Fetch> {
        let mut cursor = self
            .cursors
            .remove(&handle)
            .ok_or_else(|| Error::InvalidUsage(format!("unknown cursor {:?}", handle)))?;

        match self.fetch_batch(&mut cursor, max_rows) {
            Ok(Fetch::Halt(result)) => {
                tracing::debug!(
                    connection_id = self.connection_id,
                    statement_id = cursor.statement_id,
                    cursor = ?handle,
                    "cursor exhausted"
                );
                Ok(Fetch::Halt(result))
            }
            other => {
                self.cursors.insert(handle, cursor);
                other
            }
        }
    }

    fn fetch_batch(&mut self, cursor: &mut Cursor, max_rows: u32) -> Result<Fetch> {
        let response = match &cursor.phase {
            CursorPhase::AwaitingFirstFetch { params } => {
                self.transport
                    .execute(cursor.statement_id, params, CursorType::ReadOnly)
            }
            CursorPhase::Streaming { columns } => {
                self.transport
                    .fetch(cursor.statement_id, columns, max_rows)
            }
        };
        let result = self.translator().translate(response, &cursor.statement);
        let result = self.record(result)?;

        match cursor.advance(&result) {
            Ok(Step::Continue) => Ok(Fetch::Continue(result)),
            Ok(Step::Halt) => Ok(Fetch::Halt(result)),
            Err(e) => {
                tracing::error!(
                    connection_id = self.connection_id,
                    statement_id = cursor.statement_id,
                    status_flags = result.status_flags.bits(),
                    "cursor stream ended without LAST_ROW_SENT"
                );
                Err(e)
            }
        }
    }

    /// Forget a cursor.
    ///
    /// Anonymous statements are closed; named ones are reset and stay prepared.
    pub fn deallocate(&mut self, query: &Query, cursor: CursorHandle) -> Result<()> {
        self.ensure_usable()?;
        let result = self.deallocate_inner(query, cursor);
        self.finish(result)
    }

    fn deallocate_inner(&mut self, query: &Query, handle: CursorHandle) -> Result<()> {
        let cursor = self.cursors.remove(&handle);
        if query.is_unnamed() {
            return self.close_inner(query);
        }

        let Some(statement_id) = cursor
            .map(|cursor| cursor.statement_id)
            .or_else(|| query.statement_id())
        else {
            return Ok(());
        };
        tracing::debug!(
            connection_id = self.connection_id,
            statement_id,
            "resetting statement"
        );
        let response = self.transport.reset_statement(statement_id);
        let result = self.translator().translate(response, query.statement());
        self.record(result).map(drop)
    }

    // === Transactions ===

    /// Open a transaction or savepoint.
    ///
    /// Returns [`TransactionOutcome::Unchanged`] without sending anything when
    /// `mode` does not apply to the current status.
    pub fn begin(&mut self, mode: TransactionMode) -> Result<TransactionOutcome> {
        self.ensure_usable()?;
        let commands = transaction::begin_commands(self.transaction_status, mode);
        let result = self.run_commands(commands);
        self.finish(result)
    }

    /// Commit a transaction or release a savepoint.
    pub fn commit(&mut self, mode: TransactionMode) -> Result<TransactionOutcome> {
        self.ensure_usable()?;
        let commands = transaction::commit_commands(self.transaction_status, mode);
        let result = self.run_commands(commands);
        self.finish(result)
    }

    /// Roll back a transaction or to a savepoint.
    pub fn rollback(&mut self, mode: TransactionMode) -> Result<TransactionOutcome> {
        self.ensure_usable()?;
        let commands = transaction::rollback_commands(self.transaction_status, mode);
        let result = self.run_commands(commands);
        self.finish(result)
    }

    fn run_commands(
        &mut self,
        commands: Option<&'static [&'static str]>,
    ) -> Result<TransactionOutcome> {
        let Some(commands) = commands else {
            tracing::debug!(
                connection_id = self.connection_id,
                status = ?self.transaction_status,
                "transaction command does not apply"
            );
            return Ok(TransactionOutcome::Unchanged(self.transaction_status));
        };

        let mut last = None;
        for sql in commands {
            last = Some(self.query_inner(sql)?);
        }
        Ok(match last {
            Some(result) => TransactionOutcome::Completed(result),
            None => TransactionOutcome::Unchanged(self.transaction_status),
        })
    }

    /// Execute a closure within a transaction.
    ///
    /// If the closure returns `Ok` and the transaction is still open, it is committed.
    /// If the closure returns `Err`, the transaction is rolled back.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUsage` if called while already in a transaction.
    pub fn run_transaction<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self, Transaction) -> Result<R>,
    {
        if self.in_transaction() {
            return Err(Error::InvalidUsage(
                "nested transactions are not supported, use a savepoint".into(),
            ));
        }

        self.begin(TransactionMode::Transaction)?;

        let tx = Transaction::new(self.connection_id);
        let result = f(self, tx);

        if !self.in_transaction() || self.is_broken {
            return result;
        }
        match result {
            Ok(value) => {
                self.commit(TransactionMode::Transaction)?;
                Ok(value)
            }
            Err(e) => {
                // Return the closure's error even if the rollback fails too
                if let Err(rollback_error) = self.rollback(TransactionMode::Transaction) {
                    tracing::warn!(error = %rollback_error, "rollback after failed transaction");
                }
                Err(e)
            }
        }
    }

    // === Connection ===

    /// Check that the server is alive.
    ///
    /// Any failure, including an error reply, is a disconnect.
    pub fn ping(&mut self) -> Result<()> {
        self.ensure_usable()?;
        let response = self.transport.ping(self.ping_timeout);
        let result = self
            .translator()
            .translate(response, "PING")
            .map_err(Error::disconnect);
        let result = self.record(result).map(drop);
        self.finish(result)
    }

    /// Tear the session down after `error`. Local state is dropped and the
    /// transport is closed on a best-effort basis.
    pub fn disconnect(mut self, error: &Error) {
        tracing::warn!(
            connection_id = self.connection_id,
            error = %error,
            "disconnecting"
        );
        self.teardown();
        if let Err(e) = self.transport.quit() {
            tracing::debug!(connection_id = self.connection_id, error = %e, "quit failed");
        }
    }

    /// Close the session gracefully.
    pub fn close(mut self) -> Result<()> {
        tracing::debug!(connection_id = self.connection_id, "closing session");
        self.teardown();
        self.transport.quit()
    }

    fn teardown(&mut self) {
        self.cache.clear();
        self.uncached.clear();
        self.cursors.clear();
        self.last_query = None;
        self.closed = true;
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.is_broken {
            return Err(Error::ConnectionBroken);
        }
        Ok(())
    }

    fn finish<R>(&mut self, result: Result<R>) -> Result<R> {
        if let Err(ref e) = result {
            if e.is_connection_broken() && !self.is_broken {
                tracing::warn!(
                    connection_id = self.connection_id,
                    error = %e,
                    "session marked broken"
                );
                self.is_broken = true;
            }
        }
        result
    }

    fn record(&mut self, result: Result<QueryResult>) -> Result<QueryResult> {
        if let Ok(ref result) = result {
            self.transaction_status = result.transaction_status;
        }
        result
    }

    fn translator(&self) -> ResultTranslator<'_> {
        ResultTranslator::new(self.connection_id, &self.policy)
    }
}

impl<T: Transport> Drop for Conn<T> {
    fn drop(&mut self) {
        if !self.closed {
            // Best effort, ignore errors
            let _ = self.transport.quit();
        }
    }
}

fn bound_statement_id(query: &Query) -> Result<u32> {
    query.statement_id().ok_or_else(|| {
        Error::Protocol(format!(
            "statement has no server binding: {}",
            query.statement()
        ))
    })
}

fn check_param_count<P: ToParams>(query: &Query, params: &P) -> Result<()> {
    let expected = usize::from(query.num_params());
    let actual = params.param_count();
    if expected != actual {
        return Err(Error::InvalidUsage(format!(
            "statement expects {} parameters, got {}",
            expected, actual
        )));
    }
    Ok(())
}
