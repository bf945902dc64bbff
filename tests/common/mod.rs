//! In-memory transport that replays scripted replies and records every command.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use zero_mysql_session::protocol::{
    ColumnDef, ErrPacket, OkPacket, PrepareResponse, Response, ResultSet, ServerHandshake,
    StmtPrepareOk,
};
use zero_mysql_session::sync::Conn;
use zero_mysql_session::{CursorType, Error, Opts, Result, Row, StatusFlags, Transport, Value};

static NEXT_CONNECTION_ID: AtomicU32 = AtomicU32::new(100);

/// A command the session sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Query(String),
    Prepare(String),
    Execute {
        statement_id: u32,
        params: Vec<Value>,
        cursor: CursorType,
    },
    Fetch {
        statement_id: u32,
        max_rows: u32,
    },
    Close(u32),
    Reset(u32),
    Ping(Duration),
    Quit,
}

/// A scripted reply, consumed by the next command of the same kind.
#[derive(Debug)]
pub enum Reply {
    Query(Result<Response>),
    Prepare(Result<PrepareResponse>),
    Execute(Result<Response>),
    Fetch(Result<Response>),
    Reset(Result<Response>),
    Ping(Result<Response>),
    Close(Result<()>),
}

/// Shared handle to a transport's reply queue and command log.
#[derive(Clone, Default)]
pub struct Script {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    next_statement_id: Arc<AtomicU32>,
}

impl Script {
    pub fn reply(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn prepares(&self) -> usize {
        self.count(|c| matches!(c, Call::Prepare(_)))
    }

    pub fn closes(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Close(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Query(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn take(&self, matches: impl Fn(&Reply) -> bool) -> Option<Reply> {
        let mut replies = self.replies.lock().unwrap();
        if replies.front().is_some_and(&matches) {
            replies.pop_front()
        } else {
            None
        }
    }
}

pub struct ScriptedTransport {
    handshake: ServerHandshake,
    script: Script,
    in_trans: bool,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Self {
        Self {
            handshake: ServerHandshake {
                connection_id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::SeqCst),
                server_version: "8.0.36".into(),
                status_flags: StatusFlags::AUTOCOMMIT,
            },
            script,
            in_trans: false,
        }
    }

    fn flags(&self) -> StatusFlags {
        flags_for(self.in_trans)
    }

    fn track(&mut self, response: &Result<Response>) {
        match response {
            Ok(Response::Ok(ok)) => self.in_trans = ok.status_flags.contains(StatusFlags::IN_TRANS),
            Ok(Response::ResultSet(set)) => {
                self.in_trans = set.status_flags.contains(StatusFlags::IN_TRANS)
            }
            _ => {}
        }
    }

    fn default_query(&self, sql: &str) -> Result<Response> {
        let upper = sql.trim().to_ascii_uppercase();
        if upper == "KILL CONNECTION" {
            return Err(Error::Closed);
        }
        let in_trans = if upper == "BEGIN" || upper.starts_with("START TRANSACTION") {
            true
        } else if upper == "COMMIT" || upper == "ROLLBACK" {
            false
        } else {
            self.in_trans
        };
        Ok(ok(flags_for(in_trans)))
    }
}

impl Transport for ScriptedTransport {
    fn connect(opts: &Opts) -> Result<Self> {
        if opts.host == "unreachable" {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        Ok(Self::new(Script::default()))
    }

    fn handshake(&self) -> &ServerHandshake {
        &self.handshake
    }

    fn query(&mut self, sql: &str) -> Result<Response> {
        self.script.record(Call::Query(sql.to_string()));
        let response = match self.script.take(|r| matches!(r, Reply::Query(_))) {
            Some(Reply::Query(response)) => response,
            _ => self.default_query(sql),
        };
        self.track(&response);
        response
    }

    fn prepare(&mut self, sql: &str) -> Result<PrepareResponse> {
        self.script.record(Call::Prepare(sql.to_string()));
        match self.script.take(|r| matches!(r, Reply::Prepare(_))) {
            Some(Reply::Prepare(response)) => response,
            _ => Ok(PrepareResponse::Ok(StmtPrepareOk {
                statement_id: self.script.next_statement_id.fetch_add(1, Ordering::SeqCst) + 1,
                num_columns: 1,
                num_params: sql.matches('?').count() as u16,
                num_warnings: 0,
            })),
        }
    }

    fn execute(
        &mut self,
        statement_id: u32,
        params: &[Value],
        cursor: CursorType,
    ) -> Result<Response> {
        self.script.record(Call::Execute {
            statement_id,
            params: params.to_vec(),
            cursor,
        });
        let response = match self.script.take(|r| matches!(r, Reply::Execute(_))) {
            Some(Reply::Execute(response)) => response,
            _ => Ok(ok(self.flags())),
        };
        self.track(&response);
        response
    }

    fn fetch(
        &mut self,
        statement_id: u32,
        _columns: &[ColumnDef],
        max_rows: u32,
    ) -> Result<Response> {
        self.script.record(Call::Fetch {
            statement_id,
            max_rows,
        });
        let response = match self.script.take(|r| matches!(r, Reply::Fetch(_))) {
            Some(Reply::Fetch(response)) => response,
            _ => Ok(rows(&[], self.flags() | StatusFlags::LAST_ROW_SENT)),
        };
        self.track(&response);
        response
    }

    fn close_statement(&mut self, statement_id: u32) -> Result<()> {
        self.script.record(Call::Close(statement_id));
        match self.script.take(|r| matches!(r, Reply::Close(_))) {
            Some(Reply::Close(result)) => result,
            _ => Ok(()),
        }
    }

    fn reset_statement(&mut self, statement_id: u32) -> Result<Response> {
        self.script.record(Call::Reset(statement_id));
        match self.script.take(|r| matches!(r, Reply::Reset(_))) {
            Some(Reply::Reset(response)) => response,
            _ => Ok(ok(self.flags())),
        }
    }

    fn ping(&mut self, timeout: Duration) -> Result<Response> {
        self.script.record(Call::Ping(timeout));
        match self.script.take(|r| matches!(r, Reply::Ping(_))) {
            Some(Reply::Ping(response)) => response,
            _ => Ok(ok(self.flags())),
        }
    }

    fn quit(&mut self) -> Result<()> {
        self.script.record(Call::Quit);
        Ok(())
    }
}

pub fn flags_for(in_trans: bool) -> StatusFlags {
    if in_trans {
        StatusFlags::IN_TRANS
    } else {
        StatusFlags::AUTOCOMMIT
    }
}

pub fn ok(status_flags: StatusFlags) -> Response {
    Response::Ok(OkPacket {
        status_flags,
        ..OkPacket::default()
    })
}

/// Result set with one integer column `n`.
pub fn rows(values: &[i64], status_flags: StatusFlags) -> Response {
    Response::ResultSet(ResultSet {
        columns: vec![ColumnDef::named("n")],
        rows: values
            .iter()
            .map(|v| Row::new(vec![Value::Int(*v)]))
            .collect(),
        status_flags,
        num_warnings: 0,
    })
}

pub fn err(code: u16, message: &str) -> Response {
    Response::Err(ErrPacket {
        code,
        sql_state: Some("HY000".into()),
        message: message.into(),
    })
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A session over a fresh scripted transport.
pub fn session(opts: &Opts) -> (Conn<ScriptedTransport>, Script) {
    init_tracing();
    let script = Script::default();
    let conn = Conn::new_with_transport(ScriptedTransport::new(script.clone()), opts);
    (conn, script)
}

pub fn default_session() -> (Conn<ScriptedTransport>, Script) {
    session(&Opts::default())
}
