//! Tests for named, unnamed and force-named prepare modes

mod common;

use common::session;
use zero_mysql_session::{Opts, PrepareMode, Query};

fn opts(prepare: PrepareMode) -> Opts {
    Opts {
        prepare,
        ..Opts::default()
    }
}

#[test]
fn test_unnamed_closes_previous_statement() {
    let (mut conn, script) = session(&opts(PrepareMode::Unnamed));
    let mut a = Query::new("a", "SELECT 1");
    let mut b = Query::new("b", "SELECT 2");

    conn.exec(&mut a, ()).unwrap();
    let a_id = a.statement_id().unwrap();
    assert!(a.is_unnamed());

    conn.exec(&mut b, ()).unwrap();

    assert_eq!(script.closes(), vec![a_id]);
    assert_eq!(conn.cached_statements(), 0);
    assert_eq!(conn.last_query().map(|q| q.id()), Some(b.id()));
}

#[test]
fn test_unnamed_reuses_last_query_without_network() {
    let (mut conn, script) = session(&opts(PrepareMode::Unnamed));
    let mut a = Query::new("a", "SELECT 1");

    conn.exec(&mut a, ()).unwrap();
    conn.exec(&mut a, ()).unwrap();

    assert_eq!(script.prepares(), 1);
    assert!(script.closes().is_empty());
}

#[test]
fn test_unnamed_switching_back_reprepares() {
    let (mut conn, script) = session(&opts(PrepareMode::Unnamed));
    let mut a = Query::new("a", "SELECT 1");
    let mut b = Query::new("b", "SELECT 2");

    conn.exec(&mut a, ()).unwrap();
    conn.exec(&mut b, ()).unwrap();
    let b_id = b.statement_id().unwrap();
    conn.exec(&mut a, ()).unwrap();

    assert_eq!(script.prepares(), 3);
    assert_eq!(script.closes().last(), Some(&b_id));
}

#[test]
fn test_unnamed_explicit_reprepare_replaces_statement() {
    let (mut conn, script) = session(&opts(PrepareMode::Unnamed));
    let query = Query::new("a", "SELECT 1");

    let first = conn.prepare(query.clone()).unwrap();
    let second = conn.prepare(query).unwrap();

    assert_eq!(script.prepares(), 2);
    assert_eq!(script.closes(), vec![first.statement_id().unwrap()]);
    assert_ne!(first.statement_id(), second.statement_id());
}

#[test]
fn test_named_keeps_both_cached() {
    let (mut conn, script) = session(&opts(PrepareMode::Named));
    let mut a = Query::new("a", "SELECT 1");
    let mut b = Query::new("b", "SELECT 2");

    conn.exec(&mut a, ()).unwrap();
    conn.exec(&mut b, ()).unwrap();

    assert!(script.closes().is_empty());
    assert_eq!(conn.cached_statements(), 2);
    assert_eq!(a.name(), "a");
}

#[test]
fn test_force_named_assigns_fresh_names() {
    let (mut conn, script) = session(&opts(PrepareMode::ForceNamed));

    let a = conn.prepare(Query::new("same", "SELECT 1")).unwrap();
    let b = conn.prepare(Query::new("same", "SELECT 2")).unwrap();

    assert!(!a.name().is_empty());
    assert!(!b.name().is_empty());
    assert_ne!(a.name(), "same");
    assert_ne!(a.name(), b.name());
    assert!(script.closes().is_empty());
    assert_eq!(conn.cached_statements(), 2);
}

#[test]
fn test_force_named_still_caches_by_identity() {
    let (mut conn, script) = session(&opts(PrepareMode::ForceNamed));
    let query = Query::new("q", "SELECT 1");

    conn.prepare(query.clone()).unwrap();
    conn.prepare(query).unwrap();

    assert_eq!(script.prepares(), 1);
}

#[test]
fn test_force_named_cache_hit_keeps_prepared_name() {
    let (mut conn, script) = session(&opts(PrepareMode::ForceNamed));
    let query = Query::new("q", "SELECT 1");

    let first = conn.prepare(query.clone()).unwrap();
    let second = conn.prepare(query).unwrap();
    let other = conn.prepare(Query::new("r", "SELECT 2")).unwrap();

    assert_eq!(script.prepares(), 2);
    assert_eq!(second.name(), first.name());
    assert!(first.name().ends_with("_1"));
    assert!(other.name().ends_with("_2"));
}

#[test]
fn test_force_named_unnamed_query_is_cached() {
    let (mut conn, script) = session(&opts(PrepareMode::ForceNamed));
    let mut query = Query::unnamed("SELECT 1");

    conn.exec(&mut query, ()).unwrap();
    conn.exec(&mut Query::new("b", "SELECT 2"), ()).unwrap();
    conn.exec(&mut query, ()).unwrap();

    assert_eq!(script.prepares(), 2);
    assert!(!query.is_unnamed());
    assert!(script.closes().is_empty());
}

#[test]
fn test_prepare_mode_from_url() {
    let opts = Opts::try_from("mysql://app@localhost/shop?prepare=unnamed").unwrap();
    let (conn, _script) = session(&opts);
    assert_eq!(conn.prepare_mode(), PrepareMode::Unnamed);
}
