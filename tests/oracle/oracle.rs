use std::time::Duration;

use log::LevelFilter;
use stddb::oracle::mock::{MockCall, MockColumn, MockOci, MockResult};
use stddb::oracle::{StatementState, ValueKind};
use stddb::{Column, Rowset, TypeInfo};

mod common;

use common::{environment, source, users, USERS};

#[test]
fn it_connects_and_pings() -> anyhow::Result<()> {
    let driver = MockOci::new();
    let env = environment(&driver)?;
    let conn = env.connect(&source())?;

    conn.ping()?;
    assert!(conn.server_version()?.starts_with("Oracle Database"));

    conn.close()?;
    drop(env);

    assert!(driver.is_balanced());
    assert!(driver.violations().is_empty(), "{:?}", driver.violations());

    Ok(())
}

#[test]
fn it_reads_typed_values() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(
        "SELECT id, greeting FROM dual",
        MockResult::new(vec![
            MockColumn::integer("ID"),
            MockColumn::varchar2("GREETING", 20),
        ])
        .row(vec![42_i64.into(), "hello".into()]),
    );

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare("SELECT id, greeting FROM dual")?;
    let mut rows = statement.query()?;

    assert!(rows.next()?);

    let id: i64 = rows.try_get(0)?;
    let greeting: String = rows.try_get("GREETING")?;
    let by_lower_case: &str = rows.try_get("greeting")?;

    assert_eq!(id, 42);
    assert_eq!(greeting, "hello");
    assert_eq!(by_lower_case, "hello");

    assert!(!rows.next()?);

    Ok(())
}

#[test]
fn it_fetches_across_batches() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(250));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;

    let mut expected = 0;
    while rows.next()? {
        expected += 1;

        let id: i64 = rows.try_get("ID")?;
        let name: String = rows.try_get("NAME")?;

        assert_eq!(id, expected);
        assert_eq!(name, format!("user {}", expected));
    }

    assert_eq!(expected, 250);
    assert_eq!(rows.rows_fetched(), 250);
    // 100 + 100 + a short batch of 50
    assert_eq!(driver.count(MockCall::Fetch), 3);

    Ok(())
}

#[test]
fn it_fetches_a_result_that_fills_every_batch() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(200));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;

    let mut count = 0;
    while rows.next()? {
        count += 1;
    }

    assert_eq!(count, 200);
    // the third fetch finds nothing
    assert_eq!(driver.count(MockCall::Fetch), 3);

    Ok(())
}

#[test]
fn it_honors_the_fetch_array_size() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(20));

    let env = environment(&driver)?;
    let conn = env.connect(&source().fetch_rows(7).prefetch_rows(500))?;
    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;

    let mut count = 0;
    while rows.next()? {
        count += 1;
    }

    assert_eq!(count, 20);
    assert_eq!(driver.count(MockCall::Fetch), 3);
    assert_eq!(driver.prefetch_rows(), Some(500));

    Ok(())
}

#[test]
fn it_stays_exhausted() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(3));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;

    assert!(rows.next()?);
    assert!(rows.next()?);
    assert!(rows.next()?);
    assert!(!rows.next()?);
    assert!(!rows.next()?);
    assert!(!rows.next()?);

    assert_eq!(driver.count(MockCall::Fetch), 1);
    assert_eq!(rows.statement().state(), StatementState::Exhausted);

    Ok(())
}

#[test]
fn it_returns_no_rows_for_an_empty_result() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(0));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;

    assert_eq!(rows.len(), 2);
    assert!(!rows.next()?);
    assert!(!rows.next()?);
    assert_eq!(rows.rows_fetched(), 0);

    Ok(())
}

#[test]
fn it_describes_without_side_effects() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(5));
    driver.add_dml("DELETE FROM users", 5);

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;

    let mut statement = conn.prepare(USERS)?;
    assert_eq!(statement.state(), StatementState::Prepared);

    assert_eq!(statement.get_select_columns()?, 2);
    assert_eq!(statement.get_select_columns()?, 2);
    assert_eq!(statement.state(), StatementState::Described);
    assert_eq!(statement.binds(), 2);

    assert_eq!(driver.count(MockCall::Describe), 1);
    assert_eq!(driver.count(MockCall::Execute), 0);
    assert_eq!(driver.count(MockCall::Fetch), 0);
    assert_eq!(driver.open_cursors(), 0);

    // not a query: nothing to describe, and nothing runs
    let mut delete = conn.prepare("DELETE FROM users")?;
    assert_eq!(delete.get_select_columns()?, 0);
    assert_eq!(driver.count(MockCall::Describe), 1);
    assert_eq!(driver.count(MockCall::Execute), 0);

    Ok(())
}

#[test]
fn it_keeps_column_order() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(
        "SELECT * FROM orders",
        MockResult::new(vec![
            MockColumn::integer("ORDER_ID").not_null(),
            MockColumn::varchar2("CUSTOMER", 50),
            MockColumn::decimal("TOTAL", 10, 2),
            MockColumn::date("PLACED_AT"),
            MockColumn::raw("TOKEN", 16),
        ]),
    );

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare("SELECT * FROM orders")?;
    let rows = statement.query()?;

    let names: Vec<_> = rows.columns().iter().map(Column::name).collect();
    assert_eq!(
        names,
        ["ORDER_ID", "CUSTOMER", "TOTAL", "PLACED_AT", "TOKEN"]
    );

    for (ordinal, column) in rows.columns().iter().enumerate() {
        assert_eq!(column.ordinal(), ordinal);
        assert_eq!(rows.name(ordinal)?, column.name());
    }

    let kinds: Vec<_> = rows.columns().iter().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        [
            Some(ValueKind::Integer),
            Some(ValueKind::String),
            Some(ValueKind::Decimal),
            Some(ValueKind::Date),
            Some(ValueKind::Binary),
        ]
    );

    assert!(!rows.columns()[0].nullable());
    assert!(rows.columns()[1].nullable());
    assert_eq!(rows.columns()[1].type_info().name(), "VARCHAR2");
    assert_eq!(rows.columns()[2].type_info().to_string(), "NUMBER(10, 2)");
    assert_eq!(rows.try_column("placed_at")?.ordinal(), 3);

    Ok(())
}

#[test]
fn it_runs_statements_without_rows_through_query() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_dml("UPDATE users SET active = 1", 4);

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare("UPDATE users SET active = 1")?;
    let mut rows = statement.query()?;

    assert!(rows.is_empty());
    assert!(!rows.next()?);
    assert_eq!(driver.count(MockCall::Execute), 1);
    assert_eq!(driver.count(MockCall::Fetch), 0);

    Ok(())
}

#[test]
fn it_reports_affected_rows() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_dml("UPDATE users SET active = 1", 4);
    driver.add_dml("CREATE TABLE audit (id NUMBER(10))", 0);

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;

    assert_eq!(conn.execute("UPDATE users SET active = 1")?, 4);
    assert_eq!(conn.execute("CREATE TABLE audit (id NUMBER(10))")?, 0);

    Ok(())
}

#[test]
fn it_commits_and_rolls_back() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_dml("INSERT INTO users (id, name) VALUES (1, 'a')", 1);

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;

    conn.execute("INSERT INTO users (id, name) VALUES (1, 'a')")?;
    conn.commit()?;

    conn.execute("INSERT INTO users (id, name) VALUES (1, 'a')")?;
    conn.rollback()?;
    conn.rollback()?;

    assert_eq!(driver.commits(), 1);
    assert_eq!(driver.rollbacks(), 2);

    Ok(())
}

#[test]
fn it_walks_the_statement_states() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(2));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;

    let mut statement = conn.statement(USERS)?;
    assert_eq!(statement.state(), StatementState::Constructed);

    statement.prepare()?;
    assert_eq!(statement.state(), StatementState::Prepared);

    {
        let mut rows = statement.query()?;
        assert_eq!(rows.statement().state(), StatementState::Executed);

        assert!(rows.next()?);
        assert_eq!(rows.statement().state(), StatementState::Fetching);

        while rows.next()? {}
        assert_eq!(rows.statement().state(), StatementState::Exhausted);
    }

    // an exhausted statement runs again from the top
    let mut rows = statement.query()?;
    assert!(rows.next()?);
    assert_eq!(rows.try_get::<i64, _>(0)?, 1);

    Ok(())
}

#[test]
fn it_prepares_on_first_query() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(1));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.statement(USERS)?;
    let mut rows = statement.query()?;

    assert!(rows.next()?);
    assert_eq!(driver.count(MockCall::Prepare), 1);

    Ok(())
}

#[test]
fn it_closes_abandoned_cursors() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(250));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;

    {
        let mut rows = statement.query()?;
        assert!(rows.next()?);
        assert_eq!(driver.open_cursors(), 1);
    }

    assert_eq!(driver.count(MockCall::Cancel), 1);
    assert_eq!(driver.open_cursors(), 0);

    // a result set read to the end has nothing left to cancel
    {
        let mut rows = statement.query()?;
        while rows.next()? {}
    }

    assert_eq!(driver.count(MockCall::Cancel), 1);

    Ok(())
}

#[test]
fn it_exposes_raw_cells() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(1));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;

    assert!(rows.next()?);

    let cell = rows.cell(1)?;
    assert_eq!(cell.kind(), ValueKind::String);
    assert_eq!(cell.column().name(), "NAME");
    assert!(!cell.is_truncated());
    assert_eq!(cell.get::<String>()?, "user 1");

    let id = rows.try_get_raw(0)?.get::<i32>()?;
    assert_eq!(id, 1);

    Ok(())
}

#[test]
fn it_carries_log_settings() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(3));

    let env = environment(&driver)?;
    let conn = env.connect(
        &source()
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Error, Duration::from_millis(250)),
    )?;

    let settings = conn.log_settings();
    assert_eq!(settings.statements_level(), LevelFilter::Debug);
    assert_eq!(settings.slow_statements_level(), LevelFilter::Error);
    assert_eq!(settings.slow_statements_duration(), Duration::from_millis(250));

    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;
    while rows.next()? {}

    assert_eq!(rows.rows_fetched(), 3);

    Ok(())
}
