use stddb::oracle::mock::{MockCall, MockColumn, MockOci, MockResult};
use stddb::oracle::{OracleDatabaseError, StatementState};
use stddb::{Error, Rowset, Source};

mod common;

use common::{environment, source, users, USERS};

const INSERT: &str = "INSERT INTO users (id, name) VALUES (1, 'scott')";

#[test]
fn it_reports_database_errors() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_dml(INSERT, 1);
    driver.fail_next(
        MockCall::Execute,
        1,
        "ORA-00001: unique constraint (APP.PK_USERS) violated\n",
    );

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;

    let err = conn.execute(INSERT).unwrap_err();
    let err = err.as_database_error().unwrap();

    assert_eq!(err.code().as_deref(), Some("1"));
    assert!(err.message().starts_with("ORA-00001"));
    assert_eq!(err.downcast_ref::<OracleDatabaseError>().native_code(), 1);

    // the failure was one-shot
    assert_eq!(conn.execute(INSERT)?, 1);

    Ok(())
}

#[test]
fn it_reports_unknown_tables() -> anyhow::Result<()> {
    let driver = MockOci::new();

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;

    let err = conn.execute("DELETE FROM missing").unwrap_err();
    let err = err
        .as_database_error()
        .and_then(|err| err.try_downcast_ref::<OracleDatabaseError>())
        .unwrap();

    assert_eq!(err.native_code(), 942);

    Ok(())
}

#[test]
fn it_refuses_a_failed_statement() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_dml(INSERT, 1);
    driver.fail_next(MockCall::Execute, 1, "ORA-00001: unique constraint violated");

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(INSERT)?;

    assert!(matches!(statement.execute(), Err(Error::Database(_))));
    assert_eq!(statement.state(), StatementState::Failed);

    assert!(matches!(
        statement.execute(),
        Err(Error::InvalidState {
            object: "statement",
            state: "failed",
            ..
        })
    ));
    assert!(matches!(
        statement.query(),
        Err(Error::InvalidState { .. })
    ));

    // only the first attempt reached the driver
    assert_eq!(driver.count(MockCall::Execute), 1);

    Ok(())
}

#[test]
fn it_prepares_only_once() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(1));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;

    let err = statement.prepare().unwrap_err();

    assert!(
        matches!(
            err,
            Error::InvalidState {
                operation: "prepare",
                state: "prepared",
                ..
            }
        ),
        "{}",
        err
    );
    assert_eq!(driver.count(MockCall::Prepare), 1);

    Ok(())
}

#[test]
fn it_rejects_bad_credentials() -> anyhow::Result<()> {
    let driver = MockOci::new().with_credentials("scott", "lion");

    {
        let env = environment(&driver)?;
        let err = env.connect(&source()).unwrap_err();
        let err = err.as_database_error().unwrap();

        assert_eq!(err.code().as_deref(), Some("1017"));
    }

    assert!(driver.is_balanced());
    assert!(driver.violations().is_empty(), "{:?}", driver.violations());

    Ok(())
}

#[test]
fn it_accepts_good_credentials() -> anyhow::Result<()> {
    let driver = MockOci::new().with_credentials("scott", "tiger");

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;

    conn.ping()?;

    Ok(())
}

#[test]
fn it_reports_commit_failures() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.fail_next(
        MockCall::Commit,
        3113,
        "ORA-03113: end-of-file on communication channel",
    );

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;

    let err = conn.commit().unwrap_err();

    assert_eq!(
        err.as_database_error().unwrap().code().as_deref(),
        Some("3113")
    );
    assert_eq!(driver.commits(), 0);

    Ok(())
}

#[test]
fn it_refuses_lob_columns() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(
        "SELECT id, body FROM documents",
        MockResult::new(vec![MockColumn::integer("ID"), MockColumn::clob("BODY")]),
    );

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare("SELECT id, body FROM documents")?;

    let err = statement.query().unwrap_err();

    match &err {
        Error::UnsupportedColumnType { column, type_code } => {
            assert_eq!(column, "BODY");
            assert_eq!(*type_code, 112);
        }
        _ => panic!("unexpected error: {}", err),
    }

    assert_eq!(statement.state(), StatementState::Failed);
    assert_eq!(driver.count(MockCall::Execute), 0);

    Ok(())
}

#[test]
fn it_fails_the_cursor_when_a_fetch_fails() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(10));
    driver.fail_next(MockCall::Fetch, 1013, "ORA-01013: user requested cancel");

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;

    assert!(matches!(rows.next(), Err(Error::Database(_))));
    assert!(matches!(rows.next(), Err(Error::InvalidState { .. })));
    assert_eq!(rows.statement().state(), StatementState::Failed);

    assert_eq!(driver.count(MockCall::Fetch), 1);

    Ok(())
}

#[test]
fn it_reads_only_from_a_current_row() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(1));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;

    assert!(matches!(
        rows.try_get::<i64, _>(0),
        Err(Error::InvalidState { .. })
    ));

    assert!(rows.next()?);
    assert_eq!(rows.try_get::<i64, _>(0)?, 1);

    assert!(!rows.next()?);
    assert!(matches!(
        rows.try_get::<i64, _>("ID"),
        Err(Error::InvalidState { .. })
    ));

    Ok(())
}

#[test]
fn it_reports_unknown_columns() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(1));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;

    assert!(rows.next()?);

    match rows.try_get::<String, _>("EMAIL") {
        Err(Error::ColumnNotFound(name)) => assert_eq!(name, "EMAIL"),
        other => panic!("unexpected result: {:?}", other),
    }

    assert!(matches!(
        rows.try_get::<String, _>(2),
        Err(Error::ColumnIndexOutOfBounds { index: 2, len: 2 })
    ));
    assert!(matches!(
        rows.name(5),
        Err(Error::ColumnIndexOutOfBounds { index: 5, len: 2 })
    ));

    Ok(())
}

#[test]
fn it_rejects_targets_without_a_host() {
    let err = "oracle:///orcl".parse::<Source>().unwrap_err();

    assert!(matches!(err, Error::Configuration(_)), "{}", err);
}

#[test]
fn it_rejects_bad_fetch_sizes() {
    let err = "oracle://localhost/orcl?fetch_rows=lots"
        .parse::<Source>()
        .unwrap_err();

    assert!(matches!(err, Error::Configuration(_)), "{}", err);
}
