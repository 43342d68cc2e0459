use stddb::oracle::mock::{MockCall, MockOci};
use stddb::oracle::HandleType;
use stddb::Rowset;

mod common;

use common::{environment, source, users, USERS};

/// Connects, reads every row of a query and releases everything.
fn run_to_completion(driver: &MockOci) -> anyhow::Result<usize> {
    let env = environment(driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;

    let mut count = 0;
    while rows.next()? {
        let _: i64 = rows.try_get(0)?;
        count += 1;
    }

    Ok(count)
}

fn assert_released(driver: &MockOci) {
    assert_eq!(driver.live_handles(), 0);
    assert_eq!(driver.double_frees(), 0);
    assert!(driver.is_balanced());
    assert!(driver.violations().is_empty(), "{:?}", driver.violations());
}

#[test]
fn it_releases_everything_it_allocates() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(120));

    assert_eq!(run_to_completion(&driver)?, 120);
    assert_released(&driver);

    assert_eq!(driver.allocated(HandleType::Param), 2);
    assert_eq!(driver.freed(HandleType::Param), 2);
    assert_eq!(driver.freed(HandleType::Stmt), 1);
    assert_eq!(driver.freed(HandleType::Env), 1);

    Ok(())
}

#[test]
fn it_releases_in_reverse_order_of_acquisition() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(3));

    let env = environment(&driver)?;
    let conn = env.connect(&source())?;
    let mut statement = conn.prepare(USERS)?;
    let mut rows = statement.query()?;

    while rows.next()? {}

    drop(rows);
    drop(statement);
    drop(conn);
    drop(env);

    assert_eq!(
        driver.release_order(),
        [
            // descriptors go as soon as describe has read them
            HandleType::Param,
            HandleType::Param,
            HandleType::Stmt,
            HandleType::Session,
            HandleType::SvcCtx,
            HandleType::Server,
            HandleType::Error,
            HandleType::Env,
        ]
    );
    assert_released(&driver);

    Ok(())
}

#[test]
fn it_ends_the_session_before_releasing_handles() -> anyhow::Result<()> {
    let driver = MockOci::new();

    {
        let env = environment(&driver)?;
        let _conn = env.connect(&source())?;
    }

    assert_eq!(driver.count(MockCall::SessionEnd), 1);
    assert_eq!(driver.count(MockCall::ServerDetach), 1);
    assert_released(&driver);

    Ok(())
}

#[test]
fn it_releases_everything_when_a_call_fails() -> anyhow::Result<()> {
    let failures = [
        MockCall::EnvCreate,
        MockCall::ServerAttach,
        MockCall::AttrSet,
        MockCall::SessionBegin,
        MockCall::Prepare,
        MockCall::Describe,
        MockCall::ParamGet,
        MockCall::Define,
        MockCall::Execute,
        MockCall::Fetch,
    ];

    for call in failures {
        let driver = MockOci::new();
        driver.add_query(USERS, users(150));
        driver.fail_next(call, 1013, "ORA-01013: user requested cancel of current operation");

        let result = run_to_completion(&driver);

        assert!(result.is_err(), "{:?} did not fail", call);
        assert_released(&driver);
    }

    Ok(())
}

#[test]
fn it_releases_everything_when_an_allocation_fails() -> anyhow::Result<()> {
    let failures = [
        HandleType::Error,
        HandleType::Server,
        HandleType::SvcCtx,
        HandleType::Session,
        HandleType::Stmt,
    ];

    for handle_type in failures {
        let driver = MockOci::new();
        driver.add_query(USERS, users(10));
        driver.fail_alloc(handle_type);

        let err = run_to_completion(&driver).unwrap_err();
        let err = err.downcast_ref::<stddb::Error>().unwrap();

        assert!(
            matches!(err, stddb::Error::Resource { .. }),
            "{:?}: {}",
            handle_type,
            err
        );
        assert_released(&driver);
    }

    Ok(())
}

#[test]
fn it_releases_everything_when_a_query_is_abandoned() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(500));

    {
        let env = environment(&driver)?;
        let conn = env.connect(&source())?;
        let mut statement = conn.prepare(USERS)?;
        let mut rows = statement.query()?;

        assert!(rows.next()?);
        assert!(rows.next()?);
    }

    assert_eq!(driver.count(MockCall::Cancel), 1);
    assert_eq!(driver.open_cursors(), 0);
    assert_released(&driver);

    Ok(())
}

#[test]
fn it_shares_one_environment_between_connections() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(USERS, users(5));

    let env = environment(&driver)?;

    {
        let first = env.connect(&source())?;
        let second = env.connect(&source())?;

        let mut a = first.prepare(USERS)?;
        let mut b = second.prepare(USERS)?;
        let mut a = a.query()?;
        let mut b = b.query()?;

        assert!(a.next()?);
        assert!(b.next()?);
        assert_eq!(a.try_get::<i64, _>(0)?, b.try_get::<i64, _>(0)?);
    }

    drop(env);

    assert_eq!(driver.allocated(HandleType::Env), 1);
    assert_eq!(driver.allocated(HandleType::Session), 2);
    assert_released(&driver);

    Ok(())
}
