#![allow(dead_code)]

use stddb::oracle::mock::{MockColumn, MockOci, MockResult, MockValue};
use stddb::oracle::OracleEnvironment;
use stddb::Source;

pub fn setup_if_needed() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn source() -> Source {
    Source::new()
        .with_server("localhost")
        .with_database("FREEPDB1")
        .with_username("scott")
        .with_password("tiger")
}

pub fn environment(driver: &MockOci) -> anyhow::Result<OracleEnvironment<MockOci>> {
    setup_if_needed();

    Ok(OracleEnvironment::new(driver.clone())?)
}

pub const USERS: &str = "SELECT id, name FROM users ORDER BY id";

/// `count` users, with ids counting up from 1.
pub fn users(count: i64) -> MockResult {
    MockResult::new(vec![
        MockColumn::integer("ID").not_null(),
        MockColumn::varchar2("NAME", 30),
    ])
    .rows((1..=count).map(|id| vec![MockValue::from(id), format!("user {}", id).into()]))
}
