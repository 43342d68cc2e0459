use chrono::{NaiveDate, NaiveDateTime};
use stddb::oracle::mock::{MockColumn, MockOci, MockResult, MockValue};
use stddb::oracle::{OracleEnvironment, ValueKind};
use stddb::{Error, Rowset, ValueRef};

mod common;

use common::{environment, source};

const QUERY: &str = "SELECT value FROM samples";

/// An environment whose only query returns `value` in a single `column`.
fn single(
    column: MockColumn,
    value: impl Into<MockValue>,
) -> anyhow::Result<(MockOci, OracleEnvironment<MockOci>)> {
    let driver = MockOci::new();
    driver.add_query(QUERY, MockResult::new(vec![column]).row(vec![value.into()]));

    let env = environment(&driver)?;

    Ok((driver, env))
}

/// Opens a connection on `$env`, runs the query and evaluates `$body` on its first row.
macro_rules! read {
    ($env:expr, |$rows:ident| $body:expr) => {{
        let conn = $env.connect(&source())?;
        let mut statement = conn.prepare(QUERY)?;
        let mut $rows = statement.query()?;

        assert!($rows.next()?);

        $body
    }};
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, s).unwrap()
}

#[test]
fn it_decodes_integers() -> anyhow::Result<()> {
    let (_driver, env) = single(MockColumn::integer("VALUE"), 1_234_567_890_123_i64)?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<i64, _>(0)?, 1_234_567_890_123);
        assert_eq!(rows.try_get::<f64, _>(0)?, 1_234_567_890_123.0);

        // does not fit an i32
        let err = rows.try_get::<i32, _>(0).unwrap_err();
        assert!(matches!(err, Error::ColumnDecode { .. }), "{}", err);
    });

    let (_driver, env) = single(MockColumn::integer("VALUE"), -7_i64)?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<i32, _>("value")?, -7);
        assert_eq!(rows.cell(0)?.kind(), ValueKind::Integer);
    });

    Ok(())
}

#[test]
fn it_decodes_integral_numbers() -> anyhow::Result<()> {
    let (_driver, env) = single(MockColumn::number("VALUE"), 3.0_f64)?;

    read!(env, |rows| {
        assert_eq!(rows.cell(0)?.kind(), ValueKind::Decimal);
        assert_eq!(rows.try_get::<i64, _>(0)?, 3);
        assert_eq!(rows.try_get::<f64, _>(0)?, 3.0);
    });

    let (_driver, env) = single(MockColumn::number("VALUE"), 2.5_f64)?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<f64, _>(0)?, 2.5);
        assert!(rows.try_get::<i64, _>(0).is_err());
    });

    Ok(())
}

#[test]
fn it_decodes_wide_integers_exactly() -> anyhow::Result<()> {
    // 2^53 + 1 has no exact double
    const WIDE: i64 = 9_007_199_254_740_993;

    for column in [MockColumn::decimal("ID", 38, 0), MockColumn::number("ID")] {
        let (_driver, env) = single(column, WIDE)?;

        read!(env, |rows| {
            assert_eq!(rows.cell(0)?.kind(), ValueKind::Decimal);
            assert_eq!(rows.try_get::<i64, _>("ID")?, WIDE);
            assert_eq!(rows.try_get::<String, _>("ID")?, "9007199254740993");
            assert!(rows.try_get::<i32, _>("ID").is_err());
        });
    }

    let (_driver, env) = single(MockColumn::decimal("ID", 38, 0), i64::MIN)?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<i64, _>(0)?, i64::MIN);
    });

    Ok(())
}

#[test]
fn it_refuses_numbers_beyond_i64() -> anyhow::Result<()> {
    let driver = MockOci::new();
    driver.add_query(
        QUERY,
        MockResult::new(vec![MockColumn::decimal("TOTAL", 38, 0)])
            .row(vec!["123456789012345678901234567890".into()]),
    );

    let env = environment(&driver)?;

    read!(env, |rows| {
        let err = rows.try_get::<i64, _>(0).unwrap_err();
        assert!(matches!(err, Error::ColumnDecode { .. }), "{}", err);
        assert!(err.to_string().contains("does not fit"), "{}", err);

        assert_eq!(
            rows.try_get::<String, _>(0)?,
            "123456789012345678901234567890"
        );
        let approximate = rows.try_get::<f64, _>(0)?;
        assert!((approximate / 1.234_567_890_123_456_8e29 - 1.0).abs() < 1e-12);
    });

    Ok(())
}

#[test]
fn it_decodes_fractions_without_a_leading_zero() -> anyhow::Result<()> {
    let (_driver, env) = single(MockColumn::number("VALUE"), -0.25_f64)?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<&str, _>(0)?, "-.25");
        assert_eq!(rows.try_get::<f64, _>(0)?, -0.25);
        assert!(rows.try_get::<i64, _>(0).is_err());
    });

    Ok(())
}

#[test]
fn it_decodes_floats() -> anyhow::Result<()> {
    let (_driver, env) = single(MockColumn::binary_double("VALUE"), 0.25_f64)?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<f64, _>(0)?, 0.25);
        assert_eq!(rows.try_get::<f32, _>(0)?, 0.25);
    });

    let (_driver, env) = single(MockColumn::decimal("VALUE", 10, 2), 12.5_f64)?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<f64, _>(0)?, 12.5);
    });

    Ok(())
}

#[test]
fn it_decodes_null() -> anyhow::Result<()> {
    let (_driver, env) = single(MockColumn::integer("VALUE"), MockValue::Null)?;

    read!(env, |rows| {
        assert!(rows.try_get_raw(0)?.is_null());
        assert_eq!(rows.try_get::<Option<i64>, _>(0)?, None);

        // null skips the type check
        assert_eq!(rows.try_get::<Option<String>, _>(0)?, None);

        let err = rows.try_get::<i64, _>(0).unwrap_err();
        assert!(err.to_string().contains("unexpected null"), "{}", err);
    });

    let (_driver, env) = single(MockColumn::varchar2("VALUE", 10), Some("x"))?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<Option<String>, _>(0)?.as_deref(), Some("x"));
    });

    Ok(())
}

#[test]
fn it_checks_types_before_decoding() -> anyhow::Result<()> {
    let (_driver, env) = single(MockColumn::integer("VALUE"), 10_i64)?;

    read!(env, |rows| {
        let err = rows.try_get::<String, _>(0).unwrap_err();
        assert!(err.to_string().contains("mismatched types"), "{}", err);

        let err = rows.try_get::<NaiveDate, _>(0).unwrap_err();
        assert!(err.to_string().contains("mismatched types"), "{}", err);
    });

    Ok(())
}

#[test]
fn it_decodes_strings() -> anyhow::Result<()> {
    let (_driver, env) = single(MockColumn::varchar2("VALUE", 40), "grüße aus köln")?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<&str, _>(0)?, "grüße aus köln");
        assert_eq!(rows.try_get::<String, _>(0)?, "grüße aus köln");
        assert_eq!(rows.try_get::<Vec<u8>, _>(0)?, "grüße aus köln".as_bytes());
    });

    let (_driver, env) = single(MockColumn::char("VALUE", 3), "abc")?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<&str, _>(0)?, "abc");
    });

    let (_driver, env) = single(MockColumn::varchar2("VALUE", 10), "")?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<String, _>(0)?, "");
    });

    Ok(())
}

#[test]
fn it_decodes_rowids() -> anyhow::Result<()> {
    let (_driver, env) = single(MockColumn::rowid("VALUE"), "AAAR3sAAEAAAACXAAA")?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<String, _>(0)?, "AAAR3sAAEAAAACXAAA");
    });

    Ok(())
}

#[test]
fn it_decodes_bytes() -> anyhow::Result<()> {
    let token: &[u8] = &[0xDE, 0xAD, 0x00, 0xBE, 0xEF];
    let (_driver, env) = single(MockColumn::raw("VALUE", 16), token)?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<&[u8], _>(0)?, token);
        assert_eq!(rows.try_get::<Vec<u8>, _>(0)?, token);
        assert!(rows.try_get::<String, _>(0).is_err());
    });

    Ok(())
}

#[test]
fn it_reads_character_data_as_raw_bytes() -> anyhow::Result<()> {
    // Latin-1 "ä" followed by a byte that is never valid UTF-8
    let latin1: &[u8] = &[b'a', 0xE4, 0xFF, b'z'];
    let (_driver, env) = single(MockColumn::varchar2("VALUE", 10), latin1)?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<Vec<u8>, _>(0)?, latin1);
        assert_eq!(rows.try_get::<&[u8], _>(0)?, latin1);
        assert!(rows.try_get::<String, _>(0).is_err());
    });

    Ok(())
}

#[test]
fn it_decodes_dates() -> anyhow::Result<()> {
    let (_driver, env) = single(
        MockColumn::date("VALUE"),
        datetime(2024, 2, 29, 13, 30, 0),
    )?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<NaiveDate, _>(0)?, date(2024, 2, 29));
        assert_eq!(
            rows.try_get::<NaiveDateTime, _>(0)?,
            datetime(2024, 2, 29, 13, 30, 0)
        );
    });

    let (_driver, env) = single(
        MockColumn::timestamp("VALUE"),
        datetime(1999, 12, 31, 23, 59, 59),
    )?;

    read!(env, |rows| {
        assert_eq!(
            rows.try_get::<NaiveDateTime, _>(0)?,
            datetime(1999, 12, 31, 23, 59, 59)
        );
    });

    let (_driver, env) = single(MockColumn::date("VALUE"), date(1, 1, 1))?;

    read!(env, |rows| {
        assert_eq!(rows.try_get::<NaiveDate, _>(0)?, date(1, 1, 1));
    });

    Ok(())
}

#[test]
fn it_refuses_truncated_values() -> anyhow::Result<()> {
    let (_driver, env) = single(MockColumn::varchar2("VALUE", 5), "hello world")?;

    read!(env, |rows| {
        let cell = rows.cell(0)?;

        assert!(cell.is_truncated());
        assert_eq!(cell.indicator(), 11);

        let err = rows.try_get::<String, _>(0).unwrap_err();
        assert!(err.to_string().contains("truncated"), "{}", err);
    });

    Ok(())
}

#[test]
fn it_decodes_through_cells() -> anyhow::Result<()> {
    let (_driver, env) = single(MockColumn::varchar2("VALUE", 10), "cell")?;

    read!(env, |rows| {
        let cell = rows.try_get_raw("VALUE")?;

        assert_eq!(cell.get::<&str>()?, "cell");
        assert!(cell.get::<i64>().is_err());
    });

    Ok(())
}
