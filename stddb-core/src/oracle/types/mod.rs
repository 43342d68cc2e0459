//! Conversions between Rust and Oracle types.
//!
//! # Types
//!
//! | Rust type                  | Oracle type(s)                                        |
//! |----------------------------|-------------------------------------------------------|
//! | `i64`, `i32`               | NUMBER                                                |
//! | `f64`, `f32`               | NUMBER, BINARY_DOUBLE, BINARY_FLOAT                   |
//! | `String`, `&str`           | VARCHAR2, CHAR, ROWID, UROWID, NUMBER                 |
//! | `Vec<u8>`, `&[u8]`         | RAW, VARCHAR2, CHAR                                   |
//! | `chrono::NaiveDate`        | DATE, TIMESTAMP                                       |
//! | `chrono::NaiveDateTime`    | DATE, TIMESTAMP                                       |
//!
//! `NUMBER(p, 0)` with `p <= 18` is fetched as a native integer. Every other `NUMBER` is
//! fetched as its decimal text, which decodes into an integer type only when it has no
//! fractional part and fits, and into a string unchanged.
//!
//! # Nullable
//!
//! In addition, `Option<T>` is supported where `T` implements `Type`. An `Option<T>` represents
//! a potentially `NULL` value from Oracle.

mod bytes;
pub(crate) mod chrono;
mod float;
mod int;
mod str;
