//! Traits to represent a database driver.
//!
//! # Support
//!
//! ## Tier 1
//!
//! Tier 1 support can be thought of as "guaranteed" meaning that we can accept a result-set
//! shape reported by the native client at run time and bind a transfer buffer for every
//! column kind the backend classifies.
//!
//! | Database | Version | Driver |
//! | - | - | - |
//! | Oracle | 11g+ | [`oracle`](crate::oracle) over the `Oci` capability set |
//!
//! The backend is generic over its native client: `OciLib` (behind the `oci` feature) links
//! the vendor client library, and `MockOci` (behind the `mock` feature) is an instrumented
//! in-process stand-in.

use std::fmt::Debug;

use crate::column::Column;
use crate::type_info::TypeInfo;
use crate::value::ValueRef;

/// A database driver.
///
/// This trait encapsulates a complete set of traits that implement a driver for a
/// specific database (e.g., Oracle).
pub trait Database: 'static + Sized + Send + Debug + for<'r> HasValueRef<'r, Database = Self> {
    /// The concrete `TypeInfo` implementation for this database.
    type TypeInfo: TypeInfo;

    /// The concrete `Column` implementation for this database.
    type Column: Column<Database = Self>;
}

/// Associate [`Database`] with a [`ValueRef`] of a generic lifetime.
pub trait HasValueRef<'r> {
    type Database: Database;

    /// The concrete type used to hold a reference to one value inside a fetched row.
    type ValueRef: ValueRef<'r, Database = Self::Database>;
}
