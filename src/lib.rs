//! stddb is a statically-typed client-side database access layer.
//!
//! A backend is written once against a native client capability trait and driven through
//! backend-agnostic traits: [`Rowset`] to walk a result set, [`Decode`] and [`Type`] to
//! read typed values out of it. The Oracle backend lives in [`oracle`].
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use stddb_core::column::{Column, ColumnIndex};
pub use stddb_core::database::{self, Database};
pub use stddb_core::decode::{self, Decode};
pub use stddb_core::error::{self, BoxDynError, Error, Result};
pub use stddb_core::rowset::Rowset;
pub use stddb_core::source::{FetchSettings, Source};
pub use stddb_core::type_info::TypeInfo;
pub use stddb_core::types::{self, Type};
pub use stddb_core::value::ValueRef;
pub use stddb_core::LogSettings;

pub use stddb_core::oracle;

/// Convenience re-export of common traits.
pub mod prelude {
    pub use super::Column;
    pub use super::Decode;
    pub use super::Rowset;
    pub use super::Type;
    pub use super::TypeInfo;
    pub use super::ValueRef;
}
