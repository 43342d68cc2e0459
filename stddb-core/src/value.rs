use crate::database::Database;
use std::borrow::Cow;

/// A reference to a single value from the database.
///
/// A value reference is only valid while the row it was read from is current. The borrow
/// on the rowset makes advancing the cursor impossible while one is alive.
pub trait ValueRef<'r>: Sized {
    type Database: Database;

    /// Get the type information for this value.
    fn type_info(&self) -> Cow<'_, <Self::Database as Database>::TypeInfo>;

    /// Returns `true` if the SQL value is `NULL`.
    fn is_null(&self) -> bool;
}
