use std::fmt::{Debug, Display};

/// Provides information about a SQL type for the database driver.
pub trait TypeInfo: Debug + Display + Clone + PartialEq<Self> + Send + Sync {
    /// Returns the database system name of the type. Length specifiers should not be included.
    /// Common type names are `VARCHAR2`, `NUMBER`, `DATE`. Other databases may use different
    /// names.
    fn name(&self) -> &str;

    /// Returns `true` if the native type behind this info can be read into a transfer buffer.
    fn is_bindable(&self) -> bool {
        true
    }
}
