use crate::database::{Database, HasValueRef};
use crate::oracle::{OracleColumn, OracleTypeInfo, OracleValueRef};

/// Oracle database driver.
///
/// The type-level marker shared by every native client: values, columns and type
/// information look the same whichever [`Oci`](crate::oracle::Oci) implementation
/// produced them.
#[derive(Debug)]
pub struct Oracle;

impl Database for Oracle {
    type TypeInfo = OracleTypeInfo;

    type Column = OracleColumn;
}

impl<'r> HasValueRef<'r> for Oracle {
    type Database = Oracle;

    type ValueRef = OracleValueRef<'r>;
}
