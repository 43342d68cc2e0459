use std::sync::Arc;

use crate::error::Error;
use crate::oracle::error::{check_ptr, check_with};
use crate::oracle::oci::{Attr, HandleType, Oci};
use crate::oracle::{HandleGuard, OracleColumn, OracleStatement, OracleTypeInfo};

/// Reads the metadata of every result column of a described statement, in column order.
///
/// Each parameter descriptor is released as soon as its attributes are copied out.
pub(crate) fn describe<D: Oci>(statement: &OracleStatement<'_, D>) -> Result<Vec<OracleColumn>, Error> {
    let count = statement.binds();
    let mut columns = Vec::with_capacity(count);

    for ordinal in 0..count {
        let column = statement.track(describe_column(statement, ordinal))?;

        log::trace!(
            "oracle: column {} {:?}: {} ({})",
            ordinal,
            column.name,
            column.type_info,
            column.type_info.native_type().code()
        );

        columns.push(column);
    }

    Ok(columns)
}

fn describe_column<D: Oci>(
    statement: &OracleStatement<'_, D>,
    ordinal: usize,
) -> Result<OracleColumn, Error> {
    let driver: &Arc<D> = statement.connection().driver();
    let err = statement.error_handle();

    let mut param = None;
    let status = driver.param_get(statement.handle(), err, ordinal as u32 + 1, &mut param);

    let param = param.map(|param| HandleGuard::adopt(driver, param, HandleType::Param));

    check_with("OCIParamGet", status, &**driver, err)?;
    let param = check_ptr("OCIParamGet", param)?;

    let name = param_text(&**driver, &param, Attr::Name, err)?;
    let type_code = param_int(&**driver, &param, Attr::DataType, err)?;
    let data_size = param_int(&**driver, &param, Attr::DataSize, err)?;
    let precision = param_int(&**driver, &param, Attr::Precision, err)?;
    let scale = param_int(&**driver, &param, Attr::Scale, err)?;
    let nullable = param_int(&**driver, &param, Attr::IsNull, err)?;

    Ok(OracleColumn {
        name,
        type_info: OracleTypeInfo::from_code(
            type_code as u16,
            data_size as u32,
            precision as i16,
            scale as i8,
        ),
        ordinal,
        nullable: nullable != 0,
    })
}

fn param_int<D: Oci>(
    driver: &D,
    param: &HandleGuard<D>,
    attr: Attr,
    err: D::Handle,
) -> Result<i64, Error> {
    let mut value = 0;
    let status = driver.attr_get_int(param.get(), HandleType::Param, attr, err, &mut value);

    check_with(attr.name(), status, driver, err)?;

    Ok(value)
}

fn param_text<D: Oci>(
    driver: &D,
    param: &HandleGuard<D>,
    attr: Attr,
    err: D::Handle,
) -> Result<String, Error> {
    let mut value = String::new();
    let status = driver.attr_get_text(param.get(), HandleType::Param, attr, err, &mut value);

    check_with(attr.name(), status, driver, err)?;

    Ok(value)
}
