use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};

use crate::error::{DatabaseError, Error};
use crate::oracle::oci::{Oci, Status};

/// An error returned by the native client.
///
/// `code` is the driver's numeric error code (`1` for `ORA-00001`) when the error handle
/// carried a diagnostic record, and the raw call status otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleDatabaseError {
    code: i32,
    message: String,
}

impl OracleDatabaseError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The native error code.
    pub fn native_code(&self) -> i32 {
        self.code
    }
}

impl Display for OracleDatabaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message.trim_end(), self.code)
    }
}

impl StdError for OracleDatabaseError {}

impl DatabaseError for OracleDatabaseError {
    #[inline]
    fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(self.code.to_string()))
    }

    #[inline]
    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    #[inline]
    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    #[inline]
    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }
}

/// Checks the status of a call that has no error handle to read diagnostics from.
pub(crate) fn check(label: &str, status: Status) -> Result<(), Error> {
    log::trace!("{}: {}", label, status);

    if status.is_success() {
        Ok(())
    } else {
        Err(OracleDatabaseError::new(status.0, label).into())
    }
}

/// Checks the status of a call, reading the first diagnostic record of `err` on failure.
///
/// `SUCCESS_WITH_INFO` is a success; its diagnostic, if any, is logged as a warning.
pub(crate) fn check_with<D: Oci>(
    label: &str,
    status: Status,
    driver: &D,
    err: D::Handle,
) -> Result<(), Error> {
    log::trace!("{}: {}", label, status);

    if status == Status::SUCCESS_WITH_INFO {
        if let Some((code, message)) = driver.error_get(err, 1) {
            log::warn!("{}: {} (code {})", label, message.trim_end(), code);
        }
    }

    if status.is_success() {
        return Ok(());
    }

    let error = match driver.error_get(err, 1) {
        Some((code, message)) => OracleDatabaseError::new(code, message),
        None => OracleDatabaseError::new(status.0, format!("{}: {}", label, status)),
    };

    log::debug!("{} failed: {}", label, error);

    Err(error.into())
}

/// Checks that a call produced the value it promised.
pub(crate) fn check_ptr<T: Debug>(label: &str, value: Option<T>) -> Result<T, Error> {
    log::trace!("{}: {:?}", label, value);

    value.ok_or_else(|| OracleDatabaseError::new(Status::INVALID_HANDLE.0, label).into())
}
