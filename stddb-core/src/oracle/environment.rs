use std::sync::Arc;

use crate::error::Error;
use crate::oracle::error::{check, check_ptr};
use crate::oracle::oci::{EnvMode, HandleType, Oci};
use crate::oracle::{HandleGuard, OracleConnection};
use crate::source::Source;

/// The root of every native resource: the environment and error handles.
///
/// Connections borrow their environment, so an environment always outlives everything
/// allocated under it.
pub struct OracleEnvironment<D: Oci> {
    // allocated under `env`, so it is declared (and dropped) first
    err: HandleGuard<D>,
    env: HandleGuard<D>,
    driver: Arc<D>,
}

impl<D: Oci> OracleEnvironment<D> {
    /// Creates a threaded, object-mode environment on `driver`.
    pub fn new(driver: D) -> Result<Self, Error> {
        let driver = Arc::new(driver);

        let mut handle = None;
        let status = driver.env_create(EnvMode::THREADED | EnvMode::OBJECT, &mut handle);

        // take ownership before checking, so a handle returned with a failure is freed too
        let env = handle.map(|env| HandleGuard::adopt(&driver, env, HandleType::Env));

        check("OCIEnvCreate", status)?;
        let env = check_ptr("OCIEnvCreate", env)?;

        let err = HandleGuard::acquire(&driver, env.get(), HandleType::Error)?;

        log::debug!("oracle: created environment {:?}", env.get());

        Ok(Self { err, env, driver })
    }

    /// Opens a connection: attaches to the server named by `source` and begins a session.
    pub fn connect(&self, source: &Source) -> Result<OracleConnection<'_, D>, Error> {
        OracleConnection::establish(self, source)
    }

    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    pub fn handle(&self) -> D::Handle {
        self.env.get()
    }

    pub fn error_handle(&self) -> D::Handle {
        self.err.get()
    }

    /// Column type used for date values in DDL written against this backend.
    pub fn date_column_type(&self) -> &'static str {
        "date"
    }
}

impl<D: Oci> std::fmt::Debug for OracleEnvironment<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleEnvironment")
            .field("env", &self.env)
            .field("err", &self.err)
            .finish()
    }
}

impl<D: Oci> Drop for OracleEnvironment<D> {
    fn drop(&mut self) {
        log::debug!("oracle: releasing environment {:?}", self.env.get());
    }
}
