use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::error::Error;
use crate::logger::LogSettings;
use crate::oracle::error::check_with;
use crate::oracle::oci::{Attr, Credentials, HandleType, Oci};
use crate::oracle::{HandleGuard, OracleEnvironment, OracleStatement};
use crate::source::{FetchSettings, Source};

/// A session on an Oracle server.
///
/// Owns the server, service context and session handles. Dropping the connection ends the
/// session, detaches from the server and frees the handles, in that order.
pub struct OracleConnection<'e, D: Oci> {
    env: &'e OracleEnvironment<D>,

    // dropped in declaration order: the session before the context that refers to it,
    // the context before the server it is attached through
    session: HandleGuard<D>,
    svc_ctx: HandleGuard<D>,
    server: HandleGuard<D>,

    session_active: bool,
    attached: bool,

    fetch_settings: FetchSettings,
    log_settings: LogSettings,
}

impl<'e, D: Oci> OracleConnection<'e, D> {
    pub(crate) fn establish(env: &'e OracleEnvironment<D>, source: &Source) -> Result<Self, Error> {
        let driver = env.driver();
        let parent = env.handle();

        log::debug!(
            "oracle: connecting to {} as {:?}",
            source.connect_string(),
            source.username()
        );

        let server = HandleGuard::acquire(driver, parent, HandleType::Server)?;
        let svc_ctx = HandleGuard::acquire(driver, parent, HandleType::SvcCtx)?;
        let session = HandleGuard::acquire(driver, parent, HandleType::Session)?;

        // from here on, an early return runs `Drop`, which undoes whatever step was reached
        let mut conn = Self {
            env,
            session,
            svc_ctx,
            server,
            session_active: false,
            attached: false,
            fetch_settings: source.fetch_settings(),
            log_settings: source.log_settings().clone(),
        };

        let err = env.error_handle();

        check_with(
            "OCIServerAttach",
            driver.server_attach(conn.server.get(), err, &source.connect_string()),
            &**driver,
            err,
        )?;
        conn.attached = true;

        conn.set_handle_attr(HandleType::SvcCtx, Attr::Server, conn.server.get())?;

        conn.set_text_attr(Attr::Username, source.username())?;
        conn.set_text_attr(Attr::Password, source.password())?;

        check_with(
            "OCISessionBegin",
            driver.session_begin(
                conn.svc_ctx.get(),
                err,
                conn.session.get(),
                Credentials::Rdbms,
            ),
            &**driver,
            err,
        )?;
        conn.session_active = true;

        conn.set_handle_attr(HandleType::SvcCtx, Attr::Session, conn.session.get())?;

        log::debug!("oracle: connected to {}", source.connect_string());

        Ok(conn)
    }

    fn set_handle_attr(
        &self,
        target_type: HandleType,
        attr: Attr,
        value: D::Handle,
    ) -> Result<(), Error> {
        let err = self.error_handle();
        let status = self
            .driver()
            .attr_set_handle(self.svc_ctx.get(), target_type, attr, value, err);

        check_with(attr.name(), status, &**self.driver(), err)
    }

    fn set_text_attr(&self, attr: Attr, value: &str) -> Result<(), Error> {
        let err = self.error_handle();
        let status = self.driver().attr_set_text(
            self.session.get(),
            HandleType::Session,
            attr,
            value,
            err,
        );

        check_with(attr.name(), status, &**self.driver(), err)
    }

    /// Creates a statement for `sql` without preparing it.
    pub fn statement(&self, sql: &str) -> Result<OracleStatement<'_, D>, Error> {
        OracleStatement::new(self, sql)
    }

    /// Creates and prepares a statement for `sql`.
    pub fn prepare(&self, sql: &str) -> Result<OracleStatement<'_, D>, Error> {
        let mut statement = OracleStatement::new(self, sql)?;
        statement.prepare()?;

        Ok(statement)
    }

    /// Prepares and runs a statement that returns no rows, returning the affected row count.
    pub fn execute(&self, sql: &str) -> Result<u64, Error> {
        self.prepare(sql)?.execute()
    }

    pub fn commit(&self) -> Result<(), Error> {
        let err = self.error_handle();
        let status = self.driver().trans_commit(self.svc_ctx.get(), err);

        check_with("OCITransCommit", status, &**self.driver(), err)
    }

    pub fn rollback(&self) -> Result<(), Error> {
        let err = self.error_handle();
        let status = self.driver().trans_rollback(self.svc_ctx.get(), err);

        check_with("OCITransRollback", status, &**self.driver(), err)
    }

    /// Makes a round trip to the server to check the session is still usable.
    pub fn ping(&self) -> Result<(), Error> {
        let err = self.error_handle();
        let status = self.driver().ping(self.svc_ctx.get(), err);

        check_with("OCIPing", status, &**self.driver(), err)
    }

    /// The version banner reported by the server.
    pub fn server_version(&self) -> Result<String, Error> {
        let err = self.error_handle();
        let mut version = String::new();
        let status = self
            .driver()
            .server_version(self.svc_ctx.get(), err, &mut version);

        check_with("OCIServerVersion", status, &**self.driver(), err)?;

        Ok(version)
    }

    /// Ends the session and detaches from the server, reporting the first failure.
    ///
    /// Dropping a connection does the same, but can only log failures.
    pub fn close(mut self) -> Result<(), Error> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), Error> {
        let driver = Arc::clone(self.driver());
        let err = self.error_handle();
        let mut result = Ok(());

        if self.session_active {
            self.session_active = false;

            let status = driver.session_end(self.svc_ctx.get(), err, self.session.get());
            result = check_with("OCISessionEnd", status, &*driver, err);
        }

        if self.attached {
            self.attached = false;

            let status = driver.server_detach(self.server.get(), err);
            let detached = check_with("OCIServerDetach", status, &*driver, err);

            if result.is_ok() {
                result = detached;
            }
        }

        result
    }

    pub fn environment(&self) -> &'e OracleEnvironment<D> {
        self.env
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        self.fetch_settings
    }

    pub fn log_settings(&self) -> &LogSettings {
        &self.log_settings
    }

    #[inline]
    pub(crate) fn driver(&self) -> &Arc<D> {
        self.env.driver()
    }

    #[inline]
    pub(crate) fn error_handle(&self) -> D::Handle {
        self.env.error_handle()
    }

    #[inline]
    pub(crate) fn svc_ctx(&self) -> D::Handle {
        self.svc_ctx.get()
    }
}

impl<D: Oci> Drop for OracleConnection<'_, D> {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            log::warn!("oracle: failed to close connection: {}", error);
        }
    }
}

impl<D: Oci> Debug for OracleConnection<'_, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleConnection")
            .field("server", &self.server)
            .field("svc_ctx", &self.svc_ctx)
            .field("session", &self.session)
            .field("session_active", &self.session_active)
            .field("attached", &self.attached)
            .finish()
    }
}
