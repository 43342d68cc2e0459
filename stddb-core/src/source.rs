//! Connection targets.
//!
//! A [`Source`] names the server, database and credentials to connect to, and carries the
//! fetch and logging settings every connection opened from it inherits.

use std::fmt::{self, Debug, Formatter};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use url::Url;

use crate::error::Error;
use crate::logger::LogSettings;

/// Port used when the connection target does not name one.
pub const DEFAULT_PORT: u16 = 1521;

/// Rows the server sends ahead of each fetch round trip.
pub const DEFAULT_PREFETCH_ROWS: u32 = 100;

/// Rows transferred into the column buffers by a single fetch call.
pub const DEFAULT_FETCH_ROWS: u32 = 100;

/// How many rows move between the server and the client at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Value of the statement prefetch attribute, set when a statement is created.
    pub prefetch_rows: u32,
    /// Array size of every column buffer, and the row count requested per fetch call.
    pub fetch_rows: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            prefetch_rows: DEFAULT_PREFETCH_ROWS,
            fetch_rows: DEFAULT_FETCH_ROWS,
        }
    }
}

/// A connection target.
///
/// Parse one from a URL with [`FromStr`], read one from the environment with
/// [`Source::from_env`], or build one with the setters below.
///
/// ```rust
/// # use stddb_core::source::Source;
/// let source: Source = "oracle://127.0.0.1:1521/orcl?username=scott&password=tiger".parse()?;
///
/// assert_eq!(source.server(), "127.0.0.1");
/// assert_eq!(source.database(), "orcl");
/// assert_eq!(source.username(), "scott");
/// # Ok::<(), stddb_core::error::Error>(())
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Source {
    pub(crate) protocol: String,
    pub(crate) server: String,
    pub(crate) port: u16,
    pub(crate) database: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) fetch_settings: FetchSettings,
    pub(crate) log_settings: LogSettings,
}

impl Default for Source {
    fn default() -> Self {
        Self::new()
    }
}

impl Source {
    pub fn new() -> Self {
        Self {
            protocol: String::from("oracle"),
            server: String::from("localhost"),
            port: DEFAULT_PORT,
            database: String::new(),
            username: String::new(),
            password: String::new(),
            fetch_settings: FetchSettings::default(),
            log_settings: LogSettings::default(),
        }
    }

    /// Reads the connection target from the `DATABASE_URL` environment variable.
    ///
    /// A `.env` file in the working directory (or any parent) is loaded first, when present.
    pub fn from_env() -> Result<Self, Error> {
        if let Err(err) = ignore_missing(dotenvy::dotenv()) {
            log::warn!("failed to load .env file: {}", err);
        }

        let url = std::env::var("DATABASE_URL").map_err(Error::config)?;

        url.parse()
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        self.fetch_settings
    }

    pub fn log_settings(&self) -> &LogSettings {
        &self.log_settings
    }

    pub fn with_protocol(mut self, protocol: &str) -> Self {
        self.protocol = protocol.to_owned();
        self
    }

    pub fn with_server(mut self, server: &str) -> Self {
        self.server = server.to_owned();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_database(mut self, database: &str) -> Self {
        self.database = database.to_owned();
        self
    }

    pub fn with_username(mut self, username: &str) -> Self {
        self.username = username.to_owned();
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = password.to_owned();
        self
    }

    /// Sets the number of rows the server sends ahead on each round trip.
    pub fn prefetch_rows(mut self, rows: u32) -> Self {
        self.fetch_settings.prefetch_rows = rows;
        self
    }

    /// Sets the array size of every column buffer.
    ///
    /// Larger values mean fewer fetch calls for large result sets, at the cost of
    /// `rows × slot size` bytes per column. Zero is treated as one.
    pub fn fetch_rows(mut self, rows: u32) -> Self {
        self.fetch_settings.fetch_rows = rows.max(1);
        self
    }

    /// Log every statement at `level` (default: `Info`).
    pub fn log_statements(mut self, level: LevelFilter) -> Self {
        self.log_settings.log_statements(level);
        self
    }

    /// Log statements that ran for at least `duration` at `level` (default: `Warn`, 1s).
    pub fn log_slow_statements(mut self, level: LevelFilter, duration: Duration) -> Self {
        self.log_settings.log_slow_statements(level, duration);
        self
    }

    /// The Easy Connect string handed to the native client: `server:port/database`.
    pub fn connect_string(&self) -> String {
        if self.database.is_empty() {
            format!("{}:{}", self.server, self.port)
        } else {
            format!("{}:{}/{}", self.server, self.port, self.database)
        }
    }

    /// Renders this source back into URL form, credentials included.
    ///
    /// Fetch settings are emitted only when they differ from the defaults.
    pub fn to_url(&self) -> String {
        let mut url = format!(
            "{}://{}:{}/{}?username={}",
            self.protocol,
            self.server,
            self.port,
            utf8_percent_encode(&self.database, NON_ALPHANUMERIC),
            utf8_percent_encode(&self.username, NON_ALPHANUMERIC),
        );

        if self.fetch_settings.prefetch_rows != DEFAULT_PREFETCH_ROWS {
            url += &format!("&prefetch_rows={}", self.fetch_settings.prefetch_rows);
        }
        if self.fetch_settings.fetch_rows != DEFAULT_FETCH_ROWS {
            url += &format!("&fetch_rows={}", self.fetch_settings.fetch_rows);
        }

        // password goes last, everything after its key belongs to it
        url += &format!(
            "&password={}",
            utf8_percent_encode(&self.password, NON_ALPHANUMERIC)
        );
        url
    }
}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("protocol", &self.protocol)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("fetch_settings", &self.fetch_settings)
            .field("log_settings", &self.log_settings)
            .finish()
    }
}

impl FromStr for Source {
    type Err = Error;

    /// Parse a connection string into a connection target.
    ///
    /// The connection string should be a valid URL with the following format:
    /// ```text
    /// protocol://[username[:password]@]host[:port][/database][?param1=value1&param2=value2...]
    /// ```
    ///
    /// Components:
    /// - `protocol`: The backend to use, `oracle`.
    /// - `host`: The hostname or IP address of the listener.
    /// - `port`: The listener port (default is 1521).
    /// - `database`: The service name.
    ///
    /// Supported query parameters:
    /// - `username`, `password`: Credentials. Override those given in the authority part.
    /// - `prefetch_rows`: Rows the server sends ahead per round trip (default 100).
    /// - `fetch_rows`: Rows per fetch call and column buffer array size (default 100).
    ///
    /// Example:
    /// ```text
    /// oracle://127.0.0.1:1521/orcl?username=scott&password=tiger&fetch_rows=500
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url: Url = s.parse().map_err(Error::config)?;
        let mut source = Self::new().with_protocol(url.scheme());

        match url.host_str() {
            Some(host) if !host.is_empty() => source = source.with_server(host),
            _ => return Err(err_config!("connection target {:?} has no host", s)),
        }

        if let Some(port) = url.port() {
            source = source.with_port(port);
        }

        let username = url.username();
        if !username.is_empty() {
            source = source.with_username(
                &percent_decode_str(username)
                    .decode_utf8()
                    .map_err(Error::config)?,
            );
        }

        if let Some(password) = url.password() {
            source = source.with_password(
                &percent_decode_str(password)
                    .decode_utf8()
                    .map_err(Error::config)?,
            );
        }

        let path = url.path().trim_start_matches('/');
        if !path.is_empty() {
            source = source.with_database(
                &percent_decode_str(path)
                    .decode_utf8()
                    .map_err(Error::config)?,
            );
        }

        for (key, value) in url.query_pairs() {
            match &*key {
                "username" | "user" => source = source.with_username(&value),
                "password" => source = source.with_password(&value),
                "prefetch_rows" => source = source.prefetch_rows(parse_rows(&key, &value)?),
                "fetch_rows" => source = source.fetch_rows(parse_rows(&key, &value)?),
                _ => log::warn!("ignoring unknown connection parameter {:?}", key),
            }
        }

        Ok(source)
    }
}

/// A missing `.env` file is normal; anything else is worth reporting.
fn ignore_missing<T>(result: Result<T, dotenvy::Error>) -> Result<(), dotenvy::Error> {
    match result {
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err),
        Ok(_) => Ok(()),
    }
}

fn parse_rows(key: &str, value: &str) -> Result<u32, Error> {
    match value.parse::<u32>() {
        Ok(rows) if rows > 0 => Ok(rows),
        _ => Err(err_config!(
            "{} must be a positive integer, got {:?}",
            key,
            value
        )),
    }
}
