//! Connection-string building for the supported SQL dialects.
//!
//! A [`Dsn`] holds the usual name/user/pass/host/port/args fields and renders them
//! in a driver's native format, filling in that driver's defaults:
//!
//! | driver   | port | user       | args                           |
//! |----------|------|------------|--------------------------------|
//! | MySQL    | 3306 | `root`     | `loc=Local`, `parseTime=true`  |
//! | Postgres | 5432 | `postgres` | `sslmode=disable`              |
//! | SQLite   | -    | -          | -                              |

use std::collections::BTreeMap;

use clap::ValueEnum;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::error::RecordSetError;

const DEFAULT_HOST: &str = "127.0.0.1";
const LOCAL_HOSTS: [&str; 3] = ["127.0.0.1", "localhost", "::1"];

/// Characters left alone when escaping a URL path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// SQL dialect a connection string is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// MySQL / MariaDB (`go-sql-driver` style DSN)
    Mysql,
    /// `PostgreSQL` (libpq key/value DSN)
    Postgres,
    /// `SQLite` file path
    Sqlite,
}

/// Connection parameters, loadable from JSON config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dsn {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub name: String,
    pub args: BTreeMap<String, String>,
}

impl Dsn {
    #[must_use]
    pub fn builder() -> DsnBuilder {
        DsnBuilder::default()
    }

    /// Parse a JSON object such as `{"host": "db1", "user": "app", "name": "shop"}`.
    ///
    /// # Errors
    /// Returns `RecordSetError::ConfigError` if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, RecordSetError> {
        serde_json::from_str(json)
            .map_err(|e| RecordSetError::ConfigError(format!("invalid DSN JSON: {e}")))
    }

    /// Render the connection string for `driver`.
    ///
    /// # Errors
    /// Returns `RecordSetError::ConfigError` when a network driver is given a
    /// non-local host without a user.
    pub fn connection_string(&self, driver: Driver) -> Result<String, RecordSetError> {
        match driver {
            Driver::Mysql => self.mysql(),
            Driver::Postgres => self.postgres(),
            Driver::Sqlite => Ok(self.sqlite()),
        }
    }

    fn host(&self) -> &str {
        if self.host.is_empty() {
            DEFAULT_HOST
        } else {
            &self.host
        }
    }

    fn require_user(&self) -> Result<(), RecordSetError> {
        if self.user.is_empty() && !LOCAL_HOSTS.contains(&self.host()) {
            return Err(RecordSetError::ConfigError(
                "invalid DSN: missing 'user'".to_string(),
            ));
        }
        Ok(())
    }

    fn args_with_defaults(&self, defaults: &[(&str, &str)]) -> BTreeMap<String, String> {
        let mut args = self.args.clone();
        for (key, value) in defaults {
            args.entry((*key).to_string())
                .or_insert_with(|| (*value).to_string());
        }
        args
    }

    fn mysql(&self) -> Result<String, RecordSetError> {
        self.require_user()?;
        let args = self.args_with_defaults(&[("loc", "Local"), ("parseTime", "true")]);
        let port = if self.port == 0 { 3306 } else { self.port };

        let mut ident = if self.user.is_empty() {
            "root".to_string()
        } else {
            self.user.clone()
        };
        if !self.pass.is_empty() {
            ident.push(':');
            ident.push_str(&self.pass);
        }

        let host = self.host();
        let addr = if host.contains(':') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };
        let query = args
            .iter()
            .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, PATH_SEGMENT)))
            .collect::<Vec<_>>()
            .join("&");
        Ok(format!("{ident}@tcp({addr})/{}?{query}", self.name))
    }

    fn postgres(&self) -> Result<String, RecordSetError> {
        self.require_user()?;
        let args = self.args_with_defaults(&[("sslmode", "disable")]);
        let port = if self.port == 0 { 5432 } else { self.port };
        let user = if self.user.is_empty() {
            "postgres"
        } else {
            &self.user
        };

        let mut parts = vec![
            format!("host={}", self.host()),
            format!("port={port}"),
            format!("user={user}"),
        ];
        if !self.pass.is_empty() {
            parts.push(format!("password={}", self.pass));
        }
        parts.push(format!("dbname={}", self.name));
        parts.extend(args.iter().map(|(k, v)| format!("{k}={v}")));
        Ok(parts.join(" "))
    }

    fn sqlite(&self) -> String {
        let path = if self.name.is_empty() {
            ":memory:"
        } else {
            &self.name
        };
        if self.args.is_empty() {
            return path.to_string();
        }
        let query = self
            .args
            .iter()
            .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, PATH_SEGMENT)))
            .collect::<Vec<_>>()
            .join("&");
        format!("file:{path}?{query}")
    }

    /// Open a `SQLite` connection described by this DSN.
    ///
    /// # Errors
    /// Returns `RecordSetError::ConfigError` for drivers other than `SQLite` (no
    /// network drivers are linked) and `RecordSetError::SqliteError` if the file
    /// cannot be opened.
    #[cfg(feature = "sqlite")]
    pub fn connect(&self, driver: Driver) -> Result<rusqlite::Connection, RecordSetError> {
        use rusqlite::OpenFlags;

        if driver != Driver::Sqlite {
            return Err(RecordSetError::ConfigError(format!(
                "no {driver:?} driver available; only Sqlite connections can be opened"
            )));
        }
        let target = self.sqlite();
        tracing::debug!(path = %target, "opening sqlite connection");
        let flags = OpenFlags::default() | OpenFlags::SQLITE_OPEN_URI;
        Ok(rusqlite::Connection::open_with_flags(target, flags)?)
    }
}

/// Fluent builder for [`Dsn`].
#[derive(Debug, Clone, Default)]
pub struct DsnBuilder {
    dsn: Dsn,
}

impl DsnBuilder {
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.dsn.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.dsn.port = port;
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.dsn.user = user.into();
        self
    }

    #[must_use]
    pub fn pass(mut self, pass: impl Into<String>) -> Self {
        self.dsn.pass = pass.into();
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.dsn.name = name.into();
        self
    }

    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dsn.args.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> Dsn {
        self.dsn
    }
}
