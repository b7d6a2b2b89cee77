use serde::{Deserialize, Serialize};

use crate::error::SqlRelayError;

/// Connection configuration handed to [`crate::Connection::open`].
///
/// The connection string is passed to the driver opaquely; the builder only
/// helps assemble the common `Key={Value};` form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    connection_string: String,
}

impl ConnectionConfig {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }

    #[must_use]
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    #[must_use]
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }
}

/// Fluent builder for `Key={Value};` connection strings.
#[derive(Debug, Clone)]
pub struct ConnectionConfigBuilder {
    driver: String,
    server: Option<String>,
    database: Option<String>,
    trusted_connection: bool,
    credentials: Option<(String, String)>,
    extra: Vec<(String, String)>,
}

impl Default for ConnectionConfigBuilder {
    fn default() -> Self {
        Self {
            driver: "SQL Server Native Client 11.0".to_owned(),
            server: None,
            database: None,
            trusted_connection: false,
            credentials: None,
            extra: Vec::new(),
        }
    }
}

impl ConnectionConfigBuilder {
    #[must_use]
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = driver.into();
        self
    }

    #[must_use]
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn trusted_connection(mut self, trusted: bool) -> Self {
        self.trusted_connection = trusted;
        self
    }

    #[must_use]
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), password.into()));
        self
    }

    /// Append an arbitrary `Key={Value};` pair.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// # Errors
    /// Returns [`SqlRelayError::ConfigError`] when no server was given.
    pub fn build(self) -> Result<ConnectionConfig, SqlRelayError> {
        let server = self
            .server
            .ok_or_else(|| SqlRelayError::ConfigError("server is required".to_owned()))?;

        let mut connection_string = format!("Driver={{{}}};Server={{{server}}};", self.driver);
        if let Some(database) = self.database {
            connection_string.push_str(&format!("Database={{{database}}};"));
        }
        if self.trusted_connection {
            connection_string.push_str("Trusted_Connection={Yes};");
        }
        if let Some((user, password)) = self.credentials {
            connection_string.push_str(&format!("Uid={{{user}}};Pwd={{{password}}};"));
        }
        for (key, value) in self.extra {
            connection_string.push_str(&format!("{key}={{{value}}};"));
        }

        Ok(ConnectionConfig { connection_string })
    }
}
