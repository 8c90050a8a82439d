//! Connection configuration
//!
//! Resolves the connection flags (already merged with their environment
//! fallbacks by clap) into a PostgreSQL DSN and `sqlx` connect options.

use crate::error::{CliError, Result};
use crate::ConnectionArgs;
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;
use url::Url;

/// Replacement for the password in redacted output
pub const REDACTED_PASSWORD: &str = "xxxxx";

const ACCEPTED_SCHEMES: [&str; 2] = ["postgres", "postgresql"];

/// Resolved connection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub encrypt: bool,
    pub trust_server_cert: bool,
    /// Full DSN overriding every other field
    pub dsn: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            name: "postgres".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            pass: String::new(),
            encrypt: false,
            trust_server_cert: true,
            dsn: None,
        }
    }
}

impl From<&ConnectionArgs> for ConnectionConfig {
    fn from(args: &ConnectionArgs) -> Self {
        Self {
            name: args.name.clone(),
            host: args.host.clone(),
            port: args.port,
            user: args.user.clone(),
            pass: args.pass.clone(),
            encrypt: args.encrypt,
            trust_server_cert: args.trust_server_cert.unwrap_or(!args.encrypt),
            dsn: args.dsn.clone().filter(|dsn| !dsn.trim().is_empty()),
        }
    }
}

impl ConnectionConfig {
    /// `sslmode` matching the encryption settings
    pub fn sslmode(&self) -> &'static str {
        match (self.encrypt, self.trust_server_cert) {
            (false, _) => "disable",
            (true, true) => "require",
            (true, false) => "verify-full",
        }
    }

    /// The DSN to connect with: the explicit one if given, else built from
    /// the individual parameters.
    pub fn dsn(&self) -> Result<Url> {
        match &self.dsn {
            Some(raw) => parse_dsn(raw),
            None => self.build_dsn(),
        }
    }

    /// [`Self::dsn`] with the password replaced by `xxxxx`
    pub fn redacted_dsn(&self) -> Result<Url> {
        let mut url = self.dsn()?;
        if url.password().is_some() {
            url.set_password(Some(REDACTED_PASSWORD))
                .map_err(|_| CliError::config("DSN cannot carry a password"))?;
        }
        Ok(url)
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        let url = self.dsn()?;
        PgConnectOptions::from_str(url.as_str())
            .map_err(|e| CliError::config(format!("invalid DSN: {}", e)))
    }

    fn build_dsn(&self) -> Result<Url> {
        if self.host.is_empty() {
            return Err(CliError::config("host must not be empty"));
        }

        let mut url = Url::parse("postgres://localhost")
            .map_err(|e| CliError::config(format!("invalid DSN: {}", e)))?;
        url.set_host(Some(&self.host))
            .map_err(|e| CliError::config(format!("invalid host '{}': {}", self.host, e)))?;
        url.set_port(Some(self.port))
            .map_err(|_| CliError::config("DSN cannot carry a port"))?;
        url.set_username(&self.user)
            .map_err(|_| CliError::config("DSN cannot carry a user name"))?;
        if !self.pass.is_empty() {
            url.set_password(Some(&self.pass))
                .map_err(|_| CliError::config("DSN cannot carry a password"))?;
        }
        url.set_path(&format!("/{}", self.name));
        url.query_pairs_mut().append_pair("sslmode", self.sslmode());

        Ok(url)
    }
}

fn parse_dsn(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| CliError::config(format!("invalid DSN: {}", e)))?;
    if !ACCEPTED_SCHEMES.contains(&url.scheme()) {
        return Err(CliError::config(format!(
            "DSN scheme must be postgres or postgresql, got '{}'",
            url.scheme()
        )));
    }
    Ok(url)
}
