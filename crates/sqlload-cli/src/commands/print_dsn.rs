//! `sqlload printdsn` command implementation

use crate::config::ConnectionConfig;
use crate::error::Result;

/// Print the resolved DSN, optionally with the password hidden
pub fn run(config: &ConnectionConfig, redacted: bool) -> Result<()> {
    let dsn = if redacted {
        config.redacted_dsn()?
    } else {
        config.dsn()?
    };
    println!("{}", dsn);
    Ok(())
}
