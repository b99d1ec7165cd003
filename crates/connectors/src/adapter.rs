use crate::{
    error::AdapterError,
    sql::{base::connection::Connection, mysql::connection::MySqlConnection},
};
use std::str::FromStr;

/// Database drivers a connection can be created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    MySql,
}

impl FromStr for Driver {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Driver::MySql),
            other => Err(AdapterError::UnsupportedDriver(other.to_string())),
        }
    }
}

pub struct Adapter;

impl Adapter {
    /// Creates a closed connection for `driver`; the caller opens it.
    pub fn connection(driver: &str, dsn: &str) -> Result<Box<dyn Connection>, AdapterError> {
        if dsn.trim().is_empty() {
            return Err(AdapterError::MissingProperty("dsn".into()));
        }
        match driver.parse::<Driver>()? {
            Driver::MySql => Ok(Box::new(MySqlConnection::new(dsn)?)),
        }
    }
}
