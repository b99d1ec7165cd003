use connectors::{
    adapter::Adapter, error::AdapterError, sql::base::connection::Connection,
};
use engine_config::settings::DbConfig;

/// Creates the connections a dataset pipeline needs. Every call returns a
/// new, closed connection owned by the caller.
pub trait ConnectionFactory: Send + Sync {
    fn source(&self) -> Result<Box<dyn Connection>, AdapterError>;

    fn destination(&self) -> Result<Box<dyn Connection>, AdapterError>;
}

/// Builds connections from the configured driver and DSN.
pub struct AdapterFactory {
    source: DbConfig,
    dest: DbConfig,
}

impl AdapterFactory {
    pub fn new(source: DbConfig, dest: DbConfig) -> Self {
        Self { source, dest }
    }
}

impl ConnectionFactory for AdapterFactory {
    fn source(&self) -> Result<Box<dyn Connection>, AdapterError> {
        Adapter::connection(&self.source.driver, &self.source.dsn)
    }

    fn destination(&self) -> Result<Box<dyn Connection>, AdapterError> {
        Adapter::connection(&self.dest.driver, &self.dest.dsn)
    }
}
