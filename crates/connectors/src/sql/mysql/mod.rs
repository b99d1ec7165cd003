pub mod connection;
pub mod dsn;
pub mod params;
pub mod row;
pub mod stream;
