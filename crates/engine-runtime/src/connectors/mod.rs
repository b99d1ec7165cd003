pub mod factory;

pub use factory::{AdapterFactory, ConnectionFactory};
