pub mod adapter;
pub mod error;
pub mod sql;

#[cfg(any(test, feature = "testing"))]
pub mod memory;
