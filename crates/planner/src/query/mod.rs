pub mod dialect;
pub mod formatter;
pub mod insert;
pub mod pagination;
