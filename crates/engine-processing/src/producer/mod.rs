pub mod reader;

pub use reader::{DataReader, Renewal};
