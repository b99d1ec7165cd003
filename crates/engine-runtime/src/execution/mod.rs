pub mod executor;
pub mod pipeline;
pub mod report;
