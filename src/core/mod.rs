pub mod analysis;
pub mod augment;
pub mod dataset;
pub mod operations;
pub mod report;
