pub mod download;
pub mod log;
pub mod mirror;
pub mod report;
