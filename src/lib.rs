pub mod config;
pub mod dataset;
pub mod logging;
pub mod output;
pub mod scoring;
pub mod summary;
pub mod workflow;
