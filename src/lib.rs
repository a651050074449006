pub mod config;
pub mod engine;
pub mod logging;
pub mod stats;
