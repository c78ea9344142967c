pub mod client;
pub mod config;
pub mod connection_pool;
pub mod driver;
pub mod errors;
pub mod identity;
pub mod metrics;
pub mod percentiles;
pub mod probe;
pub mod report;
pub mod summary;
pub mod utils;
