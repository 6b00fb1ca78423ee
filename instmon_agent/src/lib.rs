//! instmon_agent: samples the local host and serves the rolling history over HTTP.

pub mod api;
pub mod config;
pub mod history;
pub mod metrics;
pub mod sampler;
pub mod state;
