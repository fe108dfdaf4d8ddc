pub mod aggregator;
pub mod cli;
pub mod client;
pub mod configuration;
pub mod domain;
pub mod export;
pub mod governor;
pub mod names;
pub mod telemetry;
