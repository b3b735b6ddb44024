//! Library crate for portsweep-rs: a concurrent TCP connect scanner.
//!
//! [`targets::expand_target`] and [`ports::parse_port_spec`] turn user input
//! into addresses and ports, [`scanner::ScanEngine`] fans the work out over a
//! fixed worker pool, and each worker runs [`probe::probe`] per pair.
pub mod config;
pub mod error;
pub mod ports;
pub mod probe;
pub mod report;
pub mod scanner;
pub mod services;
pub mod targets;
pub mod types;

pub use error::ScanError;
pub use scanner::{ResultStream, ScanEngine};
pub use types::{PortStatus, ScanResult, ScanSummary};
