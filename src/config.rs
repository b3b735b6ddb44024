use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::error::ScanError;
use crate::ports::{parse_port_spec, DEFAULT_PORT_SPEC};
use crate::scanner::ScanEngine;
use crate::targets::expand_target;
use crate::types::ScanSummary;

pub const DEFAULT_CONCURRENCY: usize = 100;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Layout of the persisted report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human readable lines with a header and summary.
    #[default]
    Text,
    /// One JSON object per line, summary last.
    Json,
}

/// Everything a scan run needs, before any validation.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub target: String,
    pub ports_spec: String,
    pub concurrency: usize,
    pub timeout: Duration,
    pub verbose: bool,
    pub output: Option<PathBuf>,
    pub format: ReportFormat,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            ports_spec: DEFAULT_PORT_SPEC.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            verbose: false,
            output: None,
            format: ReportFormat::Text,
        }
    }
}

/// A validated run: the engine to drive and the ports to feed it.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub engine: ScanEngine,
    pub ports: Vec<u16>,
}

impl ScanConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Do the fatal startup work: expand the target and parse the ports.
    pub fn resolve(&self) -> Result<ScanPlan, ScanError> {
        let addresses = expand_target(&self.target)?;
        let ports = parse_port_spec(&self.ports_spec)?;
        debug!(
            target = %self.target,
            hosts = addresses.len(),
            ports = ports.len(),
            "resolved scan plan"
        );
        Ok(ScanPlan {
            engine: ScanEngine::new(addresses, self.concurrency, self.timeout),
            ports,
        })
    }
}

impl ScanPlan {
    /// Fresh summary for this plan, counters at zero.
    pub fn summary(&self, config: &ScanConfig) -> ScanSummary {
        ScanSummary::new(
            &config.target,
            &config.ports_spec,
            self.engine.addresses().len(),
            self.ports.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cli_defaults() {
        let c = ScanConfig::default();
        assert_eq!(c.concurrency, 100);
        assert_eq!(c.timeout, Duration::from_millis(500));
        assert_eq!(c.ports_spec, "1-1024");
        assert_eq!(c.format, ReportFormat::Text);
        assert!(!c.verbose);
        assert!(c.output.is_none());
    }

    #[test]
    fn resolve_builds_engine_and_ports() {
        let mut c = ScanConfig::new("10.1.1.0/30");
        c.ports_spec = "22,80".into();
        c.concurrency = 0;
        let plan = c.resolve().unwrap();
        assert_eq!(plan.engine.addresses().len(), 2);
        assert_eq!(plan.engine.concurrency(), 1);
        assert_eq!(plan.ports, vec![22, 80]);

        let summary = plan.summary(&c);
        assert_eq!(summary.expected(), 4);
        assert_eq!(summary.target, "10.1.1.0/30");
    }

    #[test]
    fn resolve_surfaces_invalid_target() {
        let c = ScanConfig::new("not-a-host");
        assert!(matches!(c.resolve(), Err(ScanError::InvalidTarget { .. })));
    }

    #[test]
    fn resolve_surfaces_bad_range_shape() {
        let mut c = ScanConfig::new("127.0.0.1");
        c.ports_spec = "1-2-3".into();
        assert!(matches!(c.resolve(), Err(ScanError::InvalidPortSpec { .. })));
    }
}
