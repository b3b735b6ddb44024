use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use time::OffsetDateTime;

/// Outcome of one connect attempt. Refused, timed out and unreachable all
/// collapse into `Closed`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    Open,
    Closed,
}

impl PortStatus {
    pub fn is_open(self) -> bool {
        matches!(self, PortStatus::Open)
    }
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortStatus::Open => f.write_str("open"),
            PortStatus::Closed => f.write_str("closed"),
        }
    }
}

/// One probed (address, port) pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub address: String,
    pub port: u16,
    pub status: PortStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl ScanResult {
    /// A closed result stamped with the current time.
    pub fn closed(ip: IpAddr, port: u16) -> Self {
        Self {
            address: ip.to_string(),
            port,
            status: PortStatus::Closed,
            service: crate::services::lookup(port).map(str::to_string),
            banner: None,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// An open result stamped with the current time.
    pub fn open(ip: IpAddr, port: u16, banner: Option<String>) -> Self {
        Self {
            status: PortStatus::Open,
            banner,
            ..Self::closed(ip, port)
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Re-derive the probed endpoint. `None` only if `address` was edited by hand.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.address
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.port))
    }
}

/// Aggregate counters for a finished run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub target: String,
    pub ports_spec: String,
    pub hosts: u64,
    pub ports: u64,
    pub scanned: u64,
    pub open: u64,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl ScanSummary {
    pub fn new(target: &str, ports_spec: &str, hosts: usize, ports: usize) -> Self {
        Self {
            target: target.to_string(),
            ports_spec: ports_spec.to_string(),
            hosts: hosts as u64,
            ports: ports as u64,
            ..Self::default()
        }
    }

    /// Total (address, port) pairs the run is expected to produce.
    pub fn expected(&self) -> u64 {
        self.hosts * self.ports
    }

    pub fn record(&mut self, result: &ScanResult) {
        self.scanned += 1;
        if result.is_open() {
            self.open += 1;
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
