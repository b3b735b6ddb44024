use crate::error::ScanError;

/// Port specification used when none is given.
pub const DEFAULT_PORT_SPEC: &str = "1-1024";

/// Parse a port specification into the ports to scan, in order.
///
/// Two forms are accepted:
/// - inclusive range `start-end`: emits `start..=end` ascending, nothing when
///   `start > end`. A bound that is not a number is read as `0`; a number
///   above 65535 is clamped to 65535. More than one `-` is an error.
/// - comma list `80, 443,8080`: tokens are trimmed, empty tokens are skipped,
///   and tokens that do not parse as a port (including values above 65535)
///   are dropped without error.
///
/// The lenient handling is deliberate best-effort behavior and is covered by
/// tests; only a malformed range shape fails the run.
pub fn parse_port_spec(spec: &str) -> Result<Vec<u16>, ScanError> {
    let spec = spec.trim();

    if spec.contains('-') {
        let parts: Vec<&str> = spec.split('-').collect();
        let [a, b] = parts.as_slice() else {
            return Err(ScanError::InvalidPortSpec {
                input: spec.to_string(),
            });
        };
        let start = parse_bound(a);
        let end = parse_bound(b);
        return Ok((start..=end).collect());
    }

    Ok(spec
        .split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .filter_map(|tok| tok.parse::<u16>().ok())
        .collect())
}

fn parse_bound(s: &str) -> u16 {
    let s = s.trim();
    match s.parse::<u16>() {
        Ok(v) => v,
        Err(_) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => u16::MAX,
        Err(_) => 0,
    }
}
