use ipnet::IpNet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::ScanError;

/// Largest block `expand_target` will materialize: a full IPv4 /8. Every
/// IPv4 block from /8 down is accepted; bigger ones (and most IPv6 prefixes)
/// cannot be held in memory as an address list.
pub const MAX_TARGET_ADDRESSES: u128 = 1 << 24;

/// Expand a host specification into the individual addresses to scan.
///
/// - a single address yields itself
/// - a CIDR block yields every address in ascending order; host bits in the
///   input are masked off, so `10.0.0.5/30` means `10.0.0.0/30`
/// - when a block holds more than two addresses, the first (network) and last
///   (broadcast) are dropped; /31 and /32 (and IPv6 /127, /128) come back whole
pub fn expand_target(spec: &str) -> Result<Vec<IpAddr>, ScanError> {
    let spec = spec.trim();

    if let Ok(ip) = spec.parse::<IpAddr>() {
        return Ok(vec![ip]);
    }

    let net: IpNet = spec.parse().map_err(|e: ipnet::AddrParseError| {
        ScanError::InvalidTarget {
            input: spec.to_string(),
            reason: format!("not an IP address or CIDR block ({e})"),
        }
    })?;

    let (start, end) = numeric_bounds(&net);
    let size = (end - start).saturating_add(1);
    if size > MAX_TARGET_ADDRESSES {
        return Err(ScanError::TargetTooLarge {
            input: spec.to_string(),
            size,
            limit: MAX_TARGET_ADDRESSES,
        });
    }

    let (first, last) = if size > 2 { (start + 1, end - 1) } else { (start, end) };
    Ok((first..=last).map(|n| from_numeric(&net, n)).collect())
}

fn numeric_bounds(net: &IpNet) -> (u128, u128) {
    match net {
        IpNet::V4(n4) => (
            u32::from(n4.network()) as u128,
            u32::from(n4.broadcast()) as u128,
        ),
        IpNet::V6(n6) => (u128::from(n6.network()), u128::from(n6.broadcast())),
    }
}

fn from_numeric(net: &IpNet, n: u128) -> IpAddr {
    match net {
        IpNet::V4(_) => IpAddr::V4(Ipv4Addr::from(n as u32)),
        IpNet::V6(_) => IpAddr::V6(Ipv6Addr::from(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn single_address_is_returned_as_is() {
        assert_eq!(expand_target("192.168.1.7").unwrap(), vec![v4(192, 168, 1, 7)]);
        assert_eq!(
            expand_target("::1").unwrap(),
            vec![IpAddr::V6(Ipv6Addr::LOCALHOST)]
        );
    }

    #[test]
    fn slash_30_drops_network_and_broadcast() {
        let ips = expand_target("192.168.1.0/30").unwrap();
        assert_eq!(ips, vec![v4(192, 168, 1, 1), v4(192, 168, 1, 2)]);
    }

    #[test]
    fn host_bits_are_masked() {
        let ips = expand_target("10.0.0.6/30").unwrap();
        assert_eq!(ips, vec![v4(10, 0, 0, 5), v4(10, 0, 0, 6)]);
    }

    #[test]
    fn tiny_blocks_are_untouched() {
        assert_eq!(expand_target("10.0.0.8/32").unwrap(), vec![v4(10, 0, 0, 8)]);
        assert_eq!(
            expand_target("10.0.0.8/31").unwrap(),
            vec![v4(10, 0, 0, 8), v4(10, 0, 0, 9)]
        );
    }

    #[test]
    fn slash_24_is_ascending_and_has_254_hosts() {
        let ips = expand_target("172.16.5.0/24").unwrap();
        assert_eq!(ips.len(), 254);
        assert_eq!(ips.first(), Some(&v4(172, 16, 5, 1)));
        assert_eq!(ips.last(), Some(&v4(172, 16, 5, 254)));
        assert!(ips.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn ipv6_block_follows_the_same_policy() {
        let ips = expand_target("fd00::/126").unwrap();
        let expected: Vec<IpAddr> = ["fd00::1", "fd00::2"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(ips, expected);
    }

    #[test]
    fn garbage_is_invalid_target() {
        for bad in ["", "example", "300.1.1.1", "10.0.0.0/33", "10.0.0.0/"] {
            match expand_target(bad) {
                Err(ScanError::InvalidTarget { input, .. }) => assert_eq!(input, bad),
                other => panic!("{bad:?} -> {other:?}"),
            }
        }
    }

    #[test]
    fn large_private_ipv4_blocks_expand() {
        let ips = expand_target("172.16.0.0/12").unwrap();
        assert_eq!(ips.len(), (1 << 20) - 2);
        assert_eq!(ips.first(), Some(&v4(172, 16, 0, 1)));
        assert_eq!(ips.last(), Some(&v4(172, 31, 255, 254)));
    }

    #[test]
    fn oversized_block_is_rejected() {
        assert!(matches!(
            expand_target("10.0.0.0/7"),
            Err(ScanError::TargetTooLarge { size, .. }) if size == 1 << 25
        ));
        assert!(matches!(
            expand_target("0.0.0.0/0"),
            Err(ScanError::TargetTooLarge { .. })
        ));
        assert!(matches!(
            expand_target("fd00::/64"),
            Err(ScanError::TargetTooLarge { .. })
        ));
        assert_eq!(expand_target("fd00::/112").unwrap().len(), (1 << 16) - 2);
    }
}
