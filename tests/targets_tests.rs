use portsweep_rs::targets::expand_target;
use portsweep_rs::ScanError;
use std::net::{IpAddr, Ipv4Addr};

#[test]
fn blocks_over_two_addresses_lose_exactly_first_and_last() {
    for prefix in 24..=30u8 {
        let ips = expand_target(&format!("10.20.30.0/{prefix}")).expect("valid block");
        let block = 1usize << (32 - prefix);
        assert_eq!(ips.len(), block - 2, "/{prefix}");
        assert_eq!(ips[0], IpAddr::V4(Ipv4Addr::new(10, 20, 30, 1)));
        let last = Ipv4Addr::from(u32::from(Ipv4Addr::new(10, 20, 30, 0)) + block as u32 - 2);
        assert_eq!(ips[ips.len() - 1], IpAddr::V4(last));
    }
}

#[test]
fn small_blocks_keep_everything() {
    assert_eq!(expand_target("10.20.30.4/32").expect("valid").len(), 1);
    assert_eq!(expand_target("10.20.30.4/31").expect("valid").len(), 2);
}

#[test]
fn slash_8_is_accepted() {
    let ips = expand_target("10.0.0.0/8").expect("a /8 is a valid target");
    assert_eq!(ips.len(), (1 << 24) - 2);
    assert_eq!(ips[0], IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
    assert_eq!(ips[ips.len() - 1], IpAddr::V4(Ipv4Addr::new(10, 255, 255, 254)));
}

#[test]
fn single_address_round_trips() {
    let ips = expand_target(" 127.0.0.1 ").expect("valid");
    assert_eq!(ips, vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]);
}

#[test]
fn hostname_is_invalid_target() {
    assert!(matches!(
        expand_target("localhost"),
        Err(ScanError::InvalidTarget { .. })
    ));
}
