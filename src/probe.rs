use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::types::ScanResult;

/// How long an open port gets to volunteer a banner.
pub const BANNER_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on banner bytes kept from a single read.
pub const BANNER_MAX_BYTES: usize = 256;

/// Attempt one TCP connect to `ip:port` and classify it.
///
/// - Any connect failure (refused, timed out, unreachable) yields `Closed`.
/// - On success the port is `Open` and a single read of up to 256 bytes is
///   attempted under a 2 second deadline; whatever arrives becomes the banner
///   (lossy UTF-8), nothing or an error leaves it empty.
/// - The socket is dropped before returning on every path.
///
/// Worst case wall time is `timeout + BANNER_READ_TIMEOUT`. No retries.
pub async fn probe(ip: IpAddr, port: u16, timeout: Duration) -> ScanResult {
    let addr = SocketAddr::new(ip, port);
    match time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(mut stream)) => {
            // stamped at connect time, not after the banner wait
            let mut res = ScanResult::open(ip, port, None);
            res.banner = read_banner(&mut stream).await;
            trace!(%addr, banner = res.banner.is_some(), "open");
            res
        }
        Ok(Err(e)) => {
            trace!(%addr, error = %e, "closed");
            ScanResult::closed(ip, port)
        }
        Err(_elapsed) => {
            trace!(%addr, "connect timed out");
            ScanResult::closed(ip, port)
        }
    }
}

/// Same as [`probe`], but gives up as soon as `cancel` fires. A cancelled
/// probe produces no result.
pub async fn probe_with_cancel(
    ip: IpAddr,
    port: u16,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Option<ScanResult> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        res = probe(ip, port, timeout) => Some(res),
    }
}

/// Single bounded read. Returns `None` for silent services and read errors.
async fn read_banner(stream: &mut TcpStream) -> Option<String> {
    let mut buf = [0u8; BANNER_MAX_BYTES];
    match time::timeout(BANNER_READ_TIMEOUT, stream.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => Some(String::from_utf8_lossy(&buf[..n]).into_owned()),
        _ => None,
    }
}
