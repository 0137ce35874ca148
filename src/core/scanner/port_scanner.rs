// src/core/scanner/port_scanner.rs

use futures::future::join_all;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::core::models::PortScanReport;

/// The fixed set of ports probed by the ports tool.
pub const COMMON_PORTS: [u16; 18] = [
    21, 22, 23, 25, 53, 80, 110, 143, 443, 465, 587, 993, 995, 3306, 3389, 5900, 8080, 8443,
];

/// Default connect budget per port.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Probes every port in `ports` on `address` at once and returns the open ones, ascending.
///
/// A port is open when a TCP handshake completes inside `connect_timeout`. The stream is
/// dropped immediately. Refusals, timeouts and other connect errors all count as closed.
/// The list is only returned once every probe has settled.
pub async fn probe(address: IpAddr, ports: &[u16], connect_timeout: Duration) -> Vec<u16> {
    info!(%address, ports = ports.len(), "Starting port probe.");

    let probes = ports.iter().map(|&port| probe_port(address, port, connect_timeout));
    let mut open_ports: Vec<u16> = join_all(probes)
        .await
        .into_iter()
        .filter_map(|(port, is_open)| is_open.then_some(port))
        .collect();

    open_ports.sort_unstable();
    open_ports.dedup();

    info!(%address, open = open_ports.len(), "Port probe finished.");
    open_ports
}

/// Runs [`probe`] against [`COMMON_PORTS`].
///
/// # Arguments
///
/// * `address` - The already-resolved address to probe.
/// * `connect_timeout` - Budget for each individual TCP handshake.
///
/// # Returns
///
/// A `PortScanReport` whose `open_ports` is ascending and may be empty. Probing itself
/// never fails; an unreachable host just reports nothing open.
pub async fn run_port_scan(address: IpAddr, connect_timeout: Duration) -> PortScanReport {
    PortScanReport {
        address,
        open_ports: probe(address, &COMMON_PORTS, connect_timeout).await,
    }
}

async fn probe_port(address: IpAddr, port: u16, connect_timeout: Duration) -> (u16, bool) {
    let socket = SocketAddr::new(address, port);
    match timeout(connect_timeout, TcpStream::connect(socket)).await {
        Ok(Ok(stream)) => {
            debug!(%socket, "Port open.");
            drop(stream);
            (port, true)
        }
        Ok(Err(e)) => {
            debug!(%socket, error = %e, "Port closed.");
            (port, false)
        }
        Err(_) => {
            debug!(%socket, "Port probe timed out.");
            (port, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn reports_only_listening_ports_in_ascending_order() {
        let a = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let b = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let pa = a.local_addr().unwrap().port();
        let pb = b.local_addr().unwrap().port();
        let closed = closed_port().await;

        let localhost: IpAddr = "127.0.0.1".parse().unwrap();
        let open = probe(localhost, &[pb, closed, pa], Duration::from_secs(2)).await;

        let mut expected = vec![pa, pb];
        expected.sort_unstable();
        assert_eq!(open, expected);
    }

    #[tokio::test]
    async fn nothing_listening_is_an_empty_list() {
        let closed = closed_port().await;
        let localhost: IpAddr = "127.0.0.1".parse().unwrap();
        let open = probe(localhost, &[closed], Duration::from_millis(500)).await;
        assert!(open.is_empty());
    }

    #[test]
    fn reference_set_is_ascending_and_unique() {
        assert!(COMMON_PORTS.windows(2).all(|w| w[0] < w[1]));
    }
}
