use std::{
    net::{IpAddr, Ipv4Addr, UdpSocket},
    num::NonZeroUsize,
};

/// Address used to pick the outbound interface; nothing is sent to it.
const ROUTE_PROBE_ADDR: (Ipv4Addr, u16) = (Ipv4Addr::new(198, 51, 100, 1), 1);

/// Number of CPUs available to this process.
pub fn num_cores() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// IP address of the interface used for outbound traffic.
///
/// Connecting a UDP socket only selects a route, no packet leaves the host.
/// Returns `None` on hosts without a usable route.
pub fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(ROUTE_PROBE_ADDR).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

/// Host to bind and advertise: explicit choice, else the outbound interface, else loopback.
pub fn resolve_host(explicit: Option<&str>) -> String {
    match explicit.map(str::trim).filter(|h| !h.is_empty()) {
        Some(host) => host.to_string(),
        None => local_ip()
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .to_string(),
    }
}
