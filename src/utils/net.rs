use anyhow::{Context, Result};
use std::net::{IpAddr, UdpSocket};

/// Discover the local address this host would use to reach a public
/// endpoint. Connecting a UDP socket only runs a routing-table lookup; no
/// datagram is ever sent.
pub fn outbound_address() -> Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind discovery socket")?;
    socket
        .connect("8.8.8.8:80")
        .context("No route to a public network")?;
    let local = socket
        .local_addr()
        .context("Failed to read the local endpoint of the discovery socket")?;
    Ok(local.ip())
}
