//! Probe target addresses.

use super::Port;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// An IP address plus a port: the identity of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransportAddress {
    ip: IpAddr,
    port: Port,
}

impl TransportAddress {
    pub const fn new(ip: IpAddr, port: Port) -> Self {
        Self { ip, port }
    }

    pub const fn ip(&self) -> IpAddr {
        self.ip
    }

    pub const fn port(&self) -> Port {
        self.port
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port.as_u16())
    }
}

impl From<TransportAddress> for SocketAddr {
    fn from(addr: TransportAddress) -> Self {
        addr.socket_addr()
    }
}

impl fmt::Display for TransportAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}
