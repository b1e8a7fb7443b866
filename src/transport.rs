use std::io::{Error, ErrorKind, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use log::{debug, trace};
use socket2::{Domain, Protocol, SockAddr, Socket};

/// ICMP has no ports, but socket addresses need one. The kernel ignores it.
const ICMP_PORT_PLACEHOLDER: u16 = 0;

/// One open ICMP endpoint. Dropping it releases the underlying socket.
pub trait EchoSocket {
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()>;

    fn send_to(&mut self, packet: &[u8], destination: Ipv4Addr) -> Result<usize>;

    /// Blocks until a datagram arrives or the read timeout elapses.
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Name resolution plus a factory for scoped sockets.
pub trait Network {
    type Socket: EchoSocket;

    fn resolve(&self, host: &str) -> Result<Ipv4Addr>;

    fn open(&self, timeout: Duration) -> Result<Self::Socket>;
}

/// The host's IPv4 stack, through raw ICMP sockets.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawNetwork;

pub struct RawSocket {
    socket: Socket,
}

impl Network for RawNetwork {
    type Socket = RawSocket;

    fn resolve(&self, host: &str) -> Result<Ipv4Addr> {
        let addrs = dns_lookup::lookup_host(host)?;
        addrs
            .into_iter()
            .find_map(|addr| match addr {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .ok_or_else(|| Error::new(ErrorKind::AddrNotAvailable, "no IPv4 address for host"))
    }

    fn open(&self, timeout: Duration) -> Result<RawSocket> {
        let stype = socket2::Type::raw().cloexec();
        let socket = Socket::new(Domain::ipv4(), stype, Some(Protocol::icmpv4()))?;
        socket.set_read_timeout(Some(timeout))?;
        debug!("opened raw ICMP socket");

        Ok(RawSocket { socket })
    }
}

impl EchoSocket for RawSocket {
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.socket.set_read_timeout(Some(timeout))
    }

    fn send_to(&mut self, packet: &[u8], destination: Ipv4Addr) -> Result<usize> {
        let addr = SocketAddr::from((IpAddr::V4(destination), ICMP_PORT_PLACEHOLDER));
        self.socket.send_to(packet, &SockAddr::from(addr))
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let (len, from) = self.socket.recv_from(buf)?;
        trace!("{} bytes from {:?}", len, from.as_std());
        Ok(len)
    }
}

impl Drop for RawSocket {
    fn drop(&mut self) {
        debug!("closing raw ICMP socket");
    }
}
