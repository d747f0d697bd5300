use std::net::Ipv4Addr;
use std::{io, time::Duration};

pub(crate) use raw_socket::RawSocket;

mod raw_socket;

/// Shortest read timeout a socket can hold. `SO_RCVTIMEO` has microsecond resolution and a
/// zero value means "block forever".
pub(crate) const MIN_READ_TIMEOUT: Duration = Duration::from_micros(1);

pub(crate) trait TSocket: Send + Sync {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;
    /// Reads one datagram, IP header included, and reports who sent it.
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)>;
    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()>;
    /// Applies to packets sent afterwards on this socket only.
    fn set_ttl(&self, ttl: u32) -> io::Result<()>;
    /// The kernel rounds the size up to its own minimum.
    fn set_recv_buffer_size(&self, size: usize) -> io::Result<()>;
}
