use super::{TSocket, MIN_READ_TIMEOUT};
use socket2::{Domain, Protocol, Type};
use std::net::Ipv4Addr;
use std::{io, time::Duration};

pub(crate) struct RawSocket {
    socket: socket2::Socket,
}

impl RawSocket {
    pub(crate) fn new(timeout: Duration) -> Result<Self, io::Error> {
        tracing::trace!("creating RawSocket");
        let socket = socket2::Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        socket.set_read_timeout(Some(timeout.max(MIN_READ_TIMEOUT)))?;
        Ok(RawSocket { socket })
    }
}

impl TSocket for RawSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
        // Socket2 gives a safety guaranty which allows us to do an unsafe cast from `&mut [u8]`
        // to `&mut [std::mem::MaybeUninit<u8>]`: it never writes uninitialised bytes into the
        // buffer.
        // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
        //
        // On a RAW socket we get the whole IP packet.
        let (n, socket_addr) = self.socket.recv_from(unsafe {
            &mut *(std::ptr::addr_of_mut!(*buf) as *mut [std::mem::MaybeUninit<u8>])
        })?;
        let source = socket_addr
            .as_socket_ipv4()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "non IPv4 source address"))?;
        Ok((n, *source.ip()))
    }

    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.socket.set_read_timeout(Some(timeout))
    }

    fn set_ttl(&self, ttl: u32) -> io::Result<()> {
        self.socket.set_ttl(ttl)
    }

    fn set_recv_buffer_size(&self, size: usize) -> io::Result<()> {
        self.socket.set_recv_buffer_size(size)
    }
}

impl Drop for RawSocket {
    fn drop(&mut self) {
        tracing::trace!("closing RawSocket");
    }
}
