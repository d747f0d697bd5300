use crate::icmp::v4::{TSocket, Ttl, ICMP_HEADER_LEN, IPV4_HEADER_LEN, MIN_READ_TIMEOUT};
use crate::{ProbeError, ProbeResult};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

const MIN_RECV_BUFFER_LEN: usize = 1024;

/// Outcome of waiting for one datagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Received {
    Datagram { len: usize, source: Ipv4Addr, at: Instant },
    TimedOut,
}

/// The raw socket(s) of one session. Dropping the transport closes them.
pub(crate) struct Transport<S: TSocket> {
    sender: S,
    // traceroute receives on its own socket; ping uses `sender` for both directions
    receiver: Option<S>,
}

impl<S> Transport<S>
where
    S: TSocket,
{
    pub(crate) fn open<F>(open_socket: F, timeout: Duration) -> ProbeResult<Self>
    where
        F: Fn(Duration) -> io::Result<S>,
    {
        let sender = open_socket(timeout).map_err(ProbeError::from_socket_open)?;
        tracing::debug!("transport opened");
        Ok(Transport { sender, receiver: None })
    }

    pub(crate) fn open_split<F>(open_socket: F, timeout: Duration) -> ProbeResult<Self>
    where
        F: Fn(Duration) -> io::Result<S>,
    {
        let sender = open_socket(timeout).map_err(ProbeError::from_socket_open)?;
        let receiver = open_socket(timeout).map_err(ProbeError::from_socket_open)?;
        // a raw socket gets a copy of every ICMP datagram; the sender never reads its copies
        if let Err(e) = sender.set_recv_buffer_size(0) {
            tracing::debug!("could not shrink the sending socket's receive buffer: {}", e);
        }
        tracing::debug!("split transport opened");
        Ok(Transport { sender, receiver: Some(receiver) })
    }

    fn receiver(&self) -> &S {
        self.receiver.as_ref().unwrap_or(&self.sender)
    }

    pub(crate) fn set_ttl(&self, ttl: Ttl) -> ProbeResult<()> {
        tracing::trace!("setting ttl {}", ttl);
        self.sender.set_ttl(ttl.into())?;
        Ok(())
    }

    /// Sends `packet` and returns the send timestamp.
    pub(crate) fn send(&self, packet: &[u8], destination: Ipv4Addr) -> ProbeResult<Instant> {
        let addr: socket2::SockAddr = SocketAddr::new(destination.into(), 0).into();
        let send_time = Instant::now();
        self.sender.send_to(packet, &addr)?;
        Ok(send_time)
    }

    /// Waits for the next datagram until `deadline`.
    ///
    /// The socket read timeout is re-armed with whatever is left of the deadline, so repeated
    /// calls for one probe never wait longer than the probe's timeout in total.
    pub(crate) fn receive(&self, buf: &mut [u8], deadline: Instant) -> ProbeResult<Received> {
        let socket = self.receiver();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining < MIN_READ_TIMEOUT {
                return Ok(Received::TimedOut);
            }
            socket.set_read_timeout(remaining)?;
            match socket.recv_from(buf) {
                Ok((len, source)) => {
                    return Ok(Received::Datagram { len, source, at: Instant::now() });
                }
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    return Ok(Received::TimedOut);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("receive failed: {}", e);
                    return Err(e.into());
                }
            }
        }
    }
}

impl<S> Drop for Transport<S>
where
    S: TSocket,
{
    fn drop(&mut self) {
        tracing::debug!("transport closed");
    }
}

/// Receive buffer large enough for a full reply to a probe carrying `payload_size` bytes.
pub(crate) fn recv_buffer(payload_size: usize) -> Vec<u8> {
    // IPv4 header options can take up to 40 more bytes
    vec![0u8; (IPV4_HEADER_LEN + 40 + ICMP_HEADER_LEN + payload_size).max(MIN_RECV_BUFFER_LEN)]
}
