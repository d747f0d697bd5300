use std::io;
use thiserror::Error;

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// Everything that ends a probing session early.
///
/// A probe that times out, or a received buffer that fails to decode, is not an error: those are
/// recorded per probe and the session carries on.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Cannot resolve hostname: {host}")]
    Resolution { host: String },
    #[error("Permission denied. Run with root/administrator privileges.")]
    PermissionDenied(#[source] io::Error),
    #[error("could not open ICMP socket: {0}")]
    SocketOpen(#[source] io::Error),
    #[error("{0}")]
    Transport(#[from] io::Error),
    #[error("could not create ICMP packet: {0}")]
    InvalidPacket(&'static str),
}

impl ProbeError {
    /// Classifies a failure to create or configure a socket.
    pub(crate) fn from_socket_open(error: io::Error) -> ProbeError {
        if error.kind() == io::ErrorKind::PermissionDenied {
            ProbeError::PermissionDenied(error)
        } else {
            ProbeError::SocketOpen(error)
        }
    }

    pub fn resolution(host: &str) -> ProbeError {
        ProbeError::Resolution { host: host.to_owned() }
    }
}
