//! ICMPv4 wire format and sockets.

pub use checksum::{checksum, is_valid};
pub use icmpv4::{
    decode, encode_echo_request, InvalidReason, ParsedReply, DEFAULT_PAYLOAD_SIZE, ICMP_HEADER_LEN,
    IPV4_HEADER_LEN,
};
pub use identifier::Identifier;
pub use sequence_number::SequenceNumber;
pub use ttl::Ttl;

pub(crate) use socket::{RawSocket, TSocket, MIN_READ_TIMEOUT};

mod checksum;
mod icmpv4;
mod identifier;
mod sequence_number;
mod socket;
mod ttl;

#[cfg(test)]
pub(crate) use socket::tests;
