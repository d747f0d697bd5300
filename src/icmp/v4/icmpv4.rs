use super::checksum;
use super::{Identifier, SequenceNumber, Ttl};
use crate::probe_error::{ProbeError, ProbeResult};
use pnet_packet::icmp::{
    echo_reply::EchoReplyPacket,
    echo_request::{EchoRequestPacket, MutableEchoRequestPacket},
    IcmpCode, IcmpPacket, IcmpTypes,
};
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::Packet;

/// Length of the IPv4 header a raw socket prepends to every received ICMP segment.
pub const IPV4_HEADER_LEN: usize = 20;
/// Type, code, checksum, identifier and sequence number.
pub const ICMP_HEADER_LEN: usize = 8;
pub const DEFAULT_PAYLOAD_SIZE: usize = 56;

/// What a received buffer turned out to be.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParsedReply {
    EchoReply { sequence: SequenceNumber, ttl: Ttl },
    TimeExceeded,
    Invalid(InvalidReason),
}

impl ParsedReply {
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, ParsedReply::Invalid(_))
    }
}

/// Why a buffer was discarded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvalidReason {
    Truncated(usize),
    BadChecksum,
    ForeignIdentifier(Identifier),
    UnexpectedType(u8),
}

/// Builds an ICMP Echo Request: 8 byte header followed by `payload_size` bytes `0, 1, 2, ...`
/// (mod 256), checksum filled in.
pub fn encode_echo_request(
    identifier: Identifier,
    sequence_number: SequenceNumber,
    payload_size: usize,
) -> ProbeResult<Vec<u8>> {
    let payload: Vec<u8> = (0..=u8::MAX).cycle().take(payload_size).collect();
    let mut buf = vec![0u8; EchoRequestPacket::minimum_packet_size() + payload_size];

    let mut package = MutableEchoRequestPacket::new(&mut buf)
        .ok_or(ProbeError::InvalidPacket("buffer too small for echo request"))?;
    package.set_icmp_type(IcmpTypes::EchoRequest);
    package.set_icmp_code(IcmpCode::new(0));
    package.set_identifier(identifier.into());
    package.set_sequence_number(sequence_number.into());
    package.set_payload(&payload);

    package.set_checksum(0_u16);
    let sum = pnet_packet::icmp::checksum(
        &IcmpPacket::new(package.packet()).ok_or(ProbeError::InvalidPacket("buffer too small for ICMP header"))?,
    );
    package.set_checksum(sum);

    Ok(buf)
}

/// Parses a datagram as read from a raw ICMPv4 socket (IPv4 header included).
///
/// Echo replies must carry `expected` as identifier. Time Exceeded messages are accepted as-is
/// since routers only quote a truncated copy of the original probe.
#[must_use]
pub fn decode(buf: &[u8], expected: Identifier) -> ParsedReply {
    if buf.len() < IPV4_HEADER_LEN + ICMP_HEADER_LEN {
        return ParsedReply::Invalid(InvalidReason::Truncated(buf.len()));
    }
    let Some(ip_header) = Ipv4Packet::new(&buf[..IPV4_HEADER_LEN]) else {
        return ParsedReply::Invalid(InvalidReason::Truncated(buf.len()));
    };
    let ttl = Ttl(ip_header.get_ttl());

    let segment = &buf[IPV4_HEADER_LEN..];
    if !checksum::is_valid(segment) {
        return ParsedReply::Invalid(InvalidReason::BadChecksum);
    }
    let Some(icmp) = IcmpPacket::new(segment) else {
        return ParsedReply::Invalid(InvalidReason::Truncated(buf.len()));
    };

    let icmp_type = icmp.get_icmp_type();
    if icmp_type == IcmpTypes::EchoReply {
        let Some(echo_reply) = EchoReplyPacket::new(segment) else {
            return ParsedReply::Invalid(InvalidReason::Truncated(buf.len()));
        };
        let identifier = Identifier::from(echo_reply.get_identifier());
        if identifier != expected {
            return ParsedReply::Invalid(InvalidReason::ForeignIdentifier(identifier));
        }
        ParsedReply::EchoReply { sequence: echo_reply.get_sequence_number().into(), ttl }
    } else if icmp_type == IcmpTypes::TimeExceeded {
        ParsedReply::TimeExceeded
    } else {
        ParsedReply::Invalid(InvalidReason::UnexpectedType(icmp_type.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icmp::v4::tests::{echo_reply, ip_datagram, time_exceeded};
    use std::net::Ipv4Addr;

    const ID: u16 = 0xABCD;

    fn router() -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, 1)
    }

    #[test]
    fn echo_request_layout() {
        let packet = encode_echo_request(Identifier::from(1234), SequenceNumber::from(7), 56).unwrap();

        assert_eq!(ICMP_HEADER_LEN + 56, packet.len());
        assert_eq!(8, packet[0]);
        assert_eq!(0, packet[1]);
        assert_eq!(1234u16.to_be_bytes(), packet[4..6]);
        assert_eq!(7u16.to_be_bytes(), packet[6..8]);
        assert!(checksum::is_valid(&packet));
    }

    #[test]
    fn payload_is_deterministic_and_wraps() {
        let packet = encode_echo_request(Identifier::from(1), SequenceNumber::from(1), 300).unwrap();
        let payload = &packet[ICMP_HEADER_LEN..];

        assert_eq!(0, payload[0]);
        assert_eq!(55, payload[55]);
        assert_eq!(255, payload[255]);
        assert_eq!(0, payload[256]);
        assert_eq!(
            packet,
            encode_echo_request(Identifier::from(1), SequenceNumber::from(1), 300).unwrap()
        );
    }

    #[test]
    fn empty_and_odd_payloads() {
        let empty = encode_echo_request(Identifier::from(9), SequenceNumber::from(3), 0).unwrap();
        assert_eq!(ICMP_HEADER_LEN, empty.len());
        assert!(checksum::is_valid(&empty));

        let odd = encode_echo_request(Identifier::from(9), SequenceNumber::from(3), 33).unwrap();
        assert!(checksum::is_valid(&odd));
    }

    #[test]
    fn any_single_header_byte_mutation_breaks_the_checksum() {
        let packet = encode_echo_request(Identifier::from(ID), SequenceNumber::from(42), 56).unwrap();
        for idx in (0..ICMP_HEADER_LEN).filter(|idx| *idx != 2 && *idx != 3) {
            for flip in [0x01u8, 0x80, 0xFF] {
                let mut mutated = packet.clone();
                mutated[idx] ^= flip;
                assert!(!checksum::is_valid(&mutated), "byte {idx} xor {flip:#04x} went unnoticed");
            }
        }
    }

    #[test]
    fn decode_echo_reply() {
        let buf = ip_datagram(57, router(), &echo_reply(ID, 3, 56));

        assert_eq!(
            ParsedReply::EchoReply { sequence: SequenceNumber::from(3), ttl: Ttl(57) },
            decode(&buf, Identifier::from(ID))
        );
    }

    #[test]
    fn decode_rejects_foreign_identifier() {
        let buf = ip_datagram(64, router(), &echo_reply(0x1111, 1, 56));

        assert_eq!(
            ParsedReply::Invalid(InvalidReason::ForeignIdentifier(Identifier::from(0x1111))),
            decode(&buf, Identifier::from(ID))
        );
    }

    #[test]
    fn decode_time_exceeded_ignores_quoted_identifier() {
        let probe = encode_echo_request(Identifier::from(0x2222), SequenceNumber::from(1), 56).unwrap();
        let buf = ip_datagram(255, router(), &time_exceeded(&probe));

        assert_eq!(ParsedReply::TimeExceeded, decode(&buf, Identifier::from(ID)));
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        let mut buf = ip_datagram(64, router(), &echo_reply(ID, 1, 56));
        let last = buf.len() - 1;
        buf[last] ^= 0xFF;

        assert_eq!(ParsedReply::Invalid(InvalidReason::BadChecksum), decode(&buf, Identifier::from(ID)));
    }

    #[test]
    fn decode_rejects_looped_back_echo_request() {
        let probe = encode_echo_request(Identifier::from(ID), SequenceNumber::from(1), 56).unwrap();
        let buf = ip_datagram(64, Ipv4Addr::LOCALHOST, &probe);

        assert_eq!(ParsedReply::Invalid(InvalidReason::UnexpectedType(8)), decode(&buf, Identifier::from(ID)));
    }

    #[test]
    fn decode_rejects_truncated_buffer() {
        assert_eq!(ParsedReply::Invalid(InvalidReason::Truncated(27)), decode(&[0u8; 27], Identifier::from(ID)));
        assert!(decode(&[], Identifier::from(ID)).is_invalid());
    }
}
