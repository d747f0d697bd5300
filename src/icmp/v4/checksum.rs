/// Internet checksum (RFC 1071) over all of `data`, read as big-endian 16-bit words.
///
/// An odd trailing byte is padded with one zero byte. Computing the checksum of a segment whose
/// checksum field is already filled in yields `0` when the segment is intact.
#[must_use]
pub fn checksum(data: &[u8]) -> u16 {
    if data.is_empty() {
        // one's complement of an empty sum
        return 0xFFFF;
    }
    // no word index reaches usize::MAX, so every word is summed
    pnet_packet::util::checksum(data, usize::MAX)
}

/// `true` if the segment, checksum field included, sums to zero.
#[must_use]
pub fn is_valid(segment: &[u8]) -> bool {
    checksum(segment) == 0
}
