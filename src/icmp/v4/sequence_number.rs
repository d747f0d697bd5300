type SequenceNumberInnerType = u16;

/// ICMP echo sequence number, assigned per probe in send order.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct SequenceNumber(SequenceNumberInnerType);

impl SequenceNumber {
    fn start_value_inner_type() -> SequenceNumberInnerType {
        // ICMPv4 sequence numbers start from 1.
        SequenceNumberInnerType::from(1u8)
    }

    #[must_use]
    pub fn start_value() -> SequenceNumber {
        SequenceNumber(Self::start_value_inner_type())
    }

    pub(crate) fn max_value() -> SequenceNumberInnerType {
        SequenceNumberInnerType::MAX
    }

    #[must_use]
    pub fn next(self) -> Self {
        if self.0 == Self::max_value() {
            Self::start_value()
        } else {
            SequenceNumber(self.0 + 1)
        }
    }
}

impl From<SequenceNumber> for SequenceNumberInnerType {
    fn from(value: SequenceNumber) -> Self {
        value.0
    }
}

impl From<SequenceNumberInnerType> for SequenceNumber {
    fn from(value: SequenceNumberInnerType) -> Self {
        SequenceNumber(value)
    }
}

impl std::fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_one() {
        assert_eq!(1u16, SequenceNumber::start_value().into());
    }

    #[test]
    fn next_is_strictly_increasing() {
        let first = SequenceNumber::start_value();
        let second = first.next();
        assert!(second > first);
        assert_eq!(2u16, second.into());
    }

    #[test]
    fn next_after_max_restarts() {
        assert_eq!(SequenceNumber::start_value(), SequenceNumber::from(u16::MAX).next());
    }
}
