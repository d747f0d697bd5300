use rand::Rng;

/// ICMP echo identifier of one probing session.
///
/// Replies carrying a different identifier belong to someone else and are discarded.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct Identifier(u16);

impl Identifier {
    #[must_use]
    pub fn random() -> Identifier {
        Identifier(rand::thread_rng().gen())
    }
}

impl From<u16> for Identifier {
    fn from(value: u16) -> Self {
        Identifier(value)
    }
}

impl From<Identifier> for u16 {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}
