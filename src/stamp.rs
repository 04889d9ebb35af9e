//! Index-stamped payloads for driver loops and harnesses.
//!
//! The buffer itself is generic over any `T`; the drivers additionally
//! want to mint a cell value from its absolute cell index and recover
//! that index later to audit ordering. `Stamp` is that capability.

/// A payload that can be minted from, and audited against, the absolute
/// cell index it was produced for.
pub trait Stamp: Sized {
    /// Build the value for absolute cell index `index`.
    fn stamp(index: u64) -> Self;

    /// Recover the index this value claims to carry, or `-1` when the
    /// value does not decode (for example a never-written default cell).
    fn index_of(&self) -> i64;
}

/// Numeric payload: the value is the index.
impl Stamp for i64 {
    fn stamp(index: u64) -> Self {
        index as i64
    }

    fn index_of(&self) -> i64 {
        *self
    }
}

/// Text payload: the decimal rendering of the index.
impl Stamp for String {
    fn stamp(index: u64) -> Self {
        index.to_string()
    }

    fn index_of(&self) -> i64 {
        self.parse().unwrap_or(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_text_stamps_round_trip() {
        assert_eq!(<i64 as Stamp>::stamp(42).index_of(), 42);
        assert_eq!(<String as Stamp>::stamp(42), "42");
        assert_eq!(<String as Stamp>::stamp(42).index_of(), 42);
        // A default cell was never stamped.
        assert_eq!(String::default().index_of(), -1);
    }
}
