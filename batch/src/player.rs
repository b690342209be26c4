use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Numeric identifier of a player, unique across the whole history (the
/// FIDE id in the source data).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PlayerId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<PlayerId, ParseIntError> {
        s.parse().map(PlayerId)
    }
}
