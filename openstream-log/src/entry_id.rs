//! Log entry identifiers.
//!
//! Entries are identified by `<millis>-<sequence>` ids assigned by the engine.
//! Ids are strictly increasing within one log, and their natural ordering is
//! `(millis, sequence)`.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Marker meaning "only entries never delivered to this group".
pub const UNDELIVERED: &str = ">";

/// Marker meaning "the current end of the log".
pub const LATEST: &str = "$";

/// Identifier of one entry within a partition log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntryId {
    /// Milliseconds part.
    pub ms: u64,
    /// Sequence within the millisecond.
    pub seq: u64,
}

impl EntryId {
    /// The id that sorts before every real entry.
    pub const ZERO: EntryId = EntryId { ms: 0, seq: 0 };

    /// Create an id from its parts.
    pub const fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }

    /// The smallest id strictly greater than this one.
    pub fn successor(self) -> Self {
        match self.seq.checked_add(1) {
            Some(seq) => Self::new(self.ms, seq),
            None => Self::new(self.ms.saturating_add(1), 0),
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for EntryId {
    type Err = Error;

    /// Accepts `ms-seq` or a bare `ms` (sequence 0).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidId(s.to_string());
        match s.split_once('-') {
            Some((ms, seq)) => Ok(Self::new(
                ms.parse().map_err(|_| invalid())?,
                seq.parse().map_err(|_| invalid())?,
            )),
            None => Ok(Self::new(s.parse().map_err(|_| invalid())?, 0)),
        }
    }
}

/// Position a consumer group cursor can be placed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    /// The end of the log at the time of the call (`$`).
    Latest,
    /// Right after the given id (`0-0` replays everything).
    After(EntryId),
}

impl StartPosition {
    /// Parse `$` or an entry id.
    pub fn parse(s: &str) -> crate::Result<Self> {
        if s == LATEST {
            Ok(Self::Latest)
        } else {
            s.parse().map(Self::After)
        }
    }
}
