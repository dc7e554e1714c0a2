//! Request bounds, checked before any engine call.

use std::fmt::Display;

use openstream_log::{EntryId, StartPosition};

use crate::error::{Result, StreamError};

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_EVENTS_PER_REQUEST: usize = 5000;
pub const MAX_PARTITIONS: u32 = 4096;
pub const MAX_COUNT: usize = 5000;
pub const MAX_BLOCK_MS: u64 = 30_000;
pub const MAX_ACK_ITEMS: usize = 4096;
pub const MAX_IDS_PER_ACK_ITEM: usize = 5000;
pub const MAX_MIN_IDLE_MS: u64 = 86_400_000;

/// Topic or group name: 1..=200 chars, no `:`.
pub fn name(kind: &str, value: &str) -> Result<()> {
    text(kind, value, 1, MAX_NAME_LEN)?;
    if value.contains(':') {
        return Err(StreamError::validation(format!("{kind} must not contain ':'")));
    }
    Ok(())
}

pub fn text(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(StreamError::validation(format!(
            "{field} must be {min}..={max} characters, got {len}"
        )));
    }
    Ok(())
}

pub fn range<T: PartialOrd + Display>(field: &str, value: T, min: T, max: T) -> Result<()> {
    if value < min || value > max {
        return Err(StreamError::validation(format!(
            "{field} must be in {min}..={max}, got {value}"
        )));
    }
    Ok(())
}

pub fn entry_id(field: &str, value: &str) -> Result<EntryId> {
    value
        .parse()
        .map_err(|_| StreamError::validation(format!("{field} is not a valid entry id: {value:?}")))
}

pub fn start_position(field: &str, value: &str) -> Result<StartPosition> {
    StartPosition::parse(value).map_err(|_| {
        StreamError::validation(format!("{field} must be '$' or an entry id, got {value:?}"))
    })
}

/// Every index must address an existing partition.
pub fn partitions(requested: &[u32], count: u32) -> Result<()> {
    match requested.iter().find(|&&p| p >= count) {
        Some(p) => Err(StreamError::validation(format!(
            "partition {p} out of range for {count} partitions"
        ))),
        None => Ok(()),
    }
}
