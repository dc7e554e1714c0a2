//! Partition routing.
//!
//! The partition for an event is derived from SHA-256 of `"{topic}:{key}"`:
//! the first eight digest bytes, read as a big-endian `u64`, modulo the
//! partition count. Every process computes the same index for the same
//! inputs. All keyless events of a topic share one partition.

use sha2::{Digest, Sha256};

/// Partition index in `[0, partitions)` for `key` on `topic`.
///
/// A partition count of 0 is treated as 1.
pub fn partition_for(topic: &str, key: &str, partitions: u32) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(topic.as_bytes());
    hasher.update(b":");
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % u64::from(partitions.max(1))) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(partition_for("orders", "A", 4), 2);
        assert_eq!(partition_for("orders", "B", 4), 3);
        assert_eq!(partition_for("orders", "", 4), 0);
        assert_eq!(partition_for("orders", "customer-42", 8), 1);
        assert_eq!(partition_for("payments", "", 8), 0);
        assert_eq!(partition_for("clicks", "user-7", 16), 13);
    }

    #[test]
    fn deterministic_and_in_range() {
        for n in [1, 2, 3, 7, 64, 4096] {
            for i in 0..200 {
                let key = format!("key-{i}");
                let p = partition_for("orders", &key, n);
                assert!(p < n);
                assert_eq!(p, partition_for("orders", &key, n));
            }
        }
    }

    #[test]
    fn topic_is_part_of_the_hash() {
        let spread: std::collections::HashSet<u32> = ["a", "b", "c", "d", "e", "f", "g", "h"]
            .iter()
            .map(|topic| partition_for(topic, "same-key", 1024))
            .collect();
        assert!(spread.len() > 1);
    }

    #[test]
    fn single_partition_always_zero() {
        assert_eq!(partition_for("t", "anything", 1), 0);
        assert_eq!(partition_for("t", "anything", 0), 0);
    }

    #[test]
    fn keys_spread_across_partitions() {
        let mut counts = [0u32; 4];
        for i in 0..4000 {
            counts[partition_for("orders", &format!("k{i}"), 4) as usize] += 1;
        }
        assert!(counts.iter().all(|&c| c > 800), "skewed: {counts:?}");
    }
}
