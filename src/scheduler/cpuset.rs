/*!
 * CPU Sets
 * Fixed-capacity CPU bitmask with Linux-style list rendering ("0-1,4")
 */

use crate::core::limits::MAX_CPUS;
use crate::core::types::CpuId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const WORDS: usize = MAX_CPUS / 64;

/// Set of CPU identifiers below `MAX_CPUS`
///
/// # Performance
/// - `Copy` so it can live inside a seqlock-protected epoch window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CpuSet {
    bits: [u64; WORDS],
}

impl CpuSet {
    /// Empty set
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { bits: [0; WORDS] }
    }

    /// Set containing CPUs `0..count`
    #[must_use]
    pub fn first_n(count: usize) -> Self {
        let mut set = Self::new();
        for cpu in 0..count.min(MAX_CPUS) {
            set.insert(cpu as CpuId);
        }
        set
    }

    /// Set containing exactly `cpu`
    #[must_use]
    pub fn single(cpu: CpuId) -> Self {
        let mut set = Self::new();
        set.insert(cpu);
        set
    }

    /// Add a CPU, returning whether it was newly inserted
    ///
    /// CPUs at or beyond `MAX_CPUS` are ignored.
    #[inline]
    pub fn insert(&mut self, cpu: CpuId) -> bool {
        let idx = cpu as usize;
        if idx >= MAX_CPUS {
            return false;
        }
        let mask = 1u64 << (idx % 64);
        let word = &mut self.bits[idx / 64];
        let fresh = *word & mask == 0;
        *word |= mask;
        fresh
    }

    #[inline]
    pub fn remove(&mut self, cpu: CpuId) -> bool {
        let idx = cpu as usize;
        if idx >= MAX_CPUS {
            return false;
        }
        let mask = 1u64 << (idx % 64);
        let word = &mut self.bits[idx / 64];
        let present = *word & mask != 0;
        *word &= !mask;
        present
    }

    #[inline(always)]
    #[must_use]
    pub fn contains(&self, cpu: CpuId) -> bool {
        let idx = cpu as usize;
        idx < MAX_CPUS && self.bits[idx / 64] & (1u64 << (idx % 64)) != 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.bits = [0; WORDS];
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Highest CPU in the set
    #[must_use]
    pub fn max(&self) -> Option<CpuId> {
        self.iter().last()
    }

    /// CPUs in ascending order
    pub fn iter(&self) -> impl Iterator<Item = CpuId> + '_ {
        (0..MAX_CPUS)
            .filter(move |idx| self.bits[idx / 64] & (1u64 << (idx % 64)) != 0)
            .map(|idx| idx as CpuId)
    }

    /// Set from the low word of a `cpu_set_t` mask (CPUs 0..64)
    #[inline]
    #[must_use]
    pub const fn from_mask(mask: u64) -> Self {
        let mut bits = [0; WORDS];
        bits[0] = mask;
        Self { bits }
    }

    /// Low word of the mask; `None` if the set names a CPU past 63
    #[must_use]
    pub fn to_mask(&self) -> Option<u64> {
        self.bits[1..].iter().all(|w| *w == 0).then_some(self.bits[0])
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        for (word, theirs) in out.bits.iter_mut().zip(other.bits.iter()) {
            *word |= theirs;
        }
        out
    }
}

impl FromIterator<CpuId> for CpuSet {
    fn from_iter<I: IntoIterator<Item = CpuId>>(iter: I) -> Self {
        let mut set = Self::new();
        for cpu in iter {
            set.insert(cpu);
        }
        set
    }
}

/// Renders runs of two or more consecutive CPUs as `a-b`, others comma-separated
impl fmt::Display for CpuSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut cpus = self.iter().peekable();

        while let Some(start) = cpus.next() {
            let mut end = start;
            while cpus.peek() == Some(&(end + 1)) {
                end += 1;
                cpus.next();
            }

            if !first {
                f.write_str(",")?;
            }
            first = false;

            if end == start {
                write!(f, "{}", start)?;
            } else {
                write!(f, "{}-{}", start, end)?;
            }
        }
        Ok(())
    }
}

/// Error parsing a CPU list
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid CPU list '{0}'")]
pub struct ParseCpuSetError(pub String);

impl FromStr for CpuSet {
    type Err = ParseCpuSetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCpuSetError(s.to_string());
        let mut set = Self::new();

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (lo, hi) = match part.split_once('-') {
                Some((lo, hi)) => (lo, hi),
                None => (part, part),
            };
            let lo: CpuId = lo.trim().parse().map_err(|_| err())?;
            let hi: CpuId = hi.trim().parse().map_err(|_| err())?;
            if lo > hi || hi as usize >= MAX_CPUS {
                return Err(err());
            }
            for cpu in lo..=hi {
                set.insert(cpu);
            }
        }
        Ok(set)
    }
}

impl Serialize for CpuSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CpuSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
