//! Edge Partitioning
//!
//! Every edge lives in exactly one of 37 partitions, selected by the first
//! character of its source vertex's name:
//! - `a`..`z` (26 letter partitions)
//! - `0`..`9` (10 digit partitions)
//! - a catch-all partition for every other leading character
//!
//! The mapping is a pure function of the name. It is the sharding contract
//! shared by every connection and every fan-out worker touching the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of edge partitions in the physical layout
pub const PARTITION_COUNT: usize = 37;

/// Table name prefix for edge partitions
pub const EDGE_TABLE_PREFIX: &str = "edges_";

/// Partition suffixes, addressed by `PartitionId::index()`
const SUFFIXES: [&str; PARTITION_COUNT] = [
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r",
    "s", "t", "u", "v", "w", "x", "y", "z", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
    "other",
];

/// Identifier of one edge partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PartitionId(u8);

impl PartitionId {
    /// The dedicated partition for names that start with neither a letter nor a digit
    pub const OTHER: PartitionId = PartitionId(36);

    /// Look up a partition by its position in the layout
    pub fn from_index(index: usize) -> Option<Self> {
        (index < PARTITION_COUNT).then_some(Self(index as u8))
    }

    /// Look up a partition by suffix (`"a"`, `"9"`, `"other"`)
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        SUFFIXES
            .iter()
            .position(|s| *s == suffix)
            .map(|i| Self(i as u8))
    }

    /// Partition for an already case-folded leading character, if it has one
    fn for_char(c: char) -> Option<Self> {
        match c {
            'a'..='z' => Some(Self(c as u8 - b'a')),
            '0'..='9' => Some(Self(26 + (c as u8 - b'0'))),
            _ => None,
        }
    }

    /// All partitions, in layout order
    pub fn all() -> impl Iterator<Item = PartitionId> + Clone {
        (0..PARTITION_COUNT as u8).map(PartitionId)
    }

    /// Position of this partition in the layout (0..37)
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Suffix used in the table name
    pub fn suffix(self) -> &'static str {
        SUFFIXES[self.index()]
    }

    /// The single character this partition is keyed by, if any
    pub fn key_char(self) -> Option<char> {
        let suffix = self.suffix();
        let mut chars = suffix.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }

    /// Name of the SQLite table holding this partition's edges
    pub fn table_name(self) -> String {
        format!("{}{}", EDGE_TABLE_PREFIX, self.suffix())
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl From<PartitionId> for String {
    fn from(id: PartitionId) -> Self {
        id.suffix().to_string()
    }
}

impl TryFrom<String> for PartitionId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_suffix(&value).ok_or_else(|| format!("unknown partition '{}'", value))
    }
}

/// Where names that start with neither a letter nor a digit are stored.
///
/// Older stores folded them into `z` or `0`; new stores use the dedicated
/// `other` partition. A store must always be opened with the policy it was
/// built with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatchAll {
    /// Dedicated `other` partition (default)
    #[default]
    Dedicated,
    /// Fold into the `z` partition
    Z,
    /// Fold into the `0` partition
    Zero,
}

impl CatchAll {
    /// The partition this policy sends unkeyed names to
    pub fn partition(self) -> PartitionId {
        match self {
            Self::Dedicated => PartitionId::OTHER,
            Self::Z => PartitionId(25),
            Self::Zero => PartitionId(26),
        }
    }
}

impl fmt::Display for CatchAll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dedicated => write!(f, "dedicated"),
            Self::Z => write!(f, "z"),
            Self::Zero => write!(f, "zero"),
        }
    }
}

impl FromStr for CatchAll {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dedicated" | "other" => Ok(Self::Dedicated),
            "z" => Ok(Self::Z),
            "zero" | "0" => Ok(Self::Zero),
            _ => Err(format!(
                "Unknown catch-all policy: '{}'. Valid values: dedicated, z, zero",
                s
            )),
        }
    }
}

/// The name → partition mapping for one store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionScheme {
    pub catch_all: CatchAll,
}

impl PartitionScheme {
    pub fn new(catch_all: CatchAll) -> Self {
        Self { catch_all }
    }

    /// Partition holding the edges whose source has this name.
    ///
    /// The first character is case-folded; it selects a letter or digit
    /// partition only when it folds to exactly one ASCII letter or digit.
    pub fn partition_for(&self, name: &str) -> PartitionId {
        let Some(first) = name.chars().next() else {
            return self.catch_all.partition();
        };

        let mut folded = first.to_lowercase();
        match (folded.next(), folded.next()) {
            (Some(c), None) => PartitionId::for_char(c).unwrap_or(self.catch_all.partition()),
            _ => self.catch_all.partition(),
        }
    }

    /// Partition that receives unkeyed names under this scheme
    pub fn catch_all_partition(&self) -> PartitionId {
        self.catch_all.partition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let all: Vec<PartitionId> = PartitionId::all().collect();
        assert_eq!(all.len(), PARTITION_COUNT);
        assert_eq!(all[0].suffix(), "a");
        assert_eq!(all[25].suffix(), "z");
        assert_eq!(all[26].suffix(), "0");
        assert_eq!(all[35].suffix(), "9");
        assert_eq!(all[36], PartitionId::OTHER);
        assert_eq!(PartitionId::OTHER.table_name(), "edges_other");

        for (i, id) in all.iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(PartitionId::from_index(i), Some(*id));
            assert_eq!(PartitionId::from_suffix(id.suffix()), Some(*id));
        }
        assert_eq!(PartitionId::from_index(PARTITION_COUNT), None);
    }

    #[test]
    fn test_partition_for_letters_and_digits() {
        let scheme = PartitionScheme::default();
        assert_eq!(scheme.partition_for("Apple").suffix(), "a");
        assert_eq!(scheme.partition_for("apple"), scheme.partition_for("Apple"));
        assert_eq!(scheme.partition_for("9mm_Parabellum").suffix(), "9");
        assert_eq!(scheme.partition_for("Zebra").suffix(), "z");
        assert_eq!(scheme.partition_for("0day").key_char(), Some('0'));
    }

    #[test]
    fn test_partition_for_catch_all() {
        let scheme = PartitionScheme::default();
        for name in ["(Album)", "#tag", "\u{c9}cole", "", " leading space", "_x"] {
            assert_eq!(scheme.partition_for(name), PartitionId::OTHER, "{name:?}");
        }

        let legacy_z = PartitionScheme::new(CatchAll::Z);
        assert_eq!(legacy_z.partition_for("(Album)").suffix(), "z");

        let legacy_zero = PartitionScheme::new(CatchAll::Zero);
        assert_eq!(legacy_zero.partition_for("(Album)").suffix(), "0");
        assert_eq!(legacy_zero.partition_for("Art").suffix(), "a");
    }

    #[test]
    fn test_partition_for_is_stable() {
        let scheme = PartitionScheme::default();
        let first: Vec<PartitionId> = ["Art", "#x", "42"]
            .iter()
            .map(|n| scheme.partition_for(n))
            .collect();
        for _ in 0..10 {
            let again: Vec<PartitionId> = ["Art", "#x", "42"]
                .iter()
                .map(|n| scheme.partition_for(n))
                .collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_catch_all_parsing() {
        assert_eq!("dedicated".parse::<CatchAll>().unwrap(), CatchAll::Dedicated);
        assert_eq!("Z".parse::<CatchAll>().unwrap(), CatchAll::Z);
        assert_eq!("0".parse::<CatchAll>().unwrap(), CatchAll::Zero);
        assert!("q".parse::<CatchAll>().is_err());
        assert_eq!(CatchAll::Zero.to_string(), "zero");
    }

    #[test]
    fn test_partition_id_serde() {
        let json = serde_json::to_string(&PartitionId::from_suffix("q").unwrap()).unwrap();
        assert_eq!(json, "\"q\"");
        let back: PartitionId = serde_json::from_str("\"other\"").unwrap();
        assert_eq!(back, PartitionId::OTHER);
        assert!(serde_json::from_str::<PartitionId>("\"??\"").is_err());
    }
}
