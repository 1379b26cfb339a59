//! Named block references for the `eth_*` query methods.

use serde::{Deserialize, Serialize, Serializer};

/// A named block reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockTag {
    /// The genesis block.
    Earliest,
    /// The most recent proposed block.
    #[default]
    Latest,
    /// The most recent block considered safe from reorgs.
    Safe,
    /// The most recent finalized block.
    Finalized,
    /// The pending state.
    Pending,
}

impl std::fmt::Display for BlockTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Earliest => "earliest",
            Self::Latest => "latest",
            Self::Safe => "safe",
            Self::Finalized => "finalized",
            Self::Pending => "pending",
        };
        write!(f, "{s}")
    }
}

/// Either a concrete block number or a named tag, as accepted by the
/// by-number query methods. Numbers go on the wire as hex quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockNumberOrTag {
    Number(u64),
    Tag(BlockTag),
}

impl Default for BlockNumberOrTag {
    fn default() -> Self {
        Self::Tag(BlockTag::Latest)
    }
}

impl From<u64> for BlockNumberOrTag {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<BlockTag> for BlockNumberOrTag {
    fn from(tag: BlockTag) -> Self {
        Self::Tag(tag)
    }
}

impl Serialize for BlockNumberOrTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_str(&format!("0x{n:x}")),
            Self::Tag(tag) => tag.serialize(serializer),
        }
    }
}

impl std::fmt::Display for BlockNumberOrTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "0x{n:x}"),
            Self::Tag(tag) => write!(f, "{tag}"),
        }
    }
}

/// Parses the forms the query methods accept: a tag name, a `0x…` hex
/// quantity, or a decimal block number.
impl std::str::FromStr for BlockNumberOrTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earliest" => return Ok(BlockTag::Earliest.into()),
            "latest" => return Ok(BlockTag::Latest.into()),
            "safe" => return Ok(BlockTag::Safe.into()),
            "finalized" => return Ok(BlockTag::Finalized.into()),
            "pending" => return Ok(BlockTag::Pending.into()),
            _ => {}
        }
        let parsed = match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse(),
        };
        parsed
            .map(Self::Number)
            .map_err(|_| format!("invalid block number or tag: {s}"))
    }
}
