use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use nom::{
    character::complete::{char, digit1},
    combinator::{all_consuming, map_res, opt},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::ParseError;

/// Identifier of one line of a sentence.
///
/// Ordering is not the derived one: an empty node `n.k` sorts after the
/// word `n` and before `n+1`, and a span `a-b` sorts right before the word
/// `a` it starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// A surface word (`7`). `Word(0)` is the virtual root.
    Word(u32),
    /// An empty node (`7.1`) hosting an elided element.
    Empty(u32, u32),
    /// A multiword token range (`7-8`).
    Span(u32, u32),
}

impl NodeId {
    pub const ROOT: NodeId = NodeId::Word(0);

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }

    pub fn is_empty_node(&self) -> bool {
        matches!(self, NodeId::Empty(..))
    }

    pub fn is_span(&self) -> bool {
        matches!(self, NodeId::Span(..))
    }

    /// `(major, minor, span_end)` with absent parts as zero.
    pub fn sort_key(&self) -> (u32, u32, u32) {
        match *self {
            NodeId::Word(n) => (n, 0, 0),
            NodeId::Empty(n, k) => (n, k, 0),
            NodeId::Span(from, to) => (from, 0, to),
        }
    }

    /// Inclusive word range covered by a span.
    pub fn span_range(&self) -> Option<(u32, u32)> {
        match *self {
            NodeId::Span(from, to) => Some((from, to)),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            NodeId::Span(..) => 0,
            NodeId::Word(_) => 1,
            NodeId::Empty(..) => 2,
        }
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        let (major, minor, end) = self.sort_key();
        let (other_major, other_minor, other_end) = other.sort_key();

        major
            .cmp(&other_major)
            .then(minor.cmp(&other_minor))
            .then(match (end, other_end) {
                (0, 0) => Ordering::Equal,
                // A span line precedes the first word it covers.
                (_, 0) => Ordering::Less,
                (0, _) => Ordering::Greater,
                (a, b) => a.cmp(&b),
            })
            .then_with(|| self.rank().cmp(&other.rank()))
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares two identifiers given in their textual form.
pub fn compare(a: &str, b: &str) -> Result<Ordering, ParseError> {
    Ok(a.parse::<NodeId>()?.cmp(&b.parse::<NodeId>()?))
}

fn number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, u32::from_str)(input)
}

fn raw_id(input: &str) -> IResult<&str, (u32, Option<u32>, Option<u32>)> {
    all_consuming(tuple((
        number,
        opt(preceded(char('.'), number)),
        opt(preceded(char('-'), number)),
    )))(input)
}

impl FromStr for NodeId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseError::Identifier(s.to_string());
        let (_, parts) = raw_id(s).map_err(|_| malformed())?;

        match parts {
            (n, None, None) => Ok(NodeId::Word(n)),
            (n, Some(k), None) if k > 0 => Ok(NodeId::Empty(n, k)),
            (from, None, Some(to)) if from > 0 && to > from => Ok(NodeId::Span(from, to)),
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Word(n) => write!(f, "{}", n),
            NodeId::Empty(n, k) => write!(f, "{}.{}", n, k),
            NodeId::Span(from, to) => write!(f, "{}-{}", from, to),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for NodeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
