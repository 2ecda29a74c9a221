use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::category::EdgeCategory;
use crate::deprel::Deprel;
use crate::error::ParseError;
use crate::ids::NodeId;

/// Placeholder for an empty column.
pub const EMPTY_COLUMN: &str = "_";

/// MISC key under which edge classifications are stored.
pub const EDEP_KEY: &str = "Edep";

/// Morphological features (`Case=Nom|Number=Sing`).
///
/// Names and values compare case-sensitively; the rendered column lists
/// names case-insensitively sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Features {
    entries: BTreeMap<String, String>,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(name.into(), value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Pairs in rendering order.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort_by(|a, b| {
            a.0.to_lowercase()
                .cmp(&b.0.to_lowercase())
                .then_with(|| a.0.cmp(b.0))
        });
        pairs
    }
}

impl FromStr for Features {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut features = Features::new();
        if s == EMPTY_COLUMN {
            return Ok(features);
        }

        for item in s.split('|') {
            match item.split_once('=') {
                Some((name, value)) if !name.is_empty() && !value.is_empty() => {
                    if features.insert(name, value).is_some() {
                        return Err(ParseError::Feature(item.to_string()));
                    }
                }
                _ => return Err(ParseError::Feature(item.to_string())),
            }
        }
        Ok(features)
    }
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str(EMPTY_COLUMN);
        }
        for (i, (name, value)) in self.sorted().into_iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// One MISC item: `SpaceAfter=No` or a bare token.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MiscItem {
    Pair(String, String),
    Bare(String),
}

impl fmt::Display for MiscItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiscItem::Pair(key, value) => write!(f, "{}={}", key, value),
            MiscItem::Bare(token) => f.write_str(token),
        }
    }
}

/// An enhanced edge as seen from its child: parent and label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    pub parent: NodeId,
    pub label: Deprel,
}

impl EdgeKey {
    pub fn new(parent: NodeId, label: Deprel) -> Self {
        Self { parent, label }
    }
}

impl FromStr for EdgeKey {
    type Err = ParseError;

    /// Parses `parentId:label`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (parent, label) = s
            .split_once(':')
            .ok_or_else(|| ParseError::Edge(s.to_string()))?;
        Ok(EdgeKey::new(parent.parse()?, label.parse()?))
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.parent, self.label)
    }
}

// Rendered as `parent:label` so maps keyed by edge stay string-keyed.
#[cfg(feature = "serde")]
impl serde::Serialize for EdgeKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EdgeKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// The MISC column.
///
/// `Edep=` entries are kept apart from the other items, keyed by edge,
/// and always rendered after them in edge order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Misc {
    items: Vec<MiscItem>,
    edeps: BTreeMap<EdgeKey, EdgeCategory>,
}

impl Misc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[MiscItem] {
        &self.items
    }

    pub fn push(&mut self, item: MiscItem) {
        self.items.push(item);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            MiscItem::Pair(k, v) if k == key => Some(v.as_str()),
            _ => None,
        })
    }

    pub fn edeps(&self) -> &BTreeMap<EdgeKey, EdgeCategory> {
        &self.edeps
    }

    /// Adds `categories` to the entry for `key`, creating it if needed.
    pub fn annotate(&mut self, key: EdgeKey, categories: EdgeCategory) {
        *self.edeps.entry(key).or_insert_with(EdgeCategory::empty) |= categories;
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.edeps.is_empty()
    }
}

fn parse_edep(value: &str) -> Result<(EdgeKey, EdgeCategory), ParseError> {
    let malformed = || ParseError::Annotation(value.to_string());
    let (letters, edge) = value.split_once(':').ok_or_else(malformed)?;
    let categories = letters.parse::<EdgeCategory>()?;
    let key = edge.parse::<EdgeKey>().map_err(|_| malformed())?;
    Ok((key, categories))
}

impl FromStr for Misc {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut misc = Misc::new();
        if s == EMPTY_COLUMN {
            return Ok(misc);
        }

        for item in s.split('|') {
            if item.is_empty() {
                return Err(ParseError::Misc(s.to_string()));
            }
            match item.split_once('=') {
                Some((EDEP_KEY, value)) => {
                    let (key, categories) = parse_edep(value)?;
                    misc.annotate(key, categories);
                }
                Some((key, value)) => misc.push(MiscItem::Pair(key.to_string(), value.to_string())),
                None => misc.push(MiscItem::Bare(item.to_string())),
            }
        }
        Ok(misc)
    }
}

impl fmt::Display for Misc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str(EMPTY_COLUMN);
        }

        let mut first = true;
        let mut sep = |f: &mut fmt::Formatter<'_>| {
            if first {
                first = false;
                Ok(())
            } else {
                f.write_str("|")
            }
        };

        for item in &self.items {
            sep(f)?;
            write!(f, "{}", item)?;
        }
        for (key, categories) in &self.edeps {
            sep(f)?;
            write!(f, "{}={}:{}", EDEP_KEY, categories, key)?;
        }
        Ok(())
    }
}
