use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use crate::error::ParseError;

macro_rules! define_relations {
    ($($variant:ident => $text:literal,)*) => {
        /// Universal dependency relation, the part of a label before the
        /// first colon. Bases outside the inventory are kept verbatim.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum RelationBase {
            $($variant,)*
            Other(String),
        }

        impl RelationBase {
            pub fn as_str(&self) -> &str {
                match self {
                    $(RelationBase::$variant => $text,)*
                    RelationBase::Other(text) => text.as_str(),
                }
            }

            fn from_text(text: &str) -> Self {
                match text {
                    $($text => RelationBase::$variant,)*
                    other => RelationBase::Other(other.to_string()),
                }
            }
        }
    };
}

define_relations! {
    Acl => "acl",
    Advcl => "advcl",
    Advmod => "advmod",
    Amod => "amod",
    Appos => "appos",
    Aux => "aux",
    Case => "case",
    Cc => "cc",
    Ccomp => "ccomp",
    Clf => "clf",
    Compound => "compound",
    Conj => "conj",
    Cop => "cop",
    Csubj => "csubj",
    Dep => "dep",
    Det => "det",
    Discourse => "discourse",
    Dislocated => "dislocated",
    Expl => "expl",
    Fixed => "fixed",
    Flat => "flat",
    Goeswith => "goeswith",
    Iobj => "iobj",
    List => "list",
    Mark => "mark",
    Nmod => "nmod",
    Nsubj => "nsubj",
    Nummod => "nummod",
    Obj => "obj",
    Obl => "obl",
    Orphan => "orphan",
    Parataxis => "parataxis",
    Punct => "punct",
    Ref => "ref",
    Reparandum => "reparandum",
    Root => "root",
    Vocative => "vocative",
    Xcomp => "xcomp",
}

impl fmt::Display for RelationBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relation label such as `obl` or `obl:in`.
///
/// Everything after the first colon is the subtype, so `obl:arg:with`
/// has base `obl` and subtype `arg:with`. Labels order by their text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Deprel {
    base: RelationBase,
    subtype: Option<String>,
}

impl Deprel {
    pub fn new(base: RelationBase) -> Self {
        Self::assemble(base, None)
    }

    pub fn with_subtype(base: RelationBase, subtype: impl Into<String>) -> Self {
        Self::assemble(base, Some(subtype.into()))
    }

    /// Re-splits an `Other` base at its first colon and maps known names
    /// back to their variants, so equal text means equal labels.
    fn assemble(base: RelationBase, subtype: Option<String>) -> Self {
        let text = match base {
            RelationBase::Other(text) => text,
            base => return Self { base, subtype },
        };
        let (name, rest) = match text.split_once(':') {
            Some((name, rest)) => (name, Some(rest)),
            None => (text.as_str(), None),
        };
        let subtype = match (rest, subtype) {
            (Some(rest), Some(subtype)) => Some(format!("{}:{}", rest, subtype)),
            (Some(rest), None) => Some(rest.to_string()),
            (None, subtype) => subtype,
        };
        Self {
            base: RelationBase::from_text(name),
            subtype,
        }
    }

    pub fn base(&self) -> &RelationBase {
        &self.base
    }

    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    /// `obl` and `obl:in` share a base; `obl` and `nmod` do not.
    pub fn same_base(&self, other: &Deprel) -> bool {
        self.base == other.base
    }

    pub fn is_conj(&self) -> bool {
        self.base == RelationBase::Conj
    }

    pub fn is_ref(&self) -> bool {
        self.base == RelationBase::Ref
    }

    pub fn is_acl(&self) -> bool {
        self.base == RelationBase::Acl
    }

    pub fn is_xcomp(&self) -> bool {
        self.base == RelationBase::Xcomp
    }

    /// `nsubj` or `csubj`, any subtype.
    pub fn is_subject(&self) -> bool {
        matches!(self.base, RelationBase::Nsubj | RelationBase::Csubj)
    }

    fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        let subtype = self.subtype.as_deref().map(|s| s.as_bytes()).unwrap_or(&[]);
        let colon: &[u8] = if self.subtype.is_some() { b":" } else { b"" };
        self.base
            .as_str()
            .bytes()
            .chain(colon.iter().copied())
            .chain(subtype.iter().copied())
    }
}

impl Ord for Deprel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes().cmp(other.bytes())
    }
}

impl PartialOrd for Deprel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Deprel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let forbidden = |c: char| c.is_whitespace() || c == '|';
        if s.is_empty() || s == "_" || s.contains(forbidden) {
            return Err(ParseError::Label(s.to_string()));
        }

        match s.split_once(':') {
            None => Ok(Deprel::new(RelationBase::from_text(s))),
            Some((base, subtype)) if !base.is_empty() && !subtype.is_empty() => {
                Ok(Deprel::with_subtype(RelationBase::from_text(base), subtype))
            }
            Some(_) => Err(ParseError::Label(s.to_string())),
        }
    }
}

impl fmt::Display for Deprel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subtype {
            Some(subtype) => write!(f, "{}:{}", self.base, subtype),
            None => write!(f, "{}", self.base),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Deprel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Deprel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(s: &str) -> Deprel {
        s.parse().unwrap()
    }

    #[test]
    fn test_split_on_first_colon() {
        let label = rel("obl:arg:with");
        assert_eq!(label.base(), &RelationBase::Obl);
        assert_eq!(label.subtype(), Some("arg:with"));
        assert_eq!(label.to_string(), "obl:arg:with");

        let unknown = rel("foo:bar");
        assert_eq!(unknown.base(), &RelationBase::Other("foo".to_string()));
        assert_eq!(unknown.to_string(), "foo:bar");
    }

    #[test]
    fn test_named_predicates_ignore_subtype() {
        assert!(rel("conj").is_conj());
        assert!(rel("conj:and").is_conj());
        assert!(!rel("cc").is_conj());
        assert!(rel("acl:relcl").is_acl());
        assert!(rel("nsubj:pass").is_subject());
        assert!(rel("csubj").is_subject());
        assert!(!rel("obj").is_subject());
        assert!(rel("obl").same_base(&rel("obl:in")));
        assert!(!rel("obl").same_base(&rel("nmod")));
    }

    #[test]
    fn test_constructed_labels_match_parsed_ones() {
        let conj = Deprel::new(RelationBase::Other("conj".to_string()));
        assert_eq!(conj, rel("conj"));
        assert!(conj.is_conj());

        let cased = Deprel::new(RelationBase::Other("obl:in".to_string()));
        assert_eq!(cased, rel("obl:in"));
        assert_eq!(cased.subtype(), Some("in"));

        let nested = Deprel::with_subtype(RelationBase::Other("obl:arg".to_string()), "with");
        assert_eq!(nested, rel("obl:arg:with"));
        assert_eq!(nested.cmp(&rel("obl:arg:with")), Ordering::Equal);

        let unknown = Deprel::new(RelationBase::Other("foo".to_string()));
        assert_eq!(unknown, rel("foo"));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "_", ":in", "obl:", "a b", "a|b"] {
            assert!(bad.parse::<Deprel>().is_err(), "{:?} should not parse", bad);
        }
    }

    #[test]
    fn test_orders_by_text() {
        let mut labels = vec![rel("obl:in"), rel("nsubj"), rel("obl"), rel("a0"), rel("a:z")];
        labels.sort();
        let rendered: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
        assert_eq!(rendered, ["a0", "a:z", "nsubj", "obl", "obl:in"]);
    }
}
