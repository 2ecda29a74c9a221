use core::fmt;
use core::str::FromStr;

use bitflags::bitflags;

use crate::error::ParseError;

bitflags! {
    /// Why an enhanced edge differs from the basic tree.
    ///
    /// One edge may carry several categories; repeated classification
    /// unions into the existing set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EdgeCategory: u16 {
        const BASIC = 1;
        const CASED = 1 << 1;
        const RELABELED = 1 << 2;
        const GAPPING = 1 << 3;
        const ORPHAN = 1 << 4;
        const COPARENT = 1 << 5;
        const CODEPEND = 1 << 6;
        const XSUBJ = 1 << 7;
        const RELCL = 1 << 8;
        const RELPRON = 1 << 9;
        const MISSING = 1 << 10;
        const ENHANCED = 1 << 11;
    }
}

const LETTERS: [(EdgeCategory, char); 12] = [
    (EdgeCategory::BASIC, 'B'),
    (EdgeCategory::CASED, 'C'),
    (EdgeCategory::RELABELED, 'L'),
    (EdgeCategory::GAPPING, 'G'),
    (EdgeCategory::ORPHAN, 'O'),
    (EdgeCategory::COPARENT, 'P'),
    (EdgeCategory::CODEPEND, 'S'),
    (EdgeCategory::XSUBJ, 'X'),
    (EdgeCategory::RELCL, 'R'),
    (EdgeCategory::RELPRON, 'W'),
    (EdgeCategory::MISSING, 'M'),
    (EdgeCategory::ENHANCED, 'E'),
];

impl EdgeCategory {
    pub fn letter(self) -> Option<char> {
        LETTERS.iter().find(|(flag, _)| *flag == self).map(|(_, c)| *c)
    }

    pub fn from_letter(c: char) -> Option<Self> {
        LETTERS.iter().find(|(_, letter)| *letter == c).map(|(flag, _)| *flag)
    }

    /// Letter codes in canonical order, e.g. `"GP"`.
    pub fn letters(self) -> String {
        LETTERS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, c)| *c)
            .collect()
    }
}

impl fmt::Display for EdgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters())
    }
}

impl FromStr for EdgeCategory {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Annotation(s.to_string()));
        }
        s.chars().try_fold(EdgeCategory::empty(), |acc, c| {
            EdgeCategory::from_letter(c)
                .map(|flag| acc | flag)
                .ok_or_else(|| ParseError::Annotation(s.to_string()))
        })
    }
}
