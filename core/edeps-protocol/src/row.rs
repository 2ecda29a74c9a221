use std::fmt;

use crate::annotation::EMPTY_COLUMN;

/// One node line split into its ten columns, values kept as text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Row {
    pub id: String,
    pub form: String,
    pub lemma: String,
    pub upos: String,
    pub xpos: String,
    pub feats: String,
    pub head: String,
    pub deprel: String,
    pub deps: String,
    pub misc: String,
}

impl Row {
    pub const COLUMNS: usize = 10;

    /// Builds a row from exactly [`Row::COLUMNS`] values.
    pub fn from_columns<S: AsRef<str>>(columns: &[S]) -> Option<Self> {
        let [id, form, lemma, upos, xpos, feats, head, deprel, deps, misc] = columns else {
            return None;
        };
        let own = |s: &S| s.as_ref().to_string();
        Some(Row {
            id: own(id),
            form: own(form),
            lemma: own(lemma),
            upos: own(upos),
            xpos: own(xpos),
            feats: own(feats),
            head: own(head),
            deprel: own(deprel),
            deps: own(deps),
            misc: own(misc),
        })
    }

    pub fn columns(&self) -> [&str; Row::COLUMNS] {
        [
            self.id.as_str(),
            self.form.as_str(),
            self.lemma.as_str(),
            self.upos.as_str(),
            self.xpos.as_str(),
            self.feats.as_str(),
            self.head.as_str(),
            self.deprel.as_str(),
            self.deps.as_str(),
            self.misc.as_str(),
        ]
    }

    /// The DEPS column split into `parent:label` fragments.
    pub fn deps_fragments(&self) -> Vec<&str> {
        if self.deps == EMPTY_COLUMN {
            Vec::new()
        } else {
            self.deps.split('|').collect()
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.columns().join("\t"))
    }
}
