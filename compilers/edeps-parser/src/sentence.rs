use std::io::{self, Write};

use edeps_protocol::Row;

/// One blank-line-terminated block: its comment lines and node rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sentence {
    pub comments: Vec<String>,
    pub rows: Vec<Row>,
    /// 1-based line number where the block starts.
    pub first_line: usize,
}

impl Sentence {
    /// Value of the `# sent_id = ...` comment, if present.
    pub fn sent_id(&self) -> Option<&str> {
        self.comments.iter().find_map(|c| {
            let (key, value) = c.trim_start_matches('#').split_once('=')?;
            (key.trim() == "sent_id").then(|| value.trim())
        })
    }

    /// Writes comments, rows and the terminating blank line.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write_sentence(out, self)
    }
}

pub fn write_sentence<W: Write>(out: &mut W, sentence: &Sentence) -> io::Result<()> {
    for comment in &sentence.comments {
        writeln!(out, "{}", comment)?;
    }
    for row in &sentence.rows {
        writeln!(out, "{}", row)?;
    }
    writeln!(out)
}
