use std::io::{self, BufRead};

use crate::error::ReadError;
use crate::line::{parse_line, Line};
use crate::sentence::Sentence;

/// Groups lines into sentences, one blank-line-terminated block at a time.
///
/// A malformed line spoils only its own block: the rest of the block is
/// consumed and the error is yielded in its place, so callers may go on
/// with the next sentence.
pub struct SentenceReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
    done: bool,
}

impl<R: BufRead> SentenceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for SentenceReader<R> {
    type Item = Result<Sentence, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut sentence = Sentence::default();
        let mut failure = None;
        let mut started = false;

        loop {
            let text = match self.lines.next() {
                Some(Ok(text)) => {
                    self.line_no += 1;
                    text
                }
                // The bad line is consumed, so reading can resume after it.
                Some(Err(err)) if err.kind() == io::ErrorKind::InvalidData => {
                    self.line_no += 1;
                    failure.get_or_insert(ReadError::Encoding { line: self.line_no });
                    started = true;
                    continue;
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err.into()));
                }
                None => {
                    self.done = true;
                    break;
                }
            };

            let line = match parse_line(self.line_no, &text) {
                Ok(line) => line,
                Err(err) => {
                    failure.get_or_insert(err);
                    started = true;
                    continue;
                }
            };

            match line {
                Line::Blank if started => break,
                Line::Blank => continue,
                _ if !started => {
                    started = true;
                    sentence.first_line = self.line_no;
                }
                _ => {}
            }
            match line {
                Line::Comment(comment) => sentence.comments.push(comment),
                Line::Node(row) => sentence.rows.push(row),
                Line::Blank => {}
            }
        }

        match failure {
            Some(err) => Some(Err(err)),
            None if started => Some(Ok(sentence)),
            None => None,
        }
    }
}

/// Reads every sentence of an in-memory document.
pub fn read_sentences(text: &str) -> Result<Vec<Sentence>, ReadError> {
    SentenceReader::new(text.as_bytes()).collect()
}
