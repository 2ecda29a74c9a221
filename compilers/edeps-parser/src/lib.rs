//! Line-level reading and writing of ten-column dependency records.
//!
//! The reader only splits lines into columns and sentences; turning the
//! column values into a graph is left to `edeps-graph`.

pub mod error;
pub mod line;
pub mod reader;
pub mod sentence;

pub use error::ReadError;
pub use line::{parse_line, Line};
pub use reader::{read_sentences, SentenceReader};
pub use sentence::{write_sentence, Sentence};
