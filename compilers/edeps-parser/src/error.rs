use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("line {line}: expected {expected} tab-separated columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: column {column} is empty")]
    EmptyColumn { line: usize, column: usize },

    #[error("line {line}: not valid UTF-8")]
    Encoding { line: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadError {
    /// Line number the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ReadError::ColumnCount { line, .. }
            | ReadError::EmptyColumn { line, .. }
            | ReadError::Encoding { line } => Some(*line),
            ReadError::Io(_) => None,
        }
    }
}
