use nom::{
    bytes::complete::take_till,
    character::complete::char,
    combinator::all_consuming,
    multi::separated_list1,
    IResult,
};

use edeps_protocol::Row;

use crate::error::ReadError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Ends the current sentence.
    Blank,
    /// `# ...` metadata, kept verbatim without the line break.
    Comment(String),
    Node(Row),
}

fn column(input: &str) -> IResult<&str, &str> {
    take_till(|c| c == '\t')(input)
}

fn columns(input: &str) -> IResult<&str, Vec<&str>> {
    all_consuming(separated_list1(char('\t'), column))(input)
}

/// Classifies one line; `number` is 1-based and only used in errors.
pub fn parse_line(number: usize, text: &str) -> Result<Line, ReadError> {
    let text = text.trim_end_matches(['\n', '\r']);

    if text.trim().is_empty() {
        return Ok(Line::Blank);
    }
    if text.starts_with('#') {
        return Ok(Line::Comment(text.to_string()));
    }

    // `column` accepts the empty string, so the split itself cannot fail.
    let fields = match columns(text) {
        Ok((_, fields)) => fields,
        Err(_) => vec![text],
    };

    if fields.len() != Row::COLUMNS {
        return Err(ReadError::ColumnCount {
            line: number,
            expected: Row::COLUMNS,
            found: fields.len(),
        });
    }
    if let Some(column) = fields.iter().position(|f| f.is_empty()) {
        return Err(ReadError::EmptyColumn {
            line: number,
            column: column + 1,
        });
    }

    Row::from_columns(fields.as_slice())
        .map(Line::Node)
        .ok_or(ReadError::ColumnCount {
            line: number,
            expected: Row::COLUMNS,
            found: fields.len(),
        })
}
