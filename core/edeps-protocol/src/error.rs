use thiserror::Error;

/// A column value that does not follow the record format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed identifier '{0}'")]
    Identifier(String),

    #[error("malformed relation label '{0}'")]
    Label(String),

    #[error("malformed edge '{0}', expected parent:label")]
    Edge(String),

    #[error("malformed feature '{0}'")]
    Feature(String),

    #[error("malformed misc column '{0}'")]
    Misc(String),

    #[error("malformed edge annotation '{0}'")]
    Annotation(String),
}
