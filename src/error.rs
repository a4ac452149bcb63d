use std::io;

use crate::object::ObjectId;

/// Errors raised while lexing or parsing the low-level COS grammar (§4.2 of the design).
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("header is missing, truncated, or carries an unparseable version")]
    CorruptHeader,

    #[error("expected keyword {expected:?}, found {actual:?}")]
    ExpectedKeyword { expected: &'static str, actual: String },

    #[error("stream keyword encountered without a preceding dictionary")]
    StreamNotPrecededByDict,

    #[error("startxref did not resolve to a usable xref location")]
    InvalidXref,

    #[error("indirect object is missing a terminating endobj")]
    ExpectedEndobj,

    #[error("%%EOF marker was expected but not found")]
    ExpectedEof,

    #[error("reference to object ({0}, {1}) could not be parsed as a direct object")]
    MalformedObject(u32, u16),
}

/// Top-level error type for every fallible operation in this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("operation attempted on a closed document")]
    DocumentClosed,

    #[error("object ({0}, {1}) is not present in the document's indirect-object pool")]
    MissingObject(u32, u16),

    #[error("reference cycle detected while resolving object ({0}, {1})")]
    ReferenceCycle(u32, u16),

    #[error("value is not a {0}")]
    TypeMismatch(&'static str),

    #[error("dictionary has no entry named /{0}")]
    MissingKey(String),

    #[error("filter {0:?} is recognized but not implemented")]
    UnsupportedFilter(String),

    #[error("operation requires a decrypted document")]
    EncryptionRequired,

    #[error("stream payload is invalid: {0}")]
    InvalidStream(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn missing_object(id: ObjectId) -> Self {
        Error::MissingObject(id.0, id.1)
    }

    pub fn reference_cycle(id: ObjectId) -> Self {
        Error::ReferenceCycle(id.0, id.1)
    }
}
