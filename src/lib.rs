//! A permissive COS-layer parser and document object model for PDF files.
//!
//! The design favors tolerance over speed: rather than trusting the cross-reference
//! table to find objects, the whole file is scanned for `N G obj ... endobj`
//! productions (§4.1), and the xref/trailer machinery is used only to resolve the
//! handful of structural questions a linear scan cannot answer on its own (which
//! trailer is authoritative, where object streams live).

mod byte_source;
pub mod config;
pub mod dictionary;
pub mod document;
mod driver;
pub mod error;
pub mod filters;
pub mod object;
mod object_stream;
pub mod parser;
pub mod pd;
pub mod scratch;
pub mod stream;
pub mod text_position;
mod writer;

pub use config::ParserConfig;
pub use dictionary::Dictionary;
pub use document::COSDocument;
pub use error::{Error, ParseError, Result};
pub use object::{Object, ObjectId, StringFormat};
pub use pd::PDDocument;
pub use scratch::{ScratchFile, ScratchSlice};
pub use stream::Stream;

/// Parse a complete PDF byte buffer into a `COSDocument` (§4.1).
pub fn parse(config: &ParserConfig, data: &[u8]) -> Result<COSDocument> {
    driver::parse(config, data)
}
