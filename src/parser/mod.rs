//! COS lexer/parser (§4.2).
//!
//! Direct-object grammar (§4.2.6, §4.2.1) is expressed with `nom` combinators
//! over a `nom_locate` span, using `ParserInput::new_extra` to carry a
//! `&'static str` "extra" naming which production is running, for error
//! messages. The surrounding structural productions (indirect objects,
//! xref section headers, trailer, stream payloads) carry side effects (scratch
//! writes, length resolution against the object pool) that don't fit a pure
//! combinator; those are driven imperatively from `driver.rs` using the
//! primitives this module exports.

mod lexer;

pub use lexer::{direct_object, header_version, is_whitespace, skip_whitespace_and_comments, ParserInput};
