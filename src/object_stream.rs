//! Object-stream dereferencing (§4.4, PDF 1.5+).
//!
//! Runs once, after the main linear scan, over every pool entry whose stream
//! dictionary carries `/Type /ObjStm`. Each contained object is parsed out of
//! the already-decompressed payload and installed into the pool at generation
//! 0 — first definition wins, matching the rest of the parser's duplicate-id
//! tolerance.

use log::warn;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::config::ParserConfig;
use crate::document::COSDocument;
use crate::object::{Object, ObjectId};
use crate::parser::{direct_object, ParserInput};

/// Parse a whitespace-separated, optionally-signed integer starting at the
/// front of `bytes`, returning its value and how many bytes it consumed
/// (including leading whitespace).
fn read_int_token(bytes: &[u8]) -> Option<(i64, usize)> {
    let mut i = 0;
    while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
        i += 1;
    }
    let start = i;
    if bytes.get(i).is_some_and(|&b| b == b'+' || b == b'-') {
        i += 1;
    }
    let digits_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    let text = std::str::from_utf8(&bytes[start..i]).ok()?;
    text.parse::<i64>().ok().map(|value| (value, i))
}

fn decode_stream_objects(document: &COSDocument, container_id: ObjectId) -> crate::error::Result<Vec<(ObjectId, Object)>> {
    let object = document.get_object(container_id)?;
    let stream = object.as_stream()?;
    let bytes = stream.decoded_bytes(document.scratch())?;

    let count = stream.dict.get(b"N").and_then(Object::as_i64)? as usize;
    let first = stream.dict.get(b"First").and_then(Object::as_i64)? as usize;

    let mut cursor = 0usize;
    let mut pairs = Vec::with_capacity(count);
    for _ in 0..count {
        let Some((num, consumed)) = read_int_token(&bytes[cursor..]) else {
            warn!("object stream {:?} header truncated, stopping early", container_id);
            break;
        };
        cursor += consumed;
        let Some((offset, consumed)) = read_int_token(&bytes[cursor..]) else {
            warn!("object stream {:?} header truncated, stopping early", container_id);
            break;
        };
        cursor += consumed;
        pairs.push((num as u32, offset as usize));
    }

    let mut out = Vec::with_capacity(pairs.len());
    for (num, relative_offset) in pairs {
        let start = first + relative_offset;
        if start > bytes.len() {
            warn!("object {num} in stream {:?} has an out-of-range offset", container_id);
            continue;
        }
        let span = ParserInput::new_extra(&bytes[start..], "object stream member");
        match direct_object(span) {
            Ok((_, value)) => out.push(((num, 0), value)),
            Err(_) => warn!("object {num} in stream {:?} failed to parse, skipping", container_id),
        }
    }
    Ok(out)
}

/// Dereference every `ObjStm` currently in the pool and install the objects it
/// carries. Called by the driver only for non-encrypted documents (§4.4).
pub fn dereference_all(document: &mut COSDocument, config: &ParserConfig) -> crate::error::Result<()> {
    let container_ids: Vec<ObjectId> = document
        .objects()
        .filter_map(|(id, object)| match object {
            Object::Stream(stream) if stream.dict.has_type(b"ObjStm") => Some(*id),
            _ => None,
        })
        .collect();

    if container_ids.is_empty() {
        return Ok(());
    }

    let document_ref: &COSDocument = document;
    let results: Vec<crate::error::Result<Vec<(ObjectId, Object)>>> = {
        #[cfg(feature = "rayon")]
        {
            if config.parallel_object_streams {
                container_ids
                    .par_iter()
                    .map(|id| decode_stream_objects(document_ref, *id))
                    .collect()
            } else {
                container_ids.iter().map(|id| decode_stream_objects(document_ref, *id)).collect()
            }
        }
        #[cfg(not(feature = "rayon"))]
        {
            let _ = &config.parallel_object_streams;
            container_ids.iter().map(|id| decode_stream_objects(document_ref, *id)).collect()
        }
    };

    for result in results {
        match result {
            Ok(members) => {
                for (id, value) in members {
                    document.set_object_if_absent(id, value)?;
                }
            }
            Err(err) => warn!("failed to dereference an object stream: {err}"),
        }
    }
    Ok(())
}
