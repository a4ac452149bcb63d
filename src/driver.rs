//! The top-level parse driver (§4.1): a linear scan over the whole byte
//! source rather than an xref-offset-driven random-access reader. Tolerance
//! over efficiency — every object is parsed by walking the file, and the
//! cross-reference table is consulted only for its section headers, never its
//! entries (§4.2.3, §9).

use log::warn;

use crate::byte_source::ByteSource;
use crate::config::ParserConfig;
use crate::dictionary::Dictionary;
use crate::document::COSDocument;
use crate::error::{Error, ParseError, Result};
use crate::object::{Object, ObjectId};
use crate::object_stream;
use crate::parser::{direct_object, header_version, is_whitespace, ParserInput};
use crate::stream::Stream;

/// Parse `data` into a fully materialized `COSDocument` (§4.1).
pub fn parse(config: &ParserConfig, data: &[u8]) -> Result<COSDocument> {
    let header_offset = find(data, b"%PDF-").ok_or(ParseError::CorruptHeader)?;
    let buffer = &data[header_offset..];
    if buffer.len() < 8 {
        return Err(ParseError::CorruptHeader.into());
    }
    let version = header_version(&buffer[5..8]).ok_or(ParseError::CorruptHeader)?;

    let header_line_end = buffer
        .iter()
        .position(|&b| b == b'\n' || b == b'\r')
        .unwrap_or(buffer.len());
    let header_string = String::from_utf8_lossy(&buffer[..header_line_end]).into_owned();

    let mut document = COSDocument::new(config, version, header_string)?;
    let result = run(&mut document, buffer, header_line_end);
    match result {
        Ok(()) => {
            if document.trailer().is_empty() {
                synthesize_trailer_from_xref_streams(&mut document);
            }
            if !document.is_encrypted() {
                object_stream::dereference_all(&mut document, config)?;
            }
            Ok(document)
        }
        Err(err) => {
            document.close();
            Err(err)
        }
    }
}

fn run(document: &mut COSDocument, buffer: &[u8], header_line_end: usize) -> Result<()> {
    let mut src = ByteSource::new(buffer);
    src.seek(header_line_end);

    // Step 4: skip header fill bytes (PDF §3.4.1 binary marker comment line).
    skip_ws(&mut src);
    if !matches!(src.peek(), Some(b) if b.is_ascii_digit()) {
        src.read_line();
    }

    let mut saw_eof = false;
    loop {
        skip_ws(&mut src);
        if src.is_eof() {
            break;
        }

        let is_startxref = peek_keyword(&src, b"startxref");
        let outcome = if peek_keyword(&src, b"xref") {
            parse_xref(&mut src, document)
        } else if peek_keyword(&src, b"trailer") {
            parse_trailer(&mut src, document)
        } else if is_startxref {
            parse_startxref(&mut src)
        } else {
            parse_indirect_object(&mut src, document)
        };

        match outcome {
            Ok(()) => saw_eof = is_startxref,
            Err(err) => {
                if saw_eof {
                    // Trailing junk after a completed %%EOF section is tolerated.
                    break;
                }
                return Err(err);
            }
        }
        skip_ws(&mut src);
    }
    Ok(())
}

fn synthesize_trailer_from_xref_streams(document: &mut COSDocument) {
    let xref_dicts: Vec<Dictionary> = document
        .objects()
        .filter_map(|(_, object)| object.as_dict().ok().filter(|d| d.has_type(b"XRef")).cloned())
        .collect();
    for dict in xref_dicts {
        warn!("trailer absent, synthesizing from an XRef-stream dictionary");
        document.merge_trailer(dict);
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn skip_ws(src: &mut ByteSource) {
    loop {
        match src.peek() {
            Some(b) if is_whitespace(b) => {
                src.read();
            }
            Some(b'%') => {
                while let Some(b) = src.peek() {
                    if b == b'\n' || b == b'\r' {
                        break;
                    }
                    src.read();
                }
            }
            _ => break,
        }
    }
}

fn peek_keyword(src: &ByteSource, keyword: &[u8]) -> bool {
    src.remaining().starts_with(keyword)
}

fn read_keyword(src: &mut ByteSource, keyword: &[u8]) -> bool {
    if peek_keyword(src, keyword) {
        src.seek(src.position() + keyword.len());
        true
    } else {
        false
    }
}

fn skip_token(src: &mut ByteSource) {
    while let Some(b) = src.peek() {
        if is_whitespace(b) {
            break;
        }
        src.read();
    }
}

/// `readInt` (§4.2.1): optional sign, one or more digits.
fn try_read_int(src: &mut ByteSource) -> Option<i64> {
    let start = src.position();
    let bytes = src.remaining();
    let mut i = 0;
    if bytes.first().is_some_and(|&b| b == b'+' || b == b'-') {
        i += 1;
    }
    let digits_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    let text = std::str::from_utf8(&bytes[..i]).ok()?;
    let value = text.parse::<i64>().ok()?;
    src.seek(start + i);
    Some(value)
}

/// Tolerant integer read: if the first attempt fails (e.g. landing on a stray
/// keyword), skip one token and retry once (§4.2.1).
fn try_read_int_tolerant(src: &mut ByteSource) -> Option<i64> {
    if let Some(value) = try_read_int(src) {
        return Some(value);
    }
    skip_token(src);
    skip_ws(src);
    try_read_int(src)
}

/// Parse one direct object from the current position, advancing `src` past it.
fn parse_value(src: &mut ByteSource, label: &'static str) -> Result<Object> {
    let span = ParserInput::new_extra(src.remaining(), label);
    match direct_object(span) {
        Ok((rest, value)) => {
            src.seek(src.position() + rest.location_offset());
            Ok(value)
        }
        Err(_) => Err(ParseError::MalformedObject(0, 0).into()),
    }
}

fn consume_eol(src: &mut ByteSource) {
    match src.peek() {
        Some(b'\r') => {
            src.read();
            if src.peek() == Some(b'\n') {
                src.read();
            }
        }
        Some(b'\n') => {
            src.read();
        }
        _ => {}
    }
}

/// §4.2.3 — section headers are remembered, entry bytes are discarded.
fn parse_xref(src: &mut ByteSource, document: &mut COSDocument) -> Result<()> {
    if !read_keyword(src, b"xref") {
        return Err(ParseError::ExpectedKeyword {
            expected: "xref",
            actual: String::from_utf8_lossy(src.remaining().get(..8.min(src.remaining().len())).unwrap_or(b"")).into_owned(),
        }
        .into());
    }
    loop {
        skip_ws(src);
        if !matches!(src.peek(), Some(b) if b.is_ascii_digit()) {
            break;
        }
        let Some(start) = try_read_int(src) else { break };
        skip_ws(src);
        let Some(count) = try_read_int(src) else {
            return Err(ParseError::InvalidXref.into());
        };
        if start < 0 || count < 0 {
            return Err(ParseError::InvalidXref.into());
        }
        document.record_xref_section(start as u32, count as u32);
        src.read_line();
        for _ in 0..count {
            if src.is_eof() {
                break;
            }
            src.read_line();
        }
    }
    Ok(())
}

/// §4.2.4 — merge into the existing trailer, existing entries win.
fn parse_trailer(src: &mut ByteSource, document: &mut COSDocument) -> Result<()> {
    if !read_keyword(src, b"trailer") {
        return Err(ParseError::ExpectedKeyword {
            expected: "trailer",
            actual: String::new(),
        }
        .into());
    }
    skip_ws(src);
    let value = parse_value(src, "trailer")?;
    let dict = value.as_dict()?.clone();
    document.merge_trailer(dict);
    Ok(())
}

/// §4.2.5.
fn parse_startxref(src: &mut ByteSource) -> Result<()> {
    if !read_keyword(src, b"startxref") {
        return Err(ParseError::InvalidXref.into());
    }
    skip_ws(src);
    let _ = try_read_int(src); // byte offset, unused by the linear scan
    skip_ws(src);
    if read_keyword(src, b"%%EOF") || src.is_eof() {
        Ok(())
    } else {
        Err(ParseError::ExpectedEof.into())
    }
}

/// §4.2.2 — `num gen obj <value> [stream …endstream] endobj`.
fn parse_indirect_object(src: &mut ByteSource, document: &mut COSDocument) -> Result<()> {
    let Some(num) = try_read_int_tolerant(src) else {
        return Err(ParseError::MalformedObject(0, 0).into());
    };
    skip_ws(src);
    let Some(generation) = try_read_int(src) else {
        return Err(ParseError::MalformedObject(num.max(0) as u32, 0).into());
    };
    if num < 0 || generation < 0 {
        return Err(ParseError::MalformedObject(num.max(0) as u32, generation.max(0) as u16).into());
    }
    let id: ObjectId = (num as u32, generation as u16);

    skip_ws(src);
    if !read_keyword(src, b"obj") {
        return Err(ParseError::ExpectedKeyword {
            expected: "obj",
            actual: String::from_utf8_lossy(src.remaining().get(..3.min(src.remaining().len())).unwrap_or(b"")).into_owned(),
        }
        .into());
    }

    skip_ws(src);
    let mut value = parse_value(src, "indirect object")?;

    skip_ws(src);
    if peek_keyword(src, b"stream") {
        let dict = match &value {
            Object::Dictionary(dict) => dict.clone(),
            _ => return Err(ParseError::StreamNotPrecededByDict.into()),
        };
        read_keyword(src, b"stream");
        consume_eol(src);
        let payload_start = src.position();
        let length = resolve_stream_length(&dict, document);
        let (payload, payload_end) = extract_stream_payload(src.all(), payload_start, length);

        let mut stream = Stream::new(dict);
        stream.start_position = Some(payload_start);
        stream.set_content(document.scratch_mut(), &payload)?;
        value = Object::Stream(stream);

        src.seek(payload_end);
        skip_ws(src);
        read_keyword(src, b"endstream");
    }

    skip_ws(src);
    if !read_keyword(src, b"endobj") {
        let checkpoint = src.position();
        // Missing endobj tolerance: if what follows is recognizable as the
        // start of another object or a structural section, leave it for the
        // main loop to re-dispatch rather than failing outright.
        let recognized_next = try_read_int(src).is_some()
            || peek_keyword(src, b"xref")
            || peek_keyword(src, b"trailer")
            || peek_keyword(src, b"startxref")
            || src.is_eof();
        src.seek(checkpoint);
        if !recognized_next {
            skip_ws(src);
            if !read_keyword(src, b"endobj") {
                return Err(ParseError::ExpectedEndobj.into());
            }
        }
    }

    document.set_object_if_absent(id, value)?;
    Ok(())
}

fn resolve_stream_length(dict: &Dictionary, document: &COSDocument) -> Option<usize> {
    let length_obj = dict.get(b"Length").ok()?;
    let resolved = document.resolve_deep(length_obj).ok()?;
    let value = resolved.as_i64().ok()?;
    if value < 0 {
        None
    } else {
        Some(value as usize)
    }
}

/// Copy out the stream payload starting at `start`. Trusts `/Length` when
/// present and in-bounds; otherwise scans forward for `endstream` (§4.2.7).
fn extract_stream_payload(buffer: &[u8], start: usize, length: Option<usize>) -> (Vec<u8>, usize) {
    if let Some(length) = length {
        if let Some(end) = start.checked_add(length) {
            if end <= buffer.len() {
                return (buffer[start..end].to_vec(), end);
            }
        }
    }
    match find(&buffer[start..], b"endstream") {
        Some(relative) => {
            let mut payload_end = start + relative;
            if payload_end > start && buffer[payload_end - 1] == b'\n' {
                payload_end -= 1;
                if payload_end > start && buffer[payload_end - 1] == b'\r' {
                    payload_end -= 1;
                }
            } else if payload_end > start && buffer[payload_end - 1] == b'\r' {
                payload_end -= 1;
            }
            (buffer[start..payload_end].to_vec(), start + relative)
        }
        None => (Vec::new(), start),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    fn config() -> ParserConfig {
        ParserConfig {
            in_memory_scratch: true,
            ..ParserConfig::default()
        }
    }

    const TINY_PDF: &[u8] = b"%PDF-1.4\n\
1 0 obj\n<</Type/Catalog/Pages 2 0 R>>\nendobj\n\
2 0 obj\n<</Type/Pages/Kids[]/Count 0>>\nendobj\n\
xref\n0 3\n0000000000 65535 f \n0000000010 00000 n \n0000000060 00000 n \n\
trailer\n<</Root 1 0 R/Size 3>>\nstartxref\n0\n%%EOF\n";

    #[test]
    fn parses_tiny_document() {
        let document = parse(&config(), TINY_PDF).unwrap();
        assert!((document.version() - 1.4).abs() < f32::EPSILON);
        let root = document.trailer().get(b"Root").unwrap().as_reference().unwrap();
        assert_eq!(root, (1, 0));
        let pages = document.get_object((2, 0)).unwrap().as_dict().unwrap();
        assert_eq!(pages.get(b"Count").unwrap().as_i64().unwrap(), 0);
    }

    #[test]
    fn tolerates_garbage_before_header() {
        let mut input = vec![0u8; 17];
        input.extend_from_slice(TINY_PDF);
        let document = parse(&config(), &input).unwrap();
        assert!((document.version() - 1.4).abs() < f32::EPSILON);
    }

    #[test]
    fn tolerates_trailing_junk_after_eof() {
        let mut input = TINY_PDF.to_vec();
        input.extend_from_slice(b"random bytes that are not structured PDF syntax");
        let document = parse(&config(), &input).unwrap();
        assert_eq!(document.object_count(), 2);
    }

    #[test]
    fn tolerates_missing_endobj() {
        let input = String::from_utf8_lossy(TINY_PDF)
            .replace("2 0 obj\n<</Type/Pages/Kids[]/Count 0>>\nendobj\n", "2 0 obj\n<</Type/Pages/Kids[]/Count 0>>\n");
        let document = parse(&config(), input.as_bytes()).unwrap();
        assert_eq!(document.get_object((2, 0)).unwrap().as_dict().unwrap().get_type().unwrap(), b"Pages");
    }

    #[test]
    fn rejects_corrupt_header() {
        let err = parse(&config(), b"not a pdf").unwrap_err();
        assert!(matches!(err, Error::Parse(ParseError::CorruptHeader)));
    }
}
