use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take, take_while, take_while1};
use nom::character::complete::{char, digit1, one_of};
use nom::combinator::{map, map_res, opt, recognize, value};
use nom::multi::{many0, many0_count};
use nom::sequence::{delimited, pair, preceded, terminated};
use nom::IResult;
use nom_locate::LocatedSpan;

use crate::dictionary::Dictionary;
use crate::object::{Object, StringFormat};

/// Input type for every nom combinator in this module. The `&'static str` extra
/// names the production currently running, purely for diagnostics.
pub type ParserInput<'a> = LocatedSpan<&'a [u8], &'static str>;

pub fn is_whitespace(byte: u8) -> bool {
    matches!(byte, 0 | b'\t' | b'\n' | 0x0C | b'\r' | b' ')
}

fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_name_terminator(byte: u8) -> bool {
    is_whitespace(byte) || is_delimiter(byte)
}

fn comment(input: ParserInput) -> IResult<ParserInput, ()> {
    value((), pair(char('%'), take_while(|b| b != b'\n' && b != b'\r')))(input)
}

/// Skip runs of whitespace and `%` comments (§4.2.1).
fn ws0(input: ParserInput) -> IResult<ParserInput, ()> {
    value(
        (),
        many0_count(alt((value((), take_while1(is_whitespace)), comment))),
    )(input)
}

/// Convenience entry point for callers that just want the remaining span.
pub fn skip_whitespace_and_comments(input: ParserInput) -> ParserInput {
    ws0(input).map(|(rest, ())| rest).unwrap_or(input)
}

fn integer(input: ParserInput) -> IResult<ParserInput, i64> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |span: ParserInput| {
        std::str::from_utf8(span.fragment())
            .unwrap_or("")
            .parse::<i64>()
    })(input)
}

fn real(input: ParserInput) -> IResult<ParserInput, f64> {
    map_res(
        recognize(pair(
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit1)))),
                recognize(pair(char('.'), digit1)),
            )),
        )),
        |span: ParserInput| std::str::from_utf8(span.fragment()).unwrap_or("").parse::<f64>(),
    )(input)
}

/// A number literal, preferring the integer production; falls back to real
/// when a decimal point is present (§4.2.6).
fn number(input: ParserInput) -> IResult<ParserInput, Object> {
    alt((
        map(
            recognize(pair(opt(one_of("+-")), pair(digit1, pair(char('.'), digit1)))),
            |span: ParserInput| Object::Real(std::str::from_utf8(span.fragment()).unwrap_or("0").parse().unwrap_or(0.0)),
        ),
        map(
            recognize(pair(opt(one_of("+-")), pair(char('.'), digit1))),
            |span: ParserInput| Object::Real(std::str::from_utf8(span.fragment()).unwrap_or("0").parse().unwrap_or(0.0)),
        ),
        map(integer, Object::Integer),
    ))(input)
}

fn hex_digit_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|v| v as u8)
}

/// `#xx` escapes inside a name are decoded (§4.2.1).
fn name(input: ParserInput) -> IResult<ParserInput, Object> {
    let (input, _) = char('/')(input)?;
    let (input, raw) = take_while(|b| !is_name_terminator(b))(input)?;
    let mut out = Vec::with_capacity(raw.fragment().len());
    let bytes = raw.fragment();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'#' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit_value(bytes[i + 1]), hex_digit_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    Ok((input, Object::Name(out)))
}

/// Literal `(...)` string with balanced parentheses and backslash escapes.
fn literal_string(input: ParserInput) -> IResult<ParserInput, Object> {
    let (mut input, _) = char('(')(input)?;
    let mut depth = 1i32;
    let mut out = Vec::new();
    loop {
        let bytes = input.fragment();
        if bytes.is_empty() {
            return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Eof)));
        }
        let byte = bytes[0];
        match byte {
            b'\\' if bytes.len() > 1 => {
                let escape = bytes[1];
                let (consumed, decoded): (usize, Option<u8>) = match escape {
                    b'n' => (2, Some(b'\n')),
                    b'r' => (2, Some(b'\r')),
                    b't' => (2, Some(b'\t')),
                    b'b' => (2, Some(0x08)),
                    b'f' => (2, Some(0x0C)),
                    b'(' => (2, Some(b'(')),
                    b')' => (2, Some(b')')),
                    b'\\' => (2, Some(b'\\')),
                    b'\n' => (2, None),
                    b'\r' => {
                        if bytes.len() > 2 && bytes[2] == b'\n' {
                            (3, None)
                        } else {
                            (2, None)
                        }
                    }
                    b'0'..=b'7' => {
                        let mut value = 0u32;
                        let mut used = 1;
                        for &b in bytes.iter().skip(1).take(3) {
                            if (b'0'..=b'7').contains(&b) {
                                value = value * 8 + (b - b'0') as u32;
                                used += 1;
                            } else {
                                break;
                            }
                        }
                        (used, Some(value as u8))
                    }
                    other => (2, Some(other)),
                };
                if let Some(b) = decoded {
                    out.push(b);
                }
                let (rest, _) = take::<usize, ParserInput, nom::error::Error<ParserInput>>(consumed)(input)?;
                input = rest;
            }
            b'(' => {
                depth += 1;
                out.push(byte);
                let (rest, _) = take::<usize, ParserInput, nom::error::Error<ParserInput>>(1usize)(input)?;
                input = rest;
            }
            b')' => {
                depth -= 1;
                let (rest, _) = take::<usize, ParserInput, nom::error::Error<ParserInput>>(1usize)(input)?;
                input = rest;
                if depth == 0 {
                    return Ok((input, Object::String(out, StringFormat::Literal)));
                }
                out.push(byte);
            }
            _ => {
                out.push(byte);
                let (rest, _) = take::<usize, ParserInput, nom::error::Error<ParserInput>>(1usize)(input)?;
                input = rest;
            }
        }
    }
}

/// `<...>` hex string; an odd trailing nibble is padded with a zero low nibble.
fn hex_string(input: ParserInput) -> IResult<ParserInput, Object> {
    let (input, raw) = delimited(char('<'), is_not(">"), char('>'))(input)?;
    let mut out = Vec::new();
    let mut hi: Option<u8> = None;
    for &byte in raw.fragment().iter() {
        if is_whitespace(byte) {
            continue;
        }
        let Some(nibble) = hex_digit_value(byte) else {
            continue;
        };
        match hi.take() {
            Some(h) => out.push((h << 4) | nibble),
            None => hi = Some(nibble),
        }
    }
    if let Some(h) = hi {
        out.push(h << 4);
    }
    Ok((input, Object::String(out, StringFormat::Hexadecimal)))
}

fn boolean(input: ParserInput) -> IResult<ParserInput, Object> {
    alt((
        value(Object::Boolean(true), tag("true")),
        value(Object::Boolean(false), tag("false")),
    ))(input)
}

fn null(input: ParserInput) -> IResult<ParserInput, Object> {
    value(Object::Null, tag("null"))(input)
}

fn array(input: ParserInput) -> IResult<ParserInput, Object> {
    let (input, _) = char('[')(input)?;
    let (input, _) = ws0(input)?;
    let (input, items) = many0(terminated(direct_object, ws0))(input)?;
    let (input, _) = char(']')(input)?;
    Ok((input, Object::Array(items)))
}

fn dictionary(input: ParserInput) -> IResult<ParserInput, Object> {
    let (input, _) = tag("<<")(input)?;
    let (input, _) = ws0(input)?;
    let (input, entries) = many0(terminated(pair(preceded(ws0, name), preceded(ws0, direct_object)), ws0))(input)?;
    let (input, _) = ws0(input)?;
    let (input, _) = tag(">>")(input)?;
    let dict = entries
        .into_iter()
        .filter_map(|(key, value)| match key {
            Object::Name(name) => Some((name, value)),
            _ => None,
        })
        .collect::<Dictionary>();
    Ok((input, Object::Dictionary(dict)))
}

/// `num gen R` indirect reference, tried ahead of a bare number (§4.2.6).
fn reference(input: ParserInput) -> IResult<ParserInput, Object> {
    let (rest, num) = integer(input)?;
    let (rest, _) = take_while1(is_whitespace)(rest)?;
    let (rest, gen) = integer(rest)?;
    let (rest, _) = take_while1(is_whitespace)(rest)?;
    let (rest, _) = char('R')(rest)?;
    if num < 0 || gen < 0 {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Verify)));
    }
    Ok((rest, Object::Reference((num as u32, gen as u16))))
}

/// Any direct (non-indirect-object-wrapper) COS value (§4.2.6).
pub fn direct_object(input: ParserInput) -> IResult<ParserInput, Object> {
    alt((
        dictionary,
        hex_string,
        array,
        name,
        literal_string,
        boolean,
        null,
        reference,
        number,
    ))(input)
}

/// Parse the three bytes following `%PDF-` as a version float; returns `None`
/// on malformed input (§4.1 step 3 — the driver maps this to `CorruptHeader`).
pub fn header_version(bytes: &[u8]) -> Option<f32> {
    let text = std::str::from_utf8(bytes.get(..3)?).ok()?;
    text.trim().parse::<f32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(bytes: &[u8]) -> ParserInput<'_> {
        ParserInput::new_extra(bytes, "test")
    }

    #[test]
    fn parses_integer() {
        let (_, obj) = direct_object(span(b"-42")).unwrap();
        assert_eq!(obj, Object::Integer(-42));
    }

    #[test]
    fn parses_real_with_leading_dot() {
        let (_, obj) = direct_object(span(b".5")).unwrap();
        assert_eq!(obj, Object::Real(0.5));
    }

    #[test]
    fn parses_reference_before_number() {
        let (_, obj) = direct_object(span(b"12 0 R")).unwrap();
        assert_eq!(obj, Object::Reference((12, 0)));
    }

    #[test]
    fn parses_name_with_hex_escape() {
        let (_, obj) = direct_object(span(b"/A#20B")).unwrap();
        assert_eq!(obj, Object::Name(b"A B".to_vec()));
    }

    #[test]
    fn parses_literal_string_with_nested_parens() {
        let (_, obj) = direct_object(span(b"(a(b)c)")).unwrap();
        assert_eq!(obj, Object::String(b"a(b)c".to_vec(), StringFormat::Literal));
    }

    #[test]
    fn parses_literal_string_octal_escape() {
        let (_, obj) = direct_object(span(b"(\\101)")).unwrap();
        assert_eq!(obj, Object::String(b"A".to_vec(), StringFormat::Literal));
    }

    #[test]
    fn parses_hex_string_with_odd_nibble() {
        let (_, obj) = direct_object(span(b"<48656C6C6F1>")).unwrap();
        assert_eq!(obj, Object::String(b"Hello\x10".to_vec(), StringFormat::Hexadecimal));
    }

    #[test]
    fn parses_array_of_mixed_types() {
        let (_, obj) = direct_object(span(b"[1 /Two (three)]")).unwrap();
        assert_eq!(
            obj,
            Object::Array(vec![
                Object::Integer(1),
                Object::Name(b"Two".to_vec()),
                Object::String(b"three".to_vec(), StringFormat::Literal),
            ])
        );
    }

    #[test]
    fn parses_dictionary() {
        let (_, obj) = direct_object(span(b"<< /Type /Catalog /Pages 2 0 R >>")).unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get(b"Type").unwrap().as_name().unwrap(), b"Catalog");
        assert_eq!(dict.get(b"Pages").unwrap().as_reference().unwrap(), (2, 0));
    }

    #[test]
    fn header_version_parses_standard_form() {
        assert_eq!(header_version(b"1.4\n"), Some(1.4));
    }

    #[test]
    fn header_version_rejects_garbage() {
        assert_eq!(header_version(b"x.y"), None);
    }
}
