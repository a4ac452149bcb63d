//! Stream filter decoding (§3.1.1 of the expanded spec).
//!
//! Object streams (§4.4) and most content streams arrive FlateDecode-compressed,
//! frequently with a PNG/TIFF predictor layered on top; this module implements
//! exactly that path plus the two trivial ASCII wrapper filters, and reports
//! everything else (image/font codecs) as `UnsupportedFilter` rather than
//! silently handing back undecoded bytes.

use std::io::Read;

use flate2::read::ZlibDecoder;
use log::warn;

use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::object::Object;

const IMPLEMENTED: &[&[u8]] = &[b"FlateDecode", b"ASCII85Decode", b"ASCIIHexDecode"];

fn filter_names(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(|n| n.to_vec()))
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_parms(dict: &Dictionary, index: usize, count: usize) -> Option<Dictionary> {
    match dict.get(b"DecodeParms").or_else(|_| dict.get(b"DP")) {
        Ok(Object::Dictionary(d)) if count <= 1 => Some(d.clone()),
        Ok(Object::Array(items)) => items.get(index).and_then(|o| o.as_dict().ok().cloned()),
        _ => None,
    }
}

/// Apply every filter named in `dict["/Filter"]`, outermost first, to `raw`.
pub fn decode(dict: &Dictionary, raw: Vec<u8>) -> Result<Vec<u8>> {
    let names = filter_names(dict);
    let mut data = raw;
    for (index, name) in names.iter().enumerate() {
        if !IMPLEMENTED.contains(&name.as_slice()) {
            warn!(
                "stream filter {:?} is recognized but not decoded by this design",
                String::from_utf8_lossy(name)
            );
            return Err(Error::UnsupportedFilter(String::from_utf8_lossy(name).into_owned()));
        }
        data = match name.as_slice() {
            b"FlateDecode" => inflate(&data)?,
            b"ASCII85Decode" => ascii85_decode(&data)?,
            b"ASCIIHexDecode" => ascii_hex_decode(&data)?,
            _ => unreachable!(),
        };
        if name.as_slice() == b"FlateDecode" {
            if let Some(parms) = decode_parms(dict, index, names.len()) {
                data = apply_predictor(&parms, data)?;
            }
        }
    }
    Ok(data)
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::InvalidStream(format!("FlateDecode failed: {e}")))?;
    Ok(out)
}

fn ascii85_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut group = [0u32; 5];
    let mut group_len = 0usize;
    let mut iter = data.iter().copied().filter(|b| !b.is_ascii_whitespace());
    loop {
        let Some(byte) = iter.next() else { break };
        if byte == b'~' {
            break;
        }
        if byte == b'z' && group_len == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        if !(b'!'..=b'u').contains(&byte) {
            return Err(Error::InvalidStream("invalid ASCII85 byte".into()));
        }
        group[group_len] = (byte - b'!') as u32;
        group_len += 1;
        if group_len == 5 {
            let value = group.iter().fold(0u32, |acc, &d| acc.wrapping_mul(85).wrapping_add(d));
            out.extend_from_slice(&value.to_be_bytes());
            group_len = 0;
        }
    }
    if group_len > 0 {
        for slot in group.iter_mut().take(5).skip(group_len) {
            *slot = 84;
        }
        let value = group.iter().fold(0u32, |acc, &d| acc.wrapping_mul(85).wrapping_add(d));
        let bytes = value.to_be_bytes();
        out.extend_from_slice(&bytes[..group_len - 1]);
    }
    Ok(out)
}

fn ascii_hex_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut hi: Option<u8> = None;
    for &byte in data {
        if byte == b'>' {
            break;
        }
        if byte.is_ascii_whitespace() {
            continue;
        }
        let nibble = (byte as char)
            .to_digit(16)
            .ok_or_else(|| Error::InvalidStream("invalid ASCIIHex digit".into()))? as u8;
        match hi.take() {
            Some(h) => out.push((h << 4) | nibble),
            None => hi = Some(nibble),
        }
    }
    if let Some(h) = hi {
        out.push(h << 4);
    }
    Ok(out)
}

/// PNG/TIFF predictor undo (`/DecodeParms` with `/Predictor > 1`), applied after
/// Flate decompression — without this, object-stream and xref-stream payloads
/// decompress to bytes that are not the documented pairs/rows at all.
fn apply_predictor(parms: &Dictionary, data: Vec<u8>) -> Result<Vec<u8>> {
    let predictor = parms.get(b"Predictor").and_then(Object::as_i64).unwrap_or(1);
    if predictor <= 1 {
        return Ok(data);
    }
    let colors = parms.get(b"Colors").and_then(Object::as_i64).unwrap_or(1) as usize;
    let bpc = parms.get(b"BitsPerComponent").and_then(Object::as_i64).unwrap_or(8) as usize;
    let columns = parms.get(b"Columns").and_then(Object::as_i64).unwrap_or(1) as usize;
    let bytes_per_pixel = (colors * bpc).div_ceil(8).max(1);
    let row_len = (colors * bpc * columns).div_ceil(8);

    if predictor == 2 {
        return Ok(tiff_predictor(data, row_len, bytes_per_pixel));
    }

    // PNG predictors: each row is prefixed with a one-byte filter type tag.
    let stride = row_len + 1;
    if stride == 0 {
        return Ok(data);
    }
    let mut out = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_len];
    for chunk in data.chunks(stride) {
        if chunk.len() < 2 {
            break;
        }
        let tag = chunk[0];
        let mut row = chunk[1..].to_vec();
        row.resize(row_len, 0);
        for i in 0..row_len {
            let left = if i >= bytes_per_pixel { row[i - bytes_per_pixel] } else { 0 };
            let up = prev_row[i];
            let up_left = if i >= bytes_per_pixel {
                prev_row[i - bytes_per_pixel]
            } else {
                0
            };
            row[i] = match tag {
                0 => row[i],
                1 => row[i].wrapping_add(left),
                2 => row[i].wrapping_add(up),
                3 => row[i].wrapping_add(((left as u16 + up as u16) / 2) as u8),
                4 => row[i].wrapping_add(paeth(left, up, up_left)),
                _ => row[i],
            };
        }
        out.extend_from_slice(&row);
        prev_row = row;
    }
    Ok(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i32 + b as i32 - c as i32;
    let pa = (p - a as i32).abs();
    let pb = (p - b as i32).abs();
    let pc = (p - c as i32).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn tiff_predictor(mut data: Vec<u8>, row_len: usize, bytes_per_pixel: usize) -> Vec<u8> {
    if row_len == 0 {
        return data;
    }
    for row in data.chunks_mut(row_len) {
        for i in bytes_per_pixel..row.len() {
            row[i] = row[i].wrapping_add(row[i - bytes_per_pixel]);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn flate_compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn flate_round_trips() {
        let mut dict = Dictionary::new();
        dict.set(b"Filter".to_vec(), Object::Name(b"FlateDecode".to_vec()));
        let compressed = flate_compress(b"hello object stream");
        let decoded = decode(&dict, compressed).unwrap();
        assert_eq!(decoded, b"hello object stream");
    }

    #[test]
    fn ascii_hex_round_trips() {
        let mut dict = Dictionary::new();
        dict.set(b"Filter".to_vec(), Object::Name(b"ASCIIHexDecode".to_vec()));
        let decoded = decode(&dict, b"68656c6c6f>".to_vec()).unwrap();
        assert_eq!(decoded, b"hello");
    }

    #[test]
    fn unknown_filter_is_reported() {
        let mut dict = Dictionary::new();
        dict.set(b"Filter".to_vec(), Object::Name(b"DCTDecode".to_vec()));
        assert!(matches!(decode(&dict, vec![1, 2, 3]), Err(Error::UnsupportedFilter(_))));
    }

    #[test]
    fn png_predictor_sub_is_undone() {
        // Two 1-byte-per-pixel, 3-column rows, filter type 1 ("Sub") on the second byte.
        let mut dict = Dictionary::new();
        dict.set(b"Filter".to_vec(), Object::Name(b"FlateDecode".to_vec()));
        let mut parms = Dictionary::new();
        parms.set(b"Predictor".to_vec(), Object::Integer(12));
        parms.set(b"Colors".to_vec(), Object::Integer(1));
        parms.set(b"BitsPerComponent".to_vec(), Object::Integer(8));
        parms.set(b"Columns".to_vec(), Object::Integer(3));
        dict.set(b"DecodeParms".to_vec(), Object::Dictionary(parms));

        // Row: tag=1 (Sub), raw bytes [10, 5, 5] -> decoded [10, 15, 20]
        let raw_row = [1u8, 10, 5, 5];
        let compressed = flate_compress(&raw_row);
        let decoded = decode(&dict, compressed).unwrap();
        assert_eq!(decoded, vec![10, 15, 20]);
    }
}
