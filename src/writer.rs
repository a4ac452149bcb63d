//! A minimal structural writer (§8 round-trip properties 6/7). It serializes a
//! `COSDocument`'s object pool and trailer into a fresh byte buffer the driver
//! can re-parse into an isomorphic pool — it does not attempt a real xref
//! table, incremental updates, or byte-exact layout of the original input.

use crate::dictionary::Dictionary;
use crate::document::COSDocument;
use crate::error::Result;
use crate::object::{Object, ObjectId, StringFormat};

/// Serialize every object in `document`'s pool plus its trailer (§8, property 6).
pub fn write_document(document: &COSDocument) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(format!("%PDF-{:.1}\n", document.version()).as_bytes());
    out.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

    let mut ids: Vec<ObjectId> = document.objects().map(|(id, _)| *id).collect();
    ids.sort_unstable();

    for id in ids {
        let object = document.get_object(id)?;
        out.extend_from_slice(format!("{} {} obj\n", id.0, id.1).as_bytes());
        write_object(&mut out, document, object)?;
        out.extend_from_slice(b"\nendobj\n");
    }

    out.extend_from_slice(b"trailer\n");
    write_dictionary(&mut out, document, document.trailer())?;
    out.extend_from_slice(b"\nstartxref\n0\n%%EOF\n");
    Ok(out)
}

fn write_object(out: &mut Vec<u8>, document: &COSDocument, object: &Object) -> Result<()> {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(value) => out.extend_from_slice(if *value { b"true" } else { b"false" }),
        Object::Integer(value) => out.extend_from_slice(value.to_string().as_bytes()),
        Object::Real(value) => out.extend_from_slice(value.to_string().as_bytes()),
        Object::Name(name) => write_name(out, name),
        Object::String(bytes, format) => write_string(out, bytes, *format),
        Object::Array(items) => {
            out.push(b'[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(b' ');
                }
                write_object(out, document, item)?;
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => write_dictionary(out, document, dict)?,
        Object::Stream(stream) => {
            write_dictionary(out, document, &stream.dict)?;
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(&stream.raw_bytes(document.scratch())?);
            out.extend_from_slice(b"\nendstream");
        }
        Object::Reference(id) => out.extend_from_slice(format!("{} {} R", id.0, id.1).as_bytes()),
    }
    Ok(())
}

fn write_dictionary(out: &mut Vec<u8>, document: &COSDocument, dict: &Dictionary) -> Result<()> {
    out.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        out.push(b'/');
        write_name(out, key);
        out.push(b' ');
        write_object(out, document, value)?;
    }
    out.extend_from_slice(b">>");
    Ok(())
}

fn is_regular_name_byte(byte: u8) -> bool {
    byte.is_ascii_graphic() && !matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#')
}

fn write_name(out: &mut Vec<u8>, name: &[u8]) {
    for &byte in name {
        if is_regular_name_byte(byte) {
            out.push(byte);
        } else {
            out.extend_from_slice(format!("#{:02X}", byte).as_bytes());
        }
    }
}

fn write_string(out: &mut Vec<u8>, bytes: &[u8], format: StringFormat) {
    match format {
        StringFormat::Hexadecimal => {
            out.push(b'<');
            for &byte in bytes {
                out.extend_from_slice(format!("{:02X}", byte).as_bytes());
            }
            out.push(b'>');
        }
        StringFormat::Literal => {
            out.push(b'(');
            for &byte in bytes {
                match byte {
                    b'(' | b')' | b'\\' => {
                        out.push(b'\\');
                        out.push(byte);
                    }
                    b'\n' => out.extend_from_slice(b"\\n"),
                    b'\r' => out.extend_from_slice(b"\\r"),
                    _ => out.push(byte),
                }
            }
            out.push(b')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::object::StringFormat;

    fn config() -> ParserConfig {
        ParserConfig {
            in_memory_scratch: true,
            ..ParserConfig::default()
        }
    }

    fn sample() -> COSDocument {
        let mut document = COSDocument::new(&config(), 1.5, "%PDF-1.5".to_string()).unwrap();

        let mut catalog = Dictionary::new();
        catalog.set(b"Type".to_vec(), Object::Name(b"Catalog".to_vec()));
        catalog.set(b"Pages".to_vec(), Object::Reference((2, 0)));
        document.set_object((1, 0), Object::Dictionary(catalog)).unwrap();

        let mut pages = Dictionary::new();
        pages.set(b"Type".to_vec(), Object::Name(b"Pages".to_vec()));
        pages.set(b"Kids".to_vec(), Object::Array(vec![Object::Reference((3, 0))]));
        pages.set(b"Count".to_vec(), Object::Integer(1));
        document.set_object((2, 0), Object::Dictionary(pages)).unwrap();

        let mut page = Dictionary::new();
        page.set(b"Type".to_vec(), Object::Name(b"Page".to_vec()));
        page.set(b"Parent".to_vec(), Object::Reference((2, 0)));
        page.set(
            b"Title".to_vec(),
            Object::String(b"A (nested) title".to_vec(), StringFormat::Literal),
        );
        document.set_object((3, 0), Object::Dictionary(page)).unwrap();

        document.trailer_mut().set(b"Root".to_vec(), Object::Reference((1, 0)));
        document.trailer_mut().set(b"Size".to_vec(), Object::Integer(4));
        document
    }

    #[test]
    fn round_trip_preserves_the_object_pool() {
        let document = sample();
        let bytes = write_document(&document).unwrap();

        let reparsed = crate::parse(&config(), &bytes).unwrap();
        assert_eq!(reparsed.object_count(), document.object_count());
        assert_eq!(
            reparsed.trailer().get(b"Root").unwrap().as_reference().unwrap(),
            (1, 0)
        );
        let page = reparsed.get_object((3, 0)).unwrap().as_dict().unwrap();
        assert_eq!(page.get(b"Title").unwrap().as_str().unwrap(), b"A (nested) title");
        let pages = reparsed.get_object((2, 0)).unwrap().as_dict().unwrap();
        assert_eq!(pages.get(b"Count").unwrap().as_i64().unwrap(), 1);
    }

    #[test]
    fn escapes_parentheses_and_backslashes_in_literal_strings() {
        let mut out = Vec::new();
        write_string(&mut out, b"a(b)c\\d", StringFormat::Literal);
        assert_eq!(out, b"(a\\(b\\)c\\\\d)".to_vec());
    }
}
