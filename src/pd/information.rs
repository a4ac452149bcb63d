//! The document information dictionary (`/Info`, §3.3).

use crate::document::COSDocument;
use crate::error::Result;
use crate::object::ObjectId;

/// A view over the trailer's `/Info` dictionary.
pub struct PDDocumentInformation {
    pub id: Option<ObjectId>,
}

impl PDDocumentInformation {
    pub fn from_trailer(document: &COSDocument) -> Result<Self> {
        let id = match document.trailer().get(b"Info") {
            Ok(object) => Some(object.as_reference()?),
            Err(_) => None,
        };
        Ok(PDDocumentInformation { id })
    }

    fn entry<'a>(&self, document: &'a COSDocument, key: &[u8]) -> Option<&'a [u8]> {
        let id = self.id?;
        document.get_object(id).ok()?.as_dict().ok()?.get(key).ok()?.as_str().ok()
    }

    pub fn title<'a>(&self, document: &'a COSDocument) -> Option<&'a [u8]> {
        self.entry(document, b"Title")
    }

    pub fn author<'a>(&self, document: &'a COSDocument) -> Option<&'a [u8]> {
        self.entry(document, b"Author")
    }

    pub fn subject<'a>(&self, document: &'a COSDocument) -> Option<&'a [u8]> {
        self.entry(document, b"Subject")
    }

    pub fn keywords<'a>(&self, document: &'a COSDocument) -> Option<&'a [u8]> {
        self.entry(document, b"Keywords")
    }

    pub fn creator<'a>(&self, document: &'a COSDocument) -> Option<&'a [u8]> {
        self.entry(document, b"Creator")
    }

    pub fn producer<'a>(&self, document: &'a COSDocument) -> Option<&'a [u8]> {
        self.entry(document, b"Producer")
    }

    pub fn custom<'a>(&self, document: &'a COSDocument, key: &[u8]) -> Option<&'a [u8]> {
        self.entry(document, key)
    }

    #[cfg(feature = "chrono")]
    pub fn creation_date(&self, document: &COSDocument) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        self.entry(document, b"CreationDate").and_then(parse_pdf_date)
    }

    #[cfg(feature = "chrono")]
    pub fn modification_date(&self, document: &COSDocument) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        self.entry(document, b"ModDate").and_then(parse_pdf_date)
    }

    pub fn keys(&self, document: &COSDocument) -> Vec<Vec<u8>> {
        let Some(id) = self.id else { return Vec::new() };
        let Ok(object) = document.get_object(id) else { return Vec::new() };
        let Ok(dict) = object.as_dict() else { return Vec::new() };
        dict.iter().map(|(key, _)| key.clone()).collect()
    }
}

/// Parse a PDF date string `D:YYYYMMDDHHmmSSOHH'mm'`. Every field past the
/// year is optional; a missing timezone defaults to UTC.
#[cfg(feature = "chrono")]
fn parse_pdf_date(raw: &[u8]) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    use chrono::{FixedOffset, TimeZone};

    let text = std::str::from_utf8(raw).ok()?;
    let text = text.strip_prefix("D:").unwrap_or(text);

    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    let field = |start: usize, len: usize, default: u32| -> u32 {
        digits.get(start..start + len).and_then(|s| s.parse().ok()).unwrap_or(default)
    };
    let year: i32 = digits[0..4].parse().ok()?;
    let month = if digits.len() >= 6 { field(4, 2, 1) } else { 1 };
    let day = if digits.len() >= 8 { field(6, 2, 1) } else { 1 };
    let hour = if digits.len() >= 10 { field(8, 2, 0) } else { 0 };
    let minute = if digits.len() >= 12 { field(10, 2, 0) } else { 0 };
    let second = if digits.len() >= 14 { field(12, 2, 0) } else { 0 };

    let rest = &text[digits.len()..];
    let offset = parse_offset(rest).unwrap_or(0);
    let tz = FixedOffset::east_opt(offset)?;
    tz.with_ymd_and_hms(year, month.max(1), day.max(1), hour, minute, second)
        .single()
}

#[cfg(feature = "chrono")]
fn parse_offset(rest: &str) -> Option<i32> {
    let mut chars = rest.chars();
    let sign = match chars.next()? {
        '+' => 1,
        '-' => -1,
        'Z' | 'z' => return Some(0),
        _ => return None,
    };
    let remainder: String = chars.collect();
    let digits_only: String = remainder.chars().filter(|c| c.is_ascii_digit()).collect();
    let hours: i32 = digits_only.get(0..2)?.parse().ok()?;
    let minutes: i32 = digits_only.get(2..4).and_then(|s| s.parse().ok()).unwrap_or(0);
    Some(sign * (hours * 3600 + minutes * 60))
}

#[cfg(all(test, feature = "chrono"))]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::dictionary::Dictionary;
    use crate::object::Object;

    fn doc_with_info() -> COSDocument {
        let config = ParserConfig {
            in_memory_scratch: true,
            ..ParserConfig::default()
        };
        let mut document = COSDocument::new(&config, 1.7, "%PDF-1.7".into()).unwrap();
        let mut info = Dictionary::new();
        info.set(b"Title".to_vec(), Object::String(b"Report".to_vec(), crate::object::StringFormat::Literal));
        info.set(
            b"CreationDate".to_vec(),
            Object::String(b"D:20230415120000+02'00'".to_vec(), crate::object::StringFormat::Literal),
        );
        document.set_object((5, 0), Object::Dictionary(info)).unwrap();
        document.trailer_mut().set(b"Info".to_vec(), Object::Reference((5, 0)));
        document
    }

    #[test]
    fn reads_title_and_creation_date() {
        let document = doc_with_info();
        let info = PDDocumentInformation::from_trailer(&document).unwrap();
        assert_eq!(info.title(&document), Some(&b"Report"[..]));
        let date = info.creation_date(&document).unwrap();
        assert_eq!(date.to_rfc3339(), "2023-04-15T12:00:00+02:00");
    }

    #[test]
    fn missing_info_yields_none() {
        let config = ParserConfig {
            in_memory_scratch: true,
            ..ParserConfig::default()
        };
        let document = COSDocument::new(&config, 1.7, "%PDF-1.7".into()).unwrap();
        let info = PDDocumentInformation::from_trailer(&document).unwrap();
        assert_eq!(info.title(&document), None);
    }
}
