//! Annotation views (§3.3, §4.5, §8 scenario S6).

use bitflags::bitflags;

use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::object::Object;

use super::rectangle::PDRectangle;

bitflags! {
    /// `/F` entry bits, 1-indexed in PDF's own numbering (bit 1 = Invisible) but stored
    /// here 0-indexed to match Rust's `bitflags` convention; `bits()` still
    /// round-trips the same integer that lands in the dictionary.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AnnotationFlags: u32 {
        const INVISIBLE    = 1 << 0;
        const HIDDEN       = 1 << 1;
        const PRINTED      = 1 << 2;
        const NO_ZOOM      = 1 << 3;
        const NO_ROTATE    = 1 << 4;
        const NO_VIEW      = 1 << 5;
        const READ_ONLY    = 1 << 6;
        const LOCKED       = 1 << 7;
        const TOGGLE_NO_VIEW = 1 << 8;
    }
}

/// Dispatch target for `/Subtype`; unknown subtypes are tolerated rather than
/// rejected (§4.5 — "never an error — tolerance").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    RubberStamp,
    Unknown,
}

/// A view over a `/Type /Annot` dictionary.
pub struct PDAnnotation<'a> {
    dict: &'a mut Dictionary,
}

impl<'a> PDAnnotation<'a> {
    pub fn new(dict: &'a mut Dictionary) -> Self {
        PDAnnotation { dict }
    }

    /// Dispatch on `/Subtype`. Never fails: an unrecognized or absent subtype
    /// simply yields `Unknown`.
    pub fn kind(&self) -> AnnotationKind {
        match self.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Stamp") => AnnotationKind::RubberStamp,
            _ => AnnotationKind::Unknown,
        }
    }

    fn flags(&self) -> AnnotationFlags {
        let bits = self
            .dict
            .get(b"F")
            .and_then(Object::as_i64)
            .unwrap_or(0)
            .max(0) as u32;
        AnnotationFlags::from_bits_truncate(bits)
    }

    fn set_flags(&mut self, flags: AnnotationFlags) {
        self.dict.set(b"F".to_vec(), Object::Integer(flags.bits() as i64));
    }

    pub fn is_invisible(&self) -> bool {
        self.flags().contains(AnnotationFlags::INVISIBLE)
    }

    pub fn is_hidden(&self) -> bool {
        self.flags().contains(AnnotationFlags::HIDDEN)
    }

    pub fn set_hidden(&mut self, value: bool) {
        let mut flags = self.flags();
        flags.set(AnnotationFlags::HIDDEN, value);
        self.set_flags(flags);
    }

    pub fn is_printed(&self) -> bool {
        self.flags().contains(AnnotationFlags::PRINTED)
    }

    pub fn is_no_zoom(&self) -> bool {
        self.flags().contains(AnnotationFlags::NO_ZOOM)
    }

    pub fn is_no_rotate(&self) -> bool {
        self.flags().contains(AnnotationFlags::NO_ROTATE)
    }

    pub fn is_no_view(&self) -> bool {
        self.flags().contains(AnnotationFlags::NO_VIEW)
    }

    pub fn is_read_only(&self) -> bool {
        self.flags().contains(AnnotationFlags::READ_ONLY)
    }

    pub fn is_locked(&self) -> bool {
        self.flags().contains(AnnotationFlags::LOCKED)
    }

    pub fn is_toggle_no_view(&self) -> bool {
        self.flags().contains(AnnotationFlags::TOGGLE_NO_VIEW)
    }

    pub fn appearance_state(&self) -> Option<&[u8]> {
        self.dict.get(b"AS").and_then(Object::as_name).ok()
    }

    pub fn contents(&self) -> Option<&[u8]> {
        self.dict.get(b"Contents").and_then(Object::as_str).ok()
    }

    /// `/Rect`, the annotation's location on the page. `Err` if present but
    /// malformed, `Ok(None)` if the entry is simply absent.
    pub fn rect(&self) -> Result<Option<PDRectangle>> {
        match self.dict.get(b"Rect") {
            Ok(Object::Array(items)) => Ok(Some(PDRectangle::from_array(items)?)),
            _ => Ok(None),
        }
    }

    /// `/AP`, the appearance dictionary (normal/rollover/down sub-dictionaries).
    pub fn appearance_dictionary(&self) -> Option<&Dictionary> {
        self.dict.get(b"AP").and_then(Object::as_dict).ok()
    }

    /// `/AA`, the additional-actions dictionary.
    pub fn additional_actions(&self) -> Option<&Dictionary> {
        self.dict.get(b"AA").and_then(Object::as_dict).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_printed_and_no_zoom_bits() {
        let mut dict = Dictionary::new();
        dict.set(b"F".to_vec(), Object::Integer(12)); // bits 2 and 3 -> Printed, NoZoom
        let annotation = PDAnnotation::new(&mut dict);
        assert!(annotation.is_printed());
        assert!(annotation.is_no_zoom());
        assert!(!annotation.is_hidden());
        assert!(!annotation.is_locked());
    }

    #[test]
    fn set_hidden_preserves_other_bits() {
        let mut dict = Dictionary::new();
        dict.set(b"F".to_vec(), Object::Integer(12));
        let mut annotation = PDAnnotation::new(&mut dict);
        annotation.set_hidden(true);
        assert_eq!(dict.get(b"F").unwrap().as_i64().unwrap(), 14);
    }

    #[test]
    fn unknown_subtype_is_tolerated() {
        let mut dict = Dictionary::new();
        dict.set(b"Subtype".to_vec(), Object::Name(b"Widget".to_vec()));
        let annotation = PDAnnotation::new(&mut dict);
        assert_eq!(annotation.kind(), AnnotationKind::Unknown);
    }

    #[test]
    fn rect_reads_the_four_element_array() {
        let mut dict = Dictionary::new();
        dict.set(
            b"Rect".to_vec(),
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(100),
                Object::Integer(50),
            ]),
        );
        let annotation = PDAnnotation::new(&mut dict);
        let rect = annotation.rect().unwrap().unwrap();
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 50.0);
    }

    #[test]
    fn rect_is_none_when_absent() {
        let mut dict = Dictionary::new();
        let annotation = PDAnnotation::new(&mut dict);
        assert!(annotation.rect().unwrap().is_none());
    }

    #[test]
    fn appearance_dictionary_reads_the_ap_entry() {
        let mut dict = Dictionary::new();
        let mut ap = Dictionary::new();
        ap.set(b"N".to_vec(), Object::Reference((5, 0)));
        dict.set(b"AP".to_vec(), Object::Dictionary(ap));
        let annotation = PDAnnotation::new(&mut dict);
        let ap = annotation.appearance_dictionary().unwrap();
        assert_eq!(ap.get(b"N").unwrap().as_reference().unwrap(), (5, 0));
    }

    #[test]
    fn appearance_dictionary_is_none_when_absent() {
        let mut dict = Dictionary::new();
        let annotation = PDAnnotation::new(&mut dict);
        assert!(annotation.appearance_dictionary().is_none());
    }

    #[test]
    fn additional_actions_reads_the_aa_entry() {
        let mut dict = Dictionary::new();
        let mut aa = Dictionary::new();
        aa.set(b"E".to_vec(), Object::Reference((7, 0)));
        dict.set(b"AA".to_vec(), Object::Dictionary(aa));
        let annotation = PDAnnotation::new(&mut dict);
        let aa = annotation.additional_actions().unwrap();
        assert_eq!(aa.get(b"E").unwrap().as_reference().unwrap(), (7, 0));
    }

    #[test]
    fn additional_actions_is_none_when_absent() {
        let mut dict = Dictionary::new();
        let annotation = PDAnnotation::new(&mut dict);
        assert!(annotation.additional_actions().is_none());
    }
}
