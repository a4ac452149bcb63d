//! The COS document store (§3.2, §4.3).

use std::collections::HashMap;

use log::warn;

use crate::config::ParserConfig;
use crate::dictionary::Dictionary;
use crate::error::{Error, Result};
use crate::object::{Object, ObjectId};
use crate::scratch::ScratchFile;

/// A shared `Null` to hand back for unresolved references: `&Object::Null`
/// as an rvalue is not static-promoted (`Object` has drop glue), so it can't
/// be returned directly from a function borrowing `self`.
static NULL: Object = Object::Null;

/// An xref section header as encountered during the linear scan (§4.2.3). The
/// entries themselves are discarded; only the `(start, count)` pair survives,
/// kept purely so a caller can sanity-check coverage against the object pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefSection {
    pub start: u32,
    pub count: u32,
}

/// The indirect-object pool and trailer assembled by a parse (§3.2).
pub struct COSDocument {
    pool: HashMap<ObjectId, Object>,
    trailer: Dictionary,
    xrefs: Vec<XrefSection>,
    scratch: ScratchFile,
    version: f32,
    header_string: String,
    closed: bool,
}

impl COSDocument {
    pub fn new(config: &ParserConfig, version: f32, header_string: String) -> Result<Self> {
        let scratch = if config.in_memory_scratch {
            ScratchFile::new_in_memory()
        } else {
            ScratchFile::new_on_disk(config.scratch_dir.as_ref())?
        };
        Ok(COSDocument {
            pool: HashMap::new(),
            trailer: Dictionary::new(),
            xrefs: Vec::new(),
            scratch,
            version,
            header_string,
            closed: false,
        })
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::DocumentClosed);
        }
        Ok(())
    }

    pub fn version(&self) -> f32 {
        self.version
    }

    pub fn header_string(&self) -> &str {
        &self.header_string
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn trailer_mut(&mut self) -> &mut Dictionary {
        &mut self.trailer
    }

    /// Merge `section` into the trailer, with entries already present winning
    /// (§4.2.4 — first trailer seen in the linear scan is authoritative).
    pub fn merge_trailer(&mut self, section: Dictionary) {
        self.trailer.merge_keep_existing(section);
    }

    pub fn record_xref_section(&mut self, start: u32, count: u32) {
        self.xrefs.push(XrefSection { start, count });
    }

    pub fn xref_sections(&self) -> &[XrefSection] {
        &self.xrefs
    }

    pub fn scratch(&self) -> &ScratchFile {
        &self.scratch
    }

    pub fn scratch_mut(&mut self) -> &mut ScratchFile {
        &mut self.scratch
    }

    /// Install (or overwrite) the object at `id`. Used both for freshly parsed
    /// indirect objects and for objects dereferenced out of object streams.
    pub fn set_object(&mut self, id: ObjectId, object: Object) -> Result<()> {
        self.check_open()?;
        self.pool.insert(id, object);
        Ok(())
    }

    /// Install `object` at `id` only if the pool has nothing there yet. Per the
    /// PDF spec, the first definition of a given object number wins.
    pub fn set_object_if_absent(&mut self, id: ObjectId, object: Object) -> Result<()> {
        self.check_open()?;
        self.pool.entry(id).or_insert(object);
        Ok(())
    }

    pub fn has_object(&self, id: ObjectId) -> bool {
        self.pool.contains_key(&id)
    }

    pub fn get_object(&self, id: ObjectId) -> Result<&Object> {
        self.check_open()?;
        self.pool.get(&id).ok_or_else(|| Error::missing_object(id))
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.check_open()?;
        self.pool.get_mut(&id).ok_or_else(|| Error::missing_object(id))
    }

    pub fn objects(&self) -> impl Iterator<Item = (&ObjectId, &Object)> {
        self.pool.iter()
    }

    pub fn object_count(&self) -> usize {
        self.pool.len()
    }

    /// Resolve `object` one level: a `Reference` becomes the pool's value at
    /// that key (or `Null` if unresolved, per the §3.2 invariant), anything
    /// else is returned unchanged.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        self.check_open()?;
        match object {
            Object::Reference(id) => match self.pool.get(id) {
                Some(resolved) => Ok(resolved),
                None => {
                    warn!("unresolved reference to ({}, {}), treating as null", id.0, id.1);
                    Ok(&NULL)
                }
            },
            other => Ok(other),
        }
    }

    /// Like `resolve`, but follows chains of references (bounded by a cycle guard).
    pub fn resolve_deep<'a>(&'a self, mut object: &'a Object) -> Result<&'a Object> {
        self.check_open()?;
        let mut seen = std::collections::HashSet::new();
        loop {
            match object {
                Object::Reference(id) => {
                    if !seen.insert(*id) {
                        return Err(Error::reference_cycle(*id));
                    }
                    match self.pool.get(id) {
                        Some(next) => object = next,
                        None => return Ok(&NULL),
                    }
                }
                other => return Ok(other),
            }
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.trailer.has(b"Encrypt")
    }

    /// The trailer's `/ID` array (§3.2 `documentID`) — two byte-strings when
    /// present, `None` if the trailer carries no `/ID` entry.
    pub fn id(&self) -> Option<&[Object]> {
        match self.trailer.get(b"ID") {
            Ok(Object::Array(items)) => Some(items),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the scratch file. Idempotent (§5).
    pub fn close(&mut self) {
        if !self.closed {
            self.scratch.close();
            self.closed = true;
        }
    }
}

impl Drop for COSDocument {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> COSDocument {
        let config = ParserConfig {
            in_memory_scratch: true,
            ..ParserConfig::default()
        };
        COSDocument::new(&config, 1.4, "%PDF-1.4".to_string()).unwrap()
    }

    #[test]
    fn forward_reference_resolves_after_later_install() {
        let mut document = doc();
        document.set_object_if_absent((1, 0), Object::Reference((2, 0))).unwrap();
        assert!(matches!(document.resolve_deep(&Object::Reference((2, 0))), Ok(Object::Null)));
        document.set_object((2, 0), Object::Integer(42)).unwrap();
        assert_eq!(document.resolve_deep(&Object::Reference((2, 0))).unwrap().as_i64().unwrap(), 42);
    }

    #[test]
    fn first_object_definition_wins() {
        let mut document = doc();
        document.set_object_if_absent((1, 0), Object::Integer(1)).unwrap();
        document.set_object_if_absent((1, 0), Object::Integer(2)).unwrap();
        assert_eq!(document.get_object((1, 0)).unwrap().as_i64().unwrap(), 1);
    }

    #[test]
    fn trailer_merge_keeps_first_seen() {
        let mut document = doc();
        let mut first = Dictionary::new();
        first.set(b"Root".to_vec(), Object::Reference((1, 0)));
        document.merge_trailer(first);
        let mut second = Dictionary::new();
        second.set(b"Root".to_vec(), Object::Reference((9, 0)));
        second.set(b"Size".to_vec(), Object::Integer(3));
        document.merge_trailer(second);
        assert_eq!(document.trailer().get(b"Root").unwrap().as_reference().unwrap(), (1, 0));
        assert_eq!(document.trailer().get(b"Size").unwrap().as_i64().unwrap(), 3);
    }

    #[test]
    fn reference_cycle_is_detected() {
        let mut document = doc();
        document.set_object((1, 0), Object::Reference((2, 0))).unwrap();
        document.set_object((2, 0), Object::Reference((1, 0))).unwrap();
        assert!(matches!(
            document.resolve_deep(&Object::Reference((1, 0))),
            Err(Error::ReferenceCycle(_, _))
        ));
    }

    #[test]
    fn id_reads_the_trailer_id_array() {
        let mut document = doc();
        assert!(document.id().is_none());
        let mut trailer = Dictionary::new();
        trailer.set(
            b"ID".to_vec(),
            Object::Array(vec![
                Object::String(b"abc".to_vec(), crate::object::StringFormat::Literal),
                Object::String(b"abc".to_vec(), crate::object::StringFormat::Literal),
            ]),
        );
        document.merge_trailer(trailer);
        let id = document.id().unwrap();
        assert_eq!(id.len(), 2);
        assert_eq!(id[0].as_str().unwrap(), b"abc");
    }

    #[test]
    fn closed_document_rejects_access() {
        let mut document = doc();
        document.close();
        assert!(matches!(document.get_object((1, 0)), Err(Error::DocumentClosed)));
    }
}
