//! The page tree (§3.3, §4.5). `PDPageNode`/`PDPage` are lightweight handles —
//! an `ObjectId` plus the operations defined over it — rather than owners of a
//! dictionary, since the tree is recursive and the document already owns every
//! dictionary in its pool.

use crate::dictionary::Dictionary;
use crate::document::COSDocument;
use crate::error::{Error, Result};
use crate::object::{Object, ObjectId};

/// A `/Type /Pages` node: an internal node of the page tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PDPageNode {
    pub id: ObjectId,
}

/// A `/Type /Page` leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PDPage {
    pub id: ObjectId,
}

/// Any entry found in a `/Kids` array: either another intermediate node or a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTreeEntry {
    Node(PDPageNode),
    Leaf(PDPage),
}

fn entry_for(document: &COSDocument, id: ObjectId) -> Result<PageTreeEntry> {
    let dict = document.get_object(id)?.as_dict()?;
    if dict.has_type(b"Page") {
        Ok(PageTreeEntry::Leaf(PDPage { id }))
    } else {
        Ok(PageTreeEntry::Node(PDPageNode { id }))
    }
}

impl PDPageNode {
    pub fn dict<'a>(&self, document: &'a COSDocument) -> Result<&'a Dictionary> {
        document.get_object(self.id)?.as_dict()
    }

    pub fn kids(&self, document: &COSDocument) -> Result<Vec<PageTreeEntry>> {
        let dict = self.dict(document)?;
        let kids = match dict.get(b"Kids") {
            Ok(Object::Array(items)) => items.clone(),
            _ => return Ok(Vec::new()),
        };
        kids.iter()
            .filter_map(|item| item.as_reference().ok())
            .map(|id| entry_for(document, id))
            .collect()
    }

    pub fn count(&self, document: &COSDocument) -> Result<i64> {
        self.dict(document)?.get(b"Count").and_then(Object::as_i64)
    }

    fn set_count(&self, document: &mut COSDocument, count: i64) -> Result<()> {
        document
            .get_object_mut(self.id)?
            .as_dict_mut()?
            .set(b"Count".to_vec(), Object::Integer(count));
        Ok(())
    }

    /// Recursively recompute `/Count` as the number of leaf pages in the
    /// subtree (§4.5, invariant 3 — idempotent).
    pub fn update_count(&self, document: &mut COSDocument) -> Result<i64> {
        let kids = self.kids(document)?;
        let mut total = 0i64;
        for kid in kids {
            total += match kid {
                PageTreeEntry::Leaf(_) => 1,
                PageTreeEntry::Node(node) => node.update_count(document)?,
            };
        }
        self.set_count(document, total)?;
        Ok(total)
    }

    fn kid_ids(&self, document: &COSDocument) -> Result<Vec<ObjectId>> {
        let dict = self.dict(document)?;
        match dict.get(b"Kids") {
            Ok(Object::Array(items)) => Ok(items.iter().filter_map(|item| item.as_reference().ok()).collect()),
            _ => Ok(Vec::new()),
        }
    }

    fn set_kid_ids(&self, document: &mut COSDocument, ids: &[ObjectId]) -> Result<()> {
        let array = ids.iter().map(|id| Object::Reference(*id)).collect();
        document
            .get_object_mut(self.id)?
            .as_dict_mut()?
            .set(b"Kids".to_vec(), Object::Array(array));
        Ok(())
    }

    /// Append `page` as a direct child, set its `/Parent`, and refresh counts.
    pub fn add_page(&self, document: &mut COSDocument, page: PDPage) -> Result<()> {
        let mut kids = self.kid_ids(document)?;
        kids.push(page.id);
        self.set_kid_ids(document, &kids)?;
        document
            .get_object_mut(page.id)?
            .as_dict_mut()?
            .set(b"Parent".to_vec(), Object::Reference(self.id));
        self.update_count(document)?;
        Ok(())
    }

    /// Remove `page` from wherever it is in the subtree and refresh counts.
    /// Returns `true` if the page was found and removed.
    pub fn remove_page(&self, document: &mut COSDocument, page: PDPage) -> Result<bool> {
        let removed = self.remove_recursive(document, page.id)?;
        if removed {
            self.update_count(document)?;
        }
        Ok(removed)
    }

    fn remove_recursive(&self, document: &mut COSDocument, target: ObjectId) -> Result<bool> {
        let kids = self.kid_ids(document)?;
        if kids.contains(&target) {
            let remaining: Vec<ObjectId> = kids.into_iter().filter(|id| *id != target).collect();
            self.set_kid_ids(document, &remaining)?;
            return Ok(true);
        }
        for kid in self.kids(document)? {
            if let PageTreeEntry::Node(node) = kid {
                if node.remove_recursive(document, target)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Total leaf count reachable from this node, without recomputing `/Count`
    /// (used where a read-only count is wanted — §8 invariant 2).
    pub fn leaf_count(&self, document: &COSDocument) -> Result<i64> {
        let mut total = 0i64;
        for kid in self.kids(document)? {
            total += match kid {
                PageTreeEntry::Leaf(_) => 1,
                PageTreeEntry::Node(node) => node.leaf_count(document)?,
            };
        }
        Ok(total)
    }
}

impl PDPage {
    pub fn dict<'a>(&self, document: &'a COSDocument) -> Result<&'a Dictionary> {
        document.get_object(self.id)?.as_dict()
    }

    pub fn rotation(&self, document: &COSDocument) -> Result<i64> {
        match self.dict(document)?.get(b"Rotate") {
            Ok(object) => object.as_i64(),
            Err(_) => Ok(0),
        }
    }

    pub fn parent(&self, document: &COSDocument) -> Result<Option<ObjectId>> {
        match self.dict(document)?.get(b"Parent") {
            Ok(object) => Ok(Some(object.as_reference()?)),
            Err(_) => Ok(None),
        }
    }

    pub fn media_box(&self, document: &COSDocument) -> Result<Option<super::rectangle::PDRectangle>> {
        match self.dict(document)?.get(b"MediaBox") {
            Ok(Object::Array(items)) => Ok(Some(super::rectangle::PDRectangle::from_array(items)?)),
            _ => Ok(None),
        }
    }

    /// Deep-copy this page's dictionary and content stream into `destination`
    /// (§4.5 `importPage`), re-spilling the payload into the destination's own
    /// scratch file, then return the new page ready for `PDPageNode::add_page`.
    pub fn import_into(&self, source: &COSDocument, destination: &mut COSDocument, new_id: ObjectId) -> Result<PDPage> {
        let mut dict = self.dict(source)?.clone();
        dict.remove(b"Parent");

        if let Ok(contents) = dict.get(b"Contents").cloned() {
            let rewritten = match contents {
                Object::Reference(id) => rewrite_content_stream(source, destination, id)?,
                other => other,
            };
            dict.set(b"Contents".to_vec(), rewritten);
        }

        destination.set_object(new_id, Object::Dictionary(dict))?;
        Ok(PDPage { id: new_id })
    }
}

fn rewrite_content_stream(source: &COSDocument, destination: &mut COSDocument, id: ObjectId) -> Result<Object> {
    let object = source.get_object(id).map_err(|_| Error::missing_object(id))?;
    let stream = object.as_stream()?;
    let raw = stream.raw_bytes(source.scratch())?;

    let mut copy = crate::stream::Stream::new(stream.dict.clone());
    copy.set_content(destination.scratch_mut(), &raw)?;
    Ok(Object::Stream(copy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::dictionary::Dictionary;

    fn doc() -> COSDocument {
        COSDocument::new(
            &ParserConfig {
                in_memory_scratch: true,
                ..ParserConfig::default()
            },
            1.7,
            "%PDF-1.7".into(),
        )
        .unwrap()
    }

    fn leaf(document: &mut COSDocument, id: ObjectId) -> PDPage {
        let mut dict = Dictionary::new();
        dict.set(b"Type".to_vec(), Object::Name(b"Page".to_vec()));
        document.set_object(id, Object::Dictionary(dict)).unwrap();
        PDPage { id }
    }

    fn root(document: &mut COSDocument, id: ObjectId) -> PDPageNode {
        let mut dict = Dictionary::new();
        dict.set(b"Type".to_vec(), Object::Name(b"Pages".to_vec()));
        dict.set(b"Kids".to_vec(), Object::Array(Vec::new()));
        dict.set(b"Count".to_vec(), Object::Integer(0));
        document.set_object(id, Object::Dictionary(dict)).unwrap();
        PDPageNode { id }
    }

    #[test]
    fn update_count_is_idempotent_and_counts_leaves() {
        let mut document = doc();
        let tree = root(&mut document, (1, 0));
        let page_a = leaf(&mut document, (2, 0));
        let page_b = leaf(&mut document, (3, 0));
        tree.add_page(&mut document, page_a).unwrap();
        tree.add_page(&mut document, page_b).unwrap();
        assert_eq!(tree.count(&document).unwrap(), 2);
        assert_eq!(tree.update_count(&mut document).unwrap(), 2);
        assert_eq!(tree.count(&document).unwrap(), 2);
    }

    #[test]
    fn add_then_remove_restores_count() {
        let mut document = doc();
        let tree = root(&mut document, (1, 0));
        let page = leaf(&mut document, (2, 0));
        tree.add_page(&mut document, page).unwrap();
        assert_eq!(tree.count(&document).unwrap(), 1);
        let removed = tree.remove_page(&mut document, page).unwrap();
        assert!(removed);
        assert_eq!(tree.count(&document).unwrap(), 0);
    }
}
