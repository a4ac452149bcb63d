use crate::document::COSDocument;
use crate::error::Result;
use crate::object::ObjectId;

use super::page_tree::PDPageNode;

/// A view over the `/Type /Catalog` dictionary (§3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PDDocumentCatalog {
    pub id: ObjectId,
}

impl PDDocumentCatalog {
    pub fn new(id: ObjectId) -> Self {
        PDDocumentCatalog { id }
    }

    pub fn pages(&self, document: &COSDocument) -> Result<PDPageNode> {
        let id = document.get_object(self.id)?.as_dict()?.get(b"Pages")?.as_reference()?;
        Ok(PDPageNode { id })
    }
}
