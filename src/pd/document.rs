//! `PDDocument` (§3.3, §4.5): the entry point most callers load.

use crate::config::ParserConfig;
use crate::document::COSDocument;
use crate::driver;
use crate::error::{Error, Result};
use crate::writer;

use super::catalog::PDDocumentCatalog;
use super::encryption::PDEncryptionDictionary;
use super::information::PDDocumentInformation;

/// Wraps one `COSDocument`; caches nothing that isn't trivially cheap to
/// recompute, since dictionaries can change underneath a cached view.
pub struct PDDocument {
    document: COSDocument,
}

impl PDDocument {
    /// `PDDocument::load` (§4.5) — invokes the parse driver (§4.1) then wraps
    /// the resulting `COSDocument`.
    pub fn load(config: &ParserConfig, bytes: &[u8]) -> Result<Self> {
        let document = driver::parse(config, bytes)?;
        Ok(PDDocument { document })
    }

    pub fn cos_document(&self) -> &COSDocument {
        &self.document
    }

    pub fn cos_document_mut(&mut self) -> &mut COSDocument {
        &mut self.document
    }

    pub fn is_encrypted(&self) -> bool {
        self.document.is_encrypted()
    }

    pub fn get_document_catalog(&self) -> Result<PDDocumentCatalog> {
        let id = self.document.trailer().get(b"Root")?.as_reference()?;
        Ok(PDDocumentCatalog::new(id))
    }

    pub fn get_document_information(&self) -> Result<PDDocumentInformation> {
        PDDocumentInformation::from_trailer(&self.document)
    }

    pub fn get_encryption_dictionary(&self) -> Result<Option<PDEncryptionDictionary>> {
        if !self.is_encrypted() {
            return Ok(None);
        }
        PDEncryptionDictionary::from_trailer(&self.document)
    }

    pub fn get_number_of_pages(&self) -> Result<i64> {
        if self.is_encrypted() {
            return Err(Error::EncryptionRequired);
        }
        self.get_document_catalog()?.pages(&self.document)?.leaf_count(&self.document)
    }

    /// `PDDocument::save` (§8, property 7): serializes the underlying document
    /// via the minimal structural writer, not a byte-exact round-trip.
    pub fn save(&self) -> Result<Vec<u8>> {
        writer::write_document(&self.document)
    }

    pub fn close(&mut self) {
        self.document.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY_PDF: &[u8] = b"%PDF-1.4\n\
1 0 obj\n<</Type/Catalog/Pages 2 0 R>>\nendobj\n\
2 0 obj\n<</Type/Pages/Kids[3 0 R]/Count 1>>\nendobj\n\
3 0 obj\n<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]>>\nendobj\n\
trailer\n<</Root 1 0 R/Size 4>>\nstartxref\n0\n%%EOF\n";

    #[test]
    fn loads_and_counts_pages() {
        let config = ParserConfig {
            in_memory_scratch: true,
            ..ParserConfig::default()
        };
        let document = PDDocument::load(&config, TINY_PDF).unwrap();
        assert_eq!(document.get_number_of_pages().unwrap(), 1);
        assert!(!document.is_encrypted());
    }

    #[test]
    fn save_then_reload_preserves_page_count() {
        let config = ParserConfig {
            in_memory_scratch: true,
            ..ParserConfig::default()
        };
        let document = PDDocument::load(&config, TINY_PDF).unwrap();
        let bytes = document.save().unwrap();
        let reloaded = PDDocument::load(&config, &bytes).unwrap();
        assert_eq!(reloaded.get_number_of_pages().unwrap(), document.get_number_of_pages().unwrap());
    }
}
