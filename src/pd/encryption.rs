//! A read-only view over the `/Encrypt` dictionary. No cipher is implemented
//! here — only the hook points a future decryptor would need (§1 Non-goals,
//! §7 `EncryptionRequired`).

use crate::document::COSDocument;
use crate::error::Result;
use crate::object::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PDEncryptionDictionary {
    pub id: ObjectId,
}

impl PDEncryptionDictionary {
    pub fn from_trailer(document: &COSDocument) -> Result<Option<Self>> {
        match document.trailer().get(b"Encrypt") {
            Ok(object) => Ok(Some(PDEncryptionDictionary { id: object.as_reference()? })),
            Err(_) => Ok(None),
        }
    }

    pub fn filter<'a>(&self, document: &'a COSDocument) -> Result<&'a [u8]> {
        document.get_object(self.id)?.as_dict()?.get(b"Filter")?.as_name()
    }

    pub fn version(&self, document: &COSDocument) -> Result<i64> {
        document.get_object(self.id)?.as_dict()?.get(b"V")?.as_i64()
    }

    pub fn revision(&self, document: &COSDocument) -> Result<i64> {
        document.get_object(self.id)?.as_dict()?.get(b"R")?.as_i64()
    }
}
