//! The PD (high-level) layer: thin typed views over COS dictionaries (§3.3, §4.5).
//!
//! PD types never own a dictionary exclusively — they borrow (or, for the
//! document root, share ownership of) the `COSDocument` and read/write through
//! to its pool. Nothing here duplicates state the COS layer already owns.

mod annotation;
mod catalog;
mod document;
mod encryption;
mod information;
mod page_tree;
mod rectangle;

pub use annotation::{AnnotationFlags, PDAnnotation};
pub use catalog::PDDocumentCatalog;
pub use document::PDDocument;
pub use encryption::PDEncryptionDictionary;
pub use information::PDDocumentInformation;
pub use page_tree::{PDPage, PDPageNode};
pub use rectangle::PDRectangle;
