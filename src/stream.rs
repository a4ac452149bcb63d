use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::filters;
use crate::scratch::{ScratchFile, ScratchSlice};

/// A COS stream: a dictionary plus a payload handle into the document's scratch
/// file (§3.1, §4.3). The payload itself never lives inside this struct — only a
/// `(offset, length)` descriptor does — so cloning a `Stream` is cheap and does not
/// duplicate the underlying bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    slice: Option<ScratchSlice>,
    /// Byte offset of the payload in the original input, kept only for diagnostics
    /// and for the zero-length-stream re-scan tolerance (§4.2.7 analogue).
    pub start_position: Option<usize>,
}

impl Stream {
    pub fn new(dict: Dictionary) -> Self {
        Stream {
            dict,
            slice: None,
            start_position: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.slice, Some(slice) if slice.length == 0) || self.slice.is_none()
    }

    /// Spill `bytes` into `scratch` and record the resulting slice.
    pub fn set_content(&mut self, scratch: &mut ScratchFile, bytes: &[u8]) -> Result<()> {
        self.slice = Some(scratch.allocate(bytes)?);
        Ok(())
    }

    /// The raw, still-filtered payload bytes, exactly as they appeared in the file.
    pub fn raw_bytes(&self, scratch: &ScratchFile) -> Result<Vec<u8>> {
        match self.slice {
            Some(slice) => scratch.read_at(slice),
            None => Ok(Vec::new()),
        }
    }

    /// The payload with every filter named in `/Filter` applied (§3.1.1). Returns
    /// `UnsupportedFilter` if any named filter is recognized but not implemented
    /// by this design (image/font codecs are out of scope).
    pub fn decoded_bytes(&self, scratch: &ScratchFile) -> Result<Vec<u8>> {
        let raw = self.raw_bytes(scratch)?;
        filters::decode(&self.dict, raw)
    }
}
