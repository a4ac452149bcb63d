//! Parser configuration (§10.3). Everything here is a plain struct field, not a
//! global — a process that opens several documents with different scratch-file
//! policies does not fight itself.

use std::path::PathBuf;

/// Options controlling how a document is parsed and where its scratch data lives.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Directory new on-disk scratch files are created in. `None` defers to
    /// `std::env::temp_dir()`.
    pub scratch_dir: Option<PathBuf>,

    /// Keep stream payloads in memory instead of spilling to a temp file. Suitable
    /// for small or embedded documents; defeats the point of the arena pattern for
    /// anything large.
    pub in_memory_scratch: bool,

    /// Dereference object streams (§4.4) across a `rayon` thread pool when the
    /// `rayon` feature is compiled in. Ignored otherwise.
    pub parallel_object_streams: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            scratch_dir: None,
            in_memory_scratch: false,
            parallel_object_streams: cfg!(feature = "rayon"),
        }
    }
}
