//! # Format Primitives
//!
//! Fixed constants of the Tuple-Attribute exchange format and the snapshot
//! format. These are compiled in and immutable at runtime; everything a
//! caller may change lives in [`crate::config::FactConfig`].

/// Header line prefix of the schema section.
pub const SCHEME_HEADER: &str = "SCHEME TUPLE";

/// Header line prefix of the relation section.
pub const TUPLE_HEADER: &str = "FACT TUPLE";

/// Header line prefix of the attribute section.
pub const ATTRIBUTE_HEADER: &str = "FACT ATTRIBUTE";

/// Line comment marker. Everything after it is ignored.
pub const LINE_COMMENT: &str = "//";

/// Block comment opener. May span lines.
pub const BLOCK_COMMENT_START: &str = "/*";

/// Block comment terminator.
pub const BLOCK_COMMENT_END: &str = "*/";

/// Default name of the relation whose tuples declare nodes.
pub const DEFAULT_ENTITY_RELATION: &str = "$INSTANCE";

/// Default attribute carrying the source file a node was declared in.
pub const DEFAULT_FILE_ATTRIBUTE: &str = "filename";

/// Reserved node attribute carrying the display name in TA text.
pub const LABEL_ATTRIBUTE: &str = "label";

/// Magic bytes for the binary snapshot header.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"FBSN";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Maximum snapshot payload accepted before decoding (500 MB).
pub const MAX_SNAPSHOT_SIZE: usize = 500 * 1024 * 1024;

/// Maximum TA file size accepted by the loaders (256 MB).
pub const MAX_TA_FILE_SIZE: u64 = 256 * 1024 * 1024;
