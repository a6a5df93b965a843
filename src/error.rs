//! Unified error types for the longan presentation DOM.
//!
//! Every recoverable condition in this crate is a variant of [`Error`].
//! A missing inheritance base is *not* an error: effective-value lookups
//! return `Ok(None)` in that case.
use thiserror::Error;

/// Main error type for longan operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Operation is not valid for this shape variant
    #[error("operation not supported for this shape type: {0}")]
    UnsupportedShapeOperation(&'static str),

    /// Placeholder-only accessor used on a non-placeholder shape
    #[error("shape is not a placeholder")]
    NotAPlaceholder,

    /// Use of a shape or cell value after its node was removed from the tree
    #[error("reference is detached from the document tree; re-fetch it from its collection")]
    DetachedShape,

    /// Table merge attempted across two different tables
    #[error("other cell is from a different table")]
    CrossTable,

    /// Merge range already intersects an existing merge
    #[error("range contains one or more merged cells")]
    OverlappingMerge,

    /// Split called on a cell that is not a merge origin
    #[error("not a merge-origin cell; only a merge-origin cell can be split")]
    NotMergeOrigin,

    /// Collection or grid index out of range
    #[error("{kind} index [{index}] out of range")]
    IndexOutOfRange { kind: &'static str, index: usize },

    /// Shape passed to `index_of` is not a member of the collection
    #[error("shape not found in this collection")]
    NotInCollection,

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Part or relationship not found
    #[error("part not found: {0}")]
    PartNotFound(String),

    /// Invalid or unrecognized data
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

/// Result type for longan operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
