use crate::resources::ids::{AssetId, FourCC};

/// Failure raised by a resource decoder.
///
/// The manager treats every variant the same way: the partial result is
/// dropped and the asset id lands in the negative cache.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The record ended early or could not be read.
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad magic: expected {expected:#010X}, found {found:#010X}")]
    BadMagic { expected: u32, found: u32 },

    #[error("unsupported {format} version {version:#X}")]
    UnsupportedVersion { format: FourCC, version: u32 },

    /// Structurally invalid data (offsets out of range, broken strings, ...).
    #[error("malformed data: {0}")]
    Malformed(String),
}

/// Error returned by checked operations on the [`ResourceManager`].
///
/// [`ResourceManager`]: crate::resources::manager::ResourceManager
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("resource {0} is not cached")]
    NotCached(AssetId),
}
