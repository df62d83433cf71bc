//! Build error taxonomy.

use thiserror::Error;

/// Errors reported by [`Wavetable::ingest`](crate::store::Wavetable::ingest).
///
/// All of these are non-fatal: a failed build leaves the store exactly as
/// it was, so a previously loaded table keeps playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The header's 4-byte tag does not match [`MAGIC`](crate::header::MAGIC).
    #[error("header tag does not match \"vawt\"")]
    BadMagic,

    /// Fewer bytes than a full header record.
    #[error("blob is shorter than the {0}-byte header", crate::header::HEADER_SIZE)]
    TruncatedHeader,

    /// The header declares no sample data, or the payload holds none.
    #[error("wavetable payload is empty")]
    EmptyPayload,

    /// The header flag word carries bits this engine does not know.
    #[error("unsupported sample format (flags {0:#06x})")]
    UnsupportedFormat(u16),

    /// Frame length exceeds [`MAX_WAVE_SIZE`](crate::MAX_WAVE_SIZE).
    #[error("frame length {size} exceeds the {}-sample limit", crate::MAX_WAVE_SIZE)]
    FrameTooLarge {
        /// Declared frame length.
        size: usize,
    },

    /// Frame length is not a power of two.
    #[error("frame length {size} is not a power of two")]
    NonPowerOfTwoSize {
        /// Declared frame length.
        size: usize,
    },

    /// A backing buffer could not be grown.
    #[error("out of memory while growing wavetable storage")]
    OutOfMemory,
}
