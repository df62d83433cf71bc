//! Binary wavetable header.
//!
//! A wavetable blob starts with a fixed 12-byte record: a 4-byte tag, a
//! 32-bit frame length, a 16-bit frame count and a 16-bit flag word. All
//! fields are little-endian on disk regardless of host byte order; this
//! module is the only place that normalizes them.

use crate::error::BuildError;

/// Tag every wavetable header must start with.
pub const MAGIC: [u8; 4] = *b"vawt";

/// Serialized size of the header record, in bytes.
pub const HEADER_SIZE: usize = 12;

/// Header flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WtFlags(pub u16);

impl WtFlags {
    /// Frames are a non-looping sampled sound rather than a periodic waveform.
    pub const IS_SAMPLE: u16 = 0x1;
    /// One-shot sample whose tail keeps looping.
    pub const LOOP_SAMPLE: u16 = 0x2;
    /// Payload samples are 16-bit fixed point rather than 32-bit float.
    pub const INT16: u16 = 0x4;
    /// Fixed-point payload is scaled to the full 16-bit range instead of 15-bit.
    pub const INT16_IS_16: u16 = 0x8;
    /// Trailing metadata follows the sample payload.
    pub const HAS_METADATA: u16 = 0x10;

    const KNOWN: u16 = Self::IS_SAMPLE
        | Self::LOOP_SAMPLE
        | Self::INT16
        | Self::INT16_IS_16
        | Self::HAS_METADATA;

    /// Table holds a one-shot sample instead of looping waveform cycles.
    #[inline]
    pub fn is_sample(self) -> bool {
        self.0 & Self::IS_SAMPLE != 0
    }

    /// One-shot sample whose tail loops.
    #[inline]
    pub fn loop_sample(self) -> bool {
        self.0 & Self::LOOP_SAMPLE != 0
    }

    /// Payload is 16-bit fixed point.
    #[inline]
    pub fn int16(self) -> bool {
        self.0 & Self::INT16 != 0
    }

    /// Fixed-point payload uses the full 16-bit scale.
    #[inline]
    pub fn int16_is_16(self) -> bool {
        self.0 & Self::INT16_IS_16 != 0
    }

    /// Metadata follows the sample payload.
    #[inline]
    pub fn has_metadata(self) -> bool {
        self.0 & Self::HAS_METADATA != 0
    }

    /// Any bits outside the known set.
    #[inline]
    pub fn has_unknown_bits(self) -> bool {
        self.0 & !Self::KNOWN != 0
    }
}

/// Decoded wavetable header.
///
/// [`WtHeader::read`] only normalizes byte order; semantic validation
/// (magic tag, frame length limits) happens in
/// [`Wavetable::ingest`](crate::store::Wavetable::ingest) so a failed
/// load can be reported without touching any store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WtHeader {
    /// Header tag; must equal [`MAGIC`] for the blob to be accepted.
    pub tag: [u8; 4],
    /// Samples per frame.
    pub n_samples: u32,
    /// Number of frames in the payload.
    pub n_tables: u16,
    /// Format flag word.
    pub flags: WtFlags,
}

impl WtHeader {
    /// Decode the on-disk record from the start of `bytes`.
    pub fn read(bytes: &[u8]) -> Result<Self, BuildError> {
        if bytes.len() < HEADER_SIZE {
            return Err(BuildError::TruncatedHeader);
        }

        let mut tag = [0; 4];
        tag.copy_from_slice(&bytes[0..4]);

        Ok(Self {
            tag,
            n_samples: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            n_tables: u16::from_le_bytes([bytes[8], bytes[9]]),
            flags: WtFlags(u16::from_le_bytes([bytes[10], bytes[11]])),
        })
    }

    /// Encode back to the on-disk layout. Round-trips [`WtHeader::read`]
    /// exactly, which any serializer re-emitting level-0 frames relies on.
    pub fn write(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.tag);
        bytes[4..8].copy_from_slice(&self.n_samples.to_le_bytes());
        bytes[8..10].copy_from_slice(&self.n_tables.to_le_bytes());
        bytes[10..12].copy_from_slice(&self.flags.0.to_le_bytes());
        bytes
    }
}
