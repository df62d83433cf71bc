//! Wavetable storage.
//!
//! A [`Wavetable`] owns two flat backing buffers, one per sample
//! representation, holding every frame at every mip level in the
//! level-major layout computed by [`layout`]. Frame views are derived
//! from `(level, frame)` on every access instead of being stored, so no
//! caller can hold a view across a rebuild.
//!
//! [`Wavetable::ingest`] is the single build entry point: it validates a
//! decoded header, grows the buffers if needed, populates level 0 in both
//! representations, and hands off to the mip-map builder. It either
//! completes or leaves the previous table untouched.

use alloc::vec::Vec;

use log::{debug, warn};

use crate::error::BuildError;
use crate::header::{WtFlags, WtHeader, MAGIC};
use crate::layout;
use crate::mipmap;
use crate::{I16_EDGE_GUARD, I16_FRAME_PAD, MAX_NUM_FRAMES, MAX_WAVE_SIZE, SILENT_APPEND_FRAMES};

/// Fixed-point full scale of the 15-bit sample encoding.
const I15_SCALE: f32 = 16384.0;
/// Fixed-point full scale of the 16-bit sample encoding.
const I16_SCALE: f32 = 32768.0;

/// Multi-resolution wavetable in dual sample representations.
///
/// The store carries no synchronization of its own; see
/// [`slot`](crate::slot) for the lock discipline between a loader thread
/// and the audio thread.
#[derive(Debug, Clone)]
pub struct Wavetable {
    table_f32: Vec<f32>,
    table_i16: Vec<i16>,

    size: usize,
    size_po2: u32,
    num_frames: usize,
    flags: WtFlags,
    dt: f32,
    ever_built: bool,
}

impl Wavetable {
    /// Create an empty store, with room for one maximal frame's pyramid
    /// so small first loads never reallocate.
    pub fn new() -> Self {
        let capacity = layout::required_samples(MAX_WAVE_SIZE, 1);
        let mut table_f32 = Vec::new();
        let mut table_i16 = Vec::new();
        table_f32.resize(capacity, 0.0);
        table_i16.resize(capacity, 0);

        Self {
            table_f32,
            table_i16,
            size: 0,
            size_po2: 0,
            num_frames: 0,
            flags: WtFlags::default(),
            dt: 0.0,
            ever_built: false,
        }
    }

    /// Frame length at mip level 0, in samples. Zero until the first
    /// successful build.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.size
    }

    /// Base-2 exponent of the frame length.
    #[inline]
    pub fn frame_size_po2(&self) -> u32 {
        self.size_po2
    }

    /// Number of real frames. Zero until the first successful build; an
    /// oscillator must not read a store reporting zero frames.
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Phase increment covering one sample of a level-0 frame.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Flag word of the last successful build.
    #[inline]
    pub fn flags(&self) -> WtFlags {
        self.flags
    }

    /// Whether any build has ever completed.
    #[inline]
    pub fn is_built(&self) -> bool {
        self.ever_built
    }

    /// Number of mip levels per frame.
    pub fn mip_levels(&self) -> usize {
        if self.ever_built {
            layout::mip_levels(self.size)
        } else {
            0
        }
    }

    /// Addressable frames: the real ones plus the reserved silent ones
    /// read by crossfade look-ahead.
    #[inline]
    fn frames_total(&self) -> usize {
        if self.ever_built {
            self.num_frames + SILENT_APPEND_FRAMES
        } else {
            0
        }
    }

    #[inline]
    fn readable(&self, level: usize, frame: usize) -> bool {
        level < self.mip_levels() && frame < self.frames_total()
    }

    /// Full-precision samples of one frame at one mip level, length
    /// `frame_size() >> level`. The silent frames past the last real one
    /// are addressable; anything else out of range returns `None`.
    pub fn frame_f32(&self, level: usize, frame: usize) -> Option<&[f32]> {
        if !self.readable(level, frame) {
            return None;
        }

        let offset = layout::frame_offset(frame, self.size, self.frames_total(), level, 0);
        Some(&self.table_f32[offset..offset + (self.size >> level)])
    }

    /// Fixed-point samples of one frame at one mip level, guard padding
    /// included: the slice holds `frame_size() >> level` samples starting
    /// at [`I16_EDGE_GUARD`], with mirrored guard samples on both sides,
    /// so an interpolation kernel may read the whole slice without
    /// wrapping.
    pub fn frame_i16(&self, level: usize, frame: usize) -> Option<&[i16]> {
        if !self.readable(level, frame) {
            return None;
        }

        let offset =
            layout::frame_offset(frame, self.size, self.frames_total(), level, I16_FRAME_PAD);
        Some(&self.table_i16[offset..offset + (self.size >> level) + I16_FRAME_PAD])
    }

    /// Grow both backing buffers to at least `required` samples, zeroed.
    /// Capacity never shrinks, so repeated loads of same-sized tables
    /// never churn the allocator. Nothing is replaced unless both
    /// allocations succeed.
    fn ensure_capacity(&mut self, required: usize) -> Result<(), BuildError> {
        if self.table_f32.len() >= required && self.table_i16.len() >= required {
            return Ok(());
        }

        let mut table_f32 = Vec::new();
        table_f32
            .try_reserve_exact(required)
            .map_err(|_| BuildError::OutOfMemory)?;
        let mut table_i16 = Vec::new();
        table_i16
            .try_reserve_exact(required)
            .map_err(|_| BuildError::OutOfMemory)?;

        table_f32.resize(required, 0.0);
        table_i16.resize(required, 0);
        self.table_f32 = table_f32;
        self.table_i16 = table_i16;

        Ok(())
    }

    /// Build the whole table from a decoded header and raw payload.
    ///
    /// Validates the header, grows capacity, decodes level 0 into both
    /// representations, zero-fills the reserved silent frames, installs
    /// the level-0 edge guards and generates every mip level. On success
    /// the store is fully readable; on error it is byte-for-byte what it
    /// was before the call.
    ///
    /// `one_shot` forces sample semantics for payloads whose container
    /// implied them without setting [`WtFlags::IS_SAMPLE`]; the flag
    /// alone is also honored. A payload shorter than
    /// `n_samples * n_tables` is read as if zero-padded, which matches
    /// how truncated files have historically been treated.
    pub fn ingest(
        &mut self,
        header: &WtHeader,
        payload: &[u8],
        one_shot: bool,
    ) -> Result<(), BuildError> {
        if header.tag != MAGIC {
            return Err(BuildError::BadMagic);
        }

        let flags = header.flags;
        if flags.has_unknown_bits() {
            return Err(BuildError::UnsupportedFormat(flags.0));
        }

        let size = header.n_samples as usize;
        if size == 0 || payload.is_empty() {
            return Err(BuildError::EmptyPayload);
        }
        if size > MAX_WAVE_SIZE {
            return Err(BuildError::FrameTooLarge { size });
        }
        if !size.is_power_of_two() {
            return Err(BuildError::NonPowerOfTwoSize { size });
        }

        let mut num_frames = header.n_tables as usize;
        if num_frames > MAX_NUM_FRAMES {
            warn!(
                "clamping wavetable from {} to {} frames",
                num_frames, MAX_NUM_FRAMES
            );
            num_frames = MAX_NUM_FRAMES;
        }

        self.ensure_capacity(layout::required_samples(size, num_frames))?;

        // Validation and sizing are done; nothing below can fail.
        let one_shot = one_shot || flags.is_sample();
        let frames_total = num_frames + SILENT_APPEND_FRAMES;

        for frame in 0..frames_total {
            let f32_offset = layout::frame_offset(frame, size, frames_total, 0, 0);
            let i16_offset = layout::frame_offset(frame, size, frames_total, 0, I16_FRAME_PAD);
            let frame_f32 = &mut self.table_f32[f32_offset..f32_offset + size];
            let frame_i16 = &mut self.table_i16[i16_offset..i16_offset + size + I16_FRAME_PAD];

            if frame >= num_frames {
                // Reserved silent frame; also clears leftovers from a
                // larger previous build.
                frame_f32.fill(0.0);
                frame_i16.fill(0);
                continue;
            }

            let base = frame * size;
            if flags.int16() {
                for k in 0..size {
                    let v = payload_i16(payload, base + k);
                    frame_i16[I16_EDGE_GUARD + k] = v;
                    frame_f32[k] = if flags.int16_is_16() {
                        i16_to_f32(v)
                    } else {
                        i15_to_f32(v)
                    };
                }
            } else {
                for k in 0..size {
                    let v = payload_f32(payload, base + k);
                    frame_f32[k] = v;
                    frame_i16[I16_EDGE_GUARD + k] = f32_to_i15(v);
                }
            }

            // Mip generation assumes level 0 is already circular.
            mipmap::install_edge_guard(frame_i16, size);
        }

        mipmap::build(
            &mut self.table_f32,
            &mut self.table_i16,
            size,
            frames_total,
            one_shot,
        );

        self.size = size;
        self.size_po2 = size.trailing_zeros();
        self.num_frames = num_frames;
        self.flags = flags;
        self.dt = 1.0 / size as f32;
        self.ever_built = true;

        debug!(
            "built wavetable: {} frames of {} samples, {} mip levels{}",
            num_frames,
            size,
            layout::mip_levels(size),
            if one_shot { ", one-shot" } else { "" }
        );

        Ok(())
    }

    /// Deep-copy another store, for clipboard/undo duplication. Grows
    /// capacity if needed; frame views are derived from the copied
    /// metadata, so nothing can alias `other`'s memory.
    pub fn copy_from(&mut self, other: &Wavetable) -> Result<(), BuildError> {
        self.ensure_capacity(other.table_f32.len())?;

        self.table_f32[..other.table_f32.len()].copy_from_slice(&other.table_f32);
        self.table_i16[..other.table_i16.len()].copy_from_slice(&other.table_i16);

        self.size = other.size;
        self.size_po2 = other.size_po2;
        self.num_frames = other.num_frames;
        self.flags = other.flags;
        self.dt = other.dt;
        self.ever_built = other.ever_built;

        Ok(())
    }
}

impl Default for Wavetable {
    fn default() -> Self {
        Self::new()
    }
}

/// Little-endian sample `index` of an i16 payload; reads past the end
/// are silence.
#[inline]
fn payload_i16(payload: &[u8], index: usize) -> i16 {
    match payload.get(index * 2..index * 2 + 2) {
        Some(b) => i16::from_le_bytes([b[0], b[1]]),
        None => 0,
    }
}

/// Little-endian sample `index` of an f32 payload; reads past the end
/// are silence.
#[inline]
fn payload_f32(payload: &[u8], index: usize) -> f32 {
    match payload.get(index * 4..index * 4 + 4) {
        Some(b) => f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        None => 0.0,
    }
}

#[inline]
fn i15_to_f32(x: i16) -> f32 {
    x as f32 * (1.0 / I15_SCALE)
}

#[inline]
fn i16_to_f32(x: i16) -> f32 {
    x as f32 * (1.0 / I16_SCALE)
}

#[inline]
fn f32_to_i15(x: f32) -> i16 {
    ((x * I15_SCALE) as i32).clamp(-16384, 16383) as i16
}
