//! Frame layout arithmetic.
//!
//! Frames are stored level-major in one flat buffer per representation:
//! all frames of mip level 0, then all frames of level 1, and so on. The
//! same arithmetic sizes the buffers and locates every frame afterwards,
//! so the two can never disagree. Everything here is total; a frame
//! length of zero simply yields zero and is rejected upstream.

use crate::{I16_EDGE_GUARD, I16_FRAME_PAD, MAX_MIP_LEVELS, SILENT_APPEND_FRAMES};

/// Offset of a frame at a mip level within one representation's buffer.
///
/// `pad` is that representation's per-frame padding: 0 for f32 frames,
/// [`I16_FRAME_PAD`] for i16 frames. `num_frames` must already include
/// the reserved silent frames.
#[inline]
pub fn frame_offset(
    frame: usize,
    size: usize,
    num_frames: usize,
    level: usize,
    pad: usize,
) -> usize {
    let mut index = frame * ((size >> level) + pad);

    for l in 0..level {
        index += num_frames * ((size >> l) + pad);
    }

    index
}

/// Worst-case sample count one representation needs for a
/// `(size, num_frames)` wavetable, every mip level included.
///
/// The frame count is padded by [`SILENT_APPEND_FRAMES`] and each level
/// reserves guard plus interpolation padding per frame, so the result is
/// an upper bound for both representations. Sizing iterates all the way
/// down to single-sample levels even though mip generation stops at two
/// samples; the slack is the headroom that makes the bound safe.
pub fn required_samples(size: usize, num_frames: usize) -> usize {
    let frames = num_frames + SILENT_APPEND_FRAMES;
    let mut total = 0;
    let mut lsize = size;

    while lsize > 0 {
        total += frames * (lsize + I16_EDGE_GUARD + I16_FRAME_PAD);
        lsize >>= 1;
    }

    total
}

/// Number of mip levels for a frame of `size` samples: level 0 at native
/// resolution plus one level per halving down to two samples, capped at
/// [`MAX_MIP_LEVELS`].
pub fn mip_levels(size: usize) -> usize {
    let mut levels = 1;

    while (1 << levels) < size && levels < MAX_MIP_LEVELS {
        levels += 1;
    }

    levels
}
