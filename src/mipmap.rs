//! Mip-map builder.
//!
//! Fills mip levels 1.. of an already populated wavetable: each level is
//! the previous one put through a 63-tap half-band low-pass and decimated
//! 2:1, per frame, in both sample representations. The half-band cutoff
//! sits at half Nyquist, which is exactly what keeps a coarse level free
//! of aliasing when the oscillator reads it at high pitch.
//!
//! Boundary handling depends on the table kind. Waveform frames are
//! circular: source indices wrap modulo the source frame length. One-shot
//! frames are slices of one continuous signal, so right-context reads
//! spill into the following frame; the silent frames reserved past the
//! last real one keep those reads in initialized memory.
//!
//! Everything here is pure computation over validated, pre-sized buffers
//! and cannot fail.

use num_traits::Zero;

use crate::layout;
use crate::{I16_EDGE_GUARD, I16_FRAME_PAD};

/// Half-band FIR taps, float path.
const HALF_BAND_FIR: [f32; 63] = [
    -9.637663112e-8,
    -2.216513622e-6,
    -1.200509132e-6,
    1.79627641e-5,
    1.773084477e-5,
    -5.898886593e-5,
    -8.980041457e-5,
    1.233910152e-4,
    2.964516752e-4,
    -1.573183545e-4,
    -7.465034723e-4,
    1.204636671e-18,
    1.525280299e-3,
    6.605535164e-4,
    -2.588451374e-3,
    -2.282966627e-3,
    3.618633142e-3,
    5.384810269e-3,
    -3.885820275e-3,
    -1.036664937e-2,
    2.154163085e-3,
    1.72905419e-2,
    3.383208299e-3,
    -2.569983155e-2,
    -1.536878385e-2,
    3.457865119e-2,
    3.87589559e-2,
    -4.251147807e-2,
    -8.95993337e-2,
    4.802387953e-2,
    3.125254214e-1,
    4.499996006e-1,
    3.125254214e-1,
    4.802387953e-2,
    -8.95993337e-2,
    -4.251147807e-2,
    3.87589559e-2,
    3.457865119e-2,
    -1.536878385e-2,
    -2.569983155e-2,
    3.383208299e-3,
    1.72905419e-2,
    2.154163085e-3,
    -1.036664937e-2,
    -3.885820275e-3,
    5.384810269e-3,
    3.618633142e-3,
    -2.282966627e-3,
    -2.588451374e-3,
    6.605535164e-4,
    1.525280299e-3,
    1.204636671e-18,
    -7.465034723e-4,
    -1.573183545e-4,
    2.964516752e-4,
    1.233910152e-4,
    -8.980041457e-5,
    -5.898886593e-5,
    1.773084477e-5,
    1.79627641e-5,
    -1.200509132e-6,
    -2.216513622e-6,
    -9.637663112e-8,
];

/// The same taps quantized to 16.16 fixed point for the i16 path. The
/// table is padded to 64 entries; the convolution reads the first 63.
const HALF_BAND_FIR_I16: [i32; 64] = [
    1, 33, -8, -48, 31, 72, -74, -92, 143, 95, -240, -66, 364, -14, -505, 168, 642, -416, -748,
    779, 782, -1279, -687, 1951, 375, -2874, 331, 4293, -1957, -7315, 7773, 31275, 31275, 7773,
    -7315, -1957, 4293, 331, -2874, 375, 1951, -687, -1279, 782, 779, -748, -416, 642, 168, -505,
    -14, 364, -66, -240, 95, 143, -92, -74, 72, 31, -48, -8, 33, 1,
];

const FIR_TAPS: usize = 63;
const FIR_CENTER: isize = (FIR_TAPS as isize - 1) / 2;

/// Accumulate/normalize pair of one sample representation for the
/// half-band convolution. The two representations share the decimation
/// loop through this seam instead of duplicating it per type.
pub trait MipKernel {
    /// Stored sample type.
    type Sample: Copy + Zero;
    /// Accumulator wide enough for 63 multiply-adds.
    type Acc: Copy + Zero;

    /// Multiply sample `x` by tap `tap` and add it to the accumulator.
    fn mac(acc: Self::Acc, tap: usize, x: Self::Sample) -> Self::Acc;

    /// Scale the accumulator back to a sample.
    fn finish(acc: Self::Acc) -> Self::Sample;
}

/// Full-precision kernel.
pub enum KernelF32 {}

impl MipKernel for KernelF32 {
    type Sample = f32;
    type Acc = f32;

    #[inline]
    fn mac(acc: f32, tap: usize, x: f32) -> f32 {
        acc + HALF_BAND_FIR[tap] * x
    }

    #[inline]
    fn finish(acc: f32) -> f32 {
        acc
    }
}

/// Fixed-point kernel: integer taps, 64-bit accumulator, shifted back
/// down to 16 bits. Avoids a second floating pass over the whole table.
///
/// The taps sum to roughly 2^17 in absolute value, so a full-scale frame
/// whose sample signs line up with the taps drives the sum past `i32`;
/// the accumulator must be wider than tap product pairs.
pub enum KernelI16 {}

impl MipKernel for KernelI16 {
    type Sample = i16;
    type Acc = i64;

    #[inline]
    fn mac(acc: i64, tap: usize, x: i16) -> i64 {
        acc + HALF_BAND_FIR_I16[tap] as i64 * x as i64
    }

    #[inline]
    fn finish(acc: i64) -> i16 {
        (acc >> 16) as i16
    }
}

/// Copy guard samples from a frame's opposite edges, making it read as a
/// circular buffer under the interpolation kernel. `frame` is the padded
/// i16-layout frame (`lsize` samples starting at [`I16_EDGE_GUARD`]).
/// Coarse levels shorter than the guard copy what they have.
pub(crate) fn install_edge_guard<T: Copy>(frame: &mut [T], lsize: usize) {
    let n = I16_EDGE_GUARD.min(lsize);

    frame.copy_within(I16_EDGE_GUARD..I16_EDGE_GUARD + n, lsize + I16_EDGE_GUARD);
    frame.copy_within(lsize..lsize + n, 0);
}

/// Populate mip levels 1.. for both representations.
///
/// Level 0 of every frame (including the reserved silent ones) must be
/// populated and guard-padded already. `frames_total` counts the silent
/// frames; convolving them too keeps every level of the padding frames
/// guaranteed silent without a separate pass.
pub(crate) fn build(
    table_f32: &mut [f32],
    table_i16: &mut [i16],
    size: usize,
    frames_total: usize,
    one_shot: bool,
) {
    for level in 1..layout::mip_levels(size) {
        build_level::<KernelF32>(table_f32, size, frames_total, level, 0, 0, one_shot);
        build_level::<KernelI16>(
            table_i16,
            size,
            frames_total,
            level,
            I16_FRAME_PAD,
            I16_EDGE_GUARD,
            one_shot,
        );
    }
}

/// Half-band-filter every frame of `level - 1` into `level`, for one
/// representation. `pad`/`guard` describe that representation's frame
/// layout (0/0 for f32).
fn build_level<K: MipKernel>(
    data: &mut [K::Sample],
    size: usize,
    frames_total: usize,
    level: usize,
    pad: usize,
    guard: usize,
    one_shot: bool,
) {
    let psize = size >> (level - 1);
    let lsize = size >> level;
    let src_base = layout::frame_offset(0, size, frames_total, level - 1, pad);
    let src_stride = psize + pad;

    // Levels are laid out coarse-after-fine, so the whole source level
    // sits below the destination level in the buffer.
    let dst_base = layout::frame_offset(0, size, frames_total, level, pad);
    let (src, dst) = data.split_at_mut(dst_base);
    let dst_stride = lsize + pad;

    for s in 0..frames_total {
        let frame = &mut dst[s * dst_stride..s * dst_stride + lsize + pad];

        for (i, out) in frame[guard..guard + lsize].iter_mut().enumerate() {
            let mut acc = K::Acc::zero();

            for tap in 0..FIR_TAPS {
                let rel = (i << 1) as isize + tap as isize - FIR_CENTER;
                let masked = (rel & (psize as isize - 1)) as usize;

                let src_frame = if one_shot {
                    // Truncating division: small negative overhang stays in
                    // this frame (wrapped by the mask), right overhang walks
                    // into the following frames of the continuous signal.
                    let t = s as isize + rel / psize as isize;
                    let t = t.max(0) as usize;
                    if t >= frames_total {
                        continue;
                    }
                    t
                } else {
                    s
                };

                let x = src[src_base + src_frame * src_stride + guard + masked];
                acc = K::mac(acc, tap, x);
            }

            *out = K::finish(acc);
        }

        if pad > 0 {
            install_edge_guard(frame, lsize);
        }
    }
}
