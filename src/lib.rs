#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod error;
pub mod header;
pub mod layout;
pub mod mipmap;
pub mod slot;
pub mod store;

/// Longest supported frame, in samples. Always a power of two.
pub const MAX_WAVE_SIZE: usize = 4096;

/// Most frames a single wavetable can hold.
pub const MAX_NUM_FRAMES: usize = 512;

/// Hard cap on the number of mip levels per frame.
pub const MAX_MIP_LEVELS: usize = 16;

/// Width of the fixed-point interpolation kernel. Every i16 frame
/// reserves this many extra samples at every mip level so the kernel can
/// read past either edge without a wraparound branch.
pub const I16_FRAME_PAD: usize = 8;

/// Guard samples mirrored on each side of an i16 frame (half the kernel
/// width).
pub const I16_EDGE_GUARD: usize = I16_FRAME_PAD / 2;

/// Silent frames reserved past the last real frame, so crossfade
/// read-ahead and one-shot decimation never touch uninitialized memory.
pub const SILENT_APPEND_FRAMES: usize = 3;
