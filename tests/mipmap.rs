//! Tests for mip-level generation: pyramid shape, guard padding and
//! boundary handling.


use wt_engine::header::{WtFlags, WtHeader, MAGIC};
use wt_engine::store::Wavetable;
use wt_engine::{I16_EDGE_GUARD, I16_FRAME_PAD, SILENT_APPEND_FRAMES};

fn header(n_samples: u32, n_tables: u16, flags: u16) -> WtHeader {
    WtHeader {
        tag: MAGIC,
        n_samples,
        n_tables,
        flags: WtFlags(flags),
    }
}

fn f32_payload(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Deterministic waveform with energy at several harmonics, so guard and
/// boundary bugs cannot hide in a symmetric signal.
fn busy_frames(size: usize, n_frames: usize) -> Vec<f32> {
    let mut samples = Vec::with_capacity(size * n_frames);
    for j in 0..n_frames {
        for k in 0..size {
            let t = k as f32 / size as f32;
            let x = (2.0 * std::f32::consts::PI * t).sin() * 0.5
                + (2.0 * std::f32::consts::PI * 3.0 * t + j as f32).sin() * 0.3
                + (2.0 * std::f32::consts::PI * 7.0 * t).cos() * 0.15;
            samples.push(x);
        }
    }
    samples
}

/// Matches the float half-band taps in the builder; tests recompute
/// reference convolutions with it.
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

#[test]
fn power_of_two_closure() {
    for po2 in 1..=12u32 {
        let size = 1usize << po2;
        let payload = f32_payload(&busy_frames(size, 2));
        let mut wt = Wavetable::new();
        wt.ingest(&header(size as u32, 2, 0), &payload, false).unwrap();

        assert_eq!(wt.mip_levels(), po2 as usize, "size {size}");
        let coarsest = wt.mip_levels() - 1;
        assert_eq!(
            wt.frame_f32(coarsest, 0).unwrap().len(),
            size >> coarsest,
            "size {size}"
        );
        // Halving terminates at two-sample frames.
        assert_eq!(size >> coarsest, 2.min(size), "size {size}");
    }
}

#[test]
fn guard_padding_is_circular() {
    let size = 256;
    let n_frames = 4;
    let payload = f32_payload(&busy_frames(size, n_frames));
    let mut wt = Wavetable::new();
    wt.ingest(&header(size as u32, n_frames as u16, 0), &payload, false)
        .unwrap();

    for level in 0..wt.mip_levels() {
        let lsize = size >> level;
        if lsize < I16_EDGE_GUARD {
            continue;
        }
        for frame in 0..n_frames {
            let f = wt.frame_i16(level, frame).unwrap();
            assert_eq!(f.len(), lsize + I16_FRAME_PAD);

            // Left guard mirrors the frame's tail...
            assert_eq!(
                &f[..I16_EDGE_GUARD],
                &f[lsize..lsize + I16_EDGE_GUARD],
                "level {level} frame {frame}"
            );
            // ...and the right guard mirrors its head.
            assert_eq!(
                &f[lsize + I16_EDGE_GUARD..],
                &f[I16_EDGE_GUARD..2 * I16_EDGE_GUARD],
                "level {level} frame {frame}"
            );
        }
    }
}

#[test]
fn one_shot_decimation_crosses_frames() {
    // A smooth signal split into 4 frames of 64 samples. For a one-shot
    // table, level 1 of frame 2 must match a half-band decimation of the
    // signal treated as contiguous, with frame 3 providing the right
    // context instead of frame 2 wrapping onto itself.
    let size = 64usize;
    let n_frames = 4usize;
    let total = size * n_frames;
    let signal: Vec<f32> = (0..total)
        .map(|n| (2.0 * std::f32::consts::PI * 3.0 * n as f32 / total as f32).sin() * 0.5)
        .collect();

    let mut wt = Wavetable::new();
    wt.ingest(
        &header(size as u32, n_frames as u16, WtFlags::IS_SAMPLE),
        &f32_payload(&signal),
        false,
    )
    .unwrap();

    let lsize = size / 2;
    let level1 = wt.frame_f32(1, 2).unwrap();
    for i in lsize / 2..lsize {
        let mut expected = 0.0f32;
        for (a, tap) in HALF_BAND_FIR.iter().enumerate() {
            let src = 2 * size + 2 * i + a - 31; // contiguous index, frames 2..
            expected += tap * signal.get(src).copied().unwrap_or(0.0);
        }
        let got = level1[i];
        assert!(
            (got - expected).abs() < 1e-5,
            "sample {i}: got {got}, expected {expected}"
        );
    }

    // The fixed-point pyramid is populated for one-shot tables too.
    let level1_i16 = wt.frame_i16(1, 2).unwrap();
    assert!(level1_i16.iter().any(|s| *s != 0));
}

#[test]
fn one_shot_reserves_silent_tail_frames() {
    let size = 1024usize;
    let n_frames = 9usize;
    let payload = f32_payload(&busy_frames(size, n_frames));
    let mut wt = Wavetable::new();
    wt.ingest(
        &header(size as u32, n_frames as u16, WtFlags::IS_SAMPLE),
        &payload,
        true,
    )
    .unwrap();

    assert_eq!(wt.num_frames(), 9);
    assert_eq!(wt.mip_levels(), 10);

    // Three silent frames are addressable past the last real one, at
    // every level and in both representations; nothing beyond them is.
    for level in 0..wt.mip_levels() {
        for frame in n_frames..n_frames + SILENT_APPEND_FRAMES {
            let f = wt.frame_f32(level, frame).unwrap();
            assert!(f.iter().all(|s| *s == 0.0), "level {level} frame {frame}");
            let i = wt.frame_i16(level, frame).unwrap();
            assert!(i.iter().all(|s| *s == 0), "level {level} frame {frame}");
        }
        assert!(wt
            .frame_f32(level, n_frames + SILENT_APPEND_FRAMES)
            .is_none());
    }
}

#[test]
fn dc_survives_the_pyramid() {
    let size = 512usize;
    let payload = f32_payload(&vec![0.25f32; size]);
    let mut wt = Wavetable::new();
    wt.ingest(&header(size as u32, 1, 0), &payload, false).unwrap();

    for level in 0..wt.mip_levels() {
        for s in wt.frame_f32(level, 0).unwrap() {
            assert!((s - 0.25).abs() < 0.25 * 0.03, "level {level}: {s}");
        }
        let lsize = size >> level;
        let i = wt.frame_i16(level, 0).unwrap();
        for s in &i[I16_EDGE_GUARD..I16_EDGE_GUARD + lsize] {
            let got = *s as f32 / 16384.0;
            assert!((got - 0.25).abs() < 0.25 * 0.03, "level {level}: {got}");
        }
    }
}

#[test]
fn sizing_covers_every_write() {
    // The small shapes run inside the initial allocation's headroom; the
    // 4096x8 shape outgrows it, so its buffers are exactly the
    // calculator's output and any out-of-bounds write during ingest or
    // mip generation panics on the slice bounds.
    for (size, n_frames) in [(2usize, 1usize), (8, 5), (64, 1), (256, 5), (4096, 8)] {
        let payload = f32_payload(&busy_frames(size, n_frames));
        for flags in [0, WtFlags::IS_SAMPLE] {
            let mut wt = Wavetable::new();
            wt.ingest(&header(size as u32, n_frames as u16, flags), &payload, false)
                .unwrap();
            assert_eq!(wt.num_frames(), n_frames);
        }
    }
}

#[test]
fn full_scale_fixed_point_frame_decimates() {
    // Worst case for the fixed-point accumulator: a full-scale 16-bit
    // frame whose sample signs line up with the tap signs at one output
    // position, pushing the convolution sum well past 32 bits.
    let size = 64usize;
    let mut samples = vec![i16::MAX; size];
    for (a, tap) in HALF_BAND_FIR.iter().enumerate() {
        // Source index read for output 16 of level 1: (2*16 + a - 31) & 63.
        let k = (32 + a - 31) & (size - 1);
        samples[k] = if *tap >= 0.0 { i16::MAX } else { i16::MIN };
    }

    let payload: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    let mut wt = Wavetable::new();
    wt.ingest(
        &header(size as u32, 1, WtFlags::INT16 | WtFlags::INT16_IS_16),
        &payload,
        false,
    )
    .unwrap();

    // The whole pyramid built; the float path stayed finite.
    for level in 0..wt.mip_levels() {
        assert!(wt.frame_i16(level, 0).is_some());
        assert!(wt.frame_f32(level, 0).unwrap().iter().all(|s| s.is_finite()));
    }
}

#[test]
fn render_mip_chain() {
    simple_logger::SimpleLogger::new().init().ok();

    let size = 256usize;
    let payload: Vec<f32> = (0..size)
        .map(|k| 2.0 * k as f32 / size as f32 - 1.0)
        .collect();
    let mut wt = Wavetable::new();
    wt.ingest(&header(size as u32, 1, 0), &f32_payload(&payload), false)
        .unwrap();

    // A few cycles of each level back to back, as an audible artifact.
    let mut out = Vec::new();
    for level in 0..wt.mip_levels() {
        let frame = wt.frame_f32(level, 0).unwrap();
        for _ in 0..(size / frame.len()).max(1) * 4 {
            out.extend_from_slice(frame);
        }
    }
    wav_writer::write("mipmap/saw_levels.wav", &out, 48000).ok();

    log::info!("rendered {} samples across {} levels", out.len(), wt.mip_levels());
}
