// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Mikael Lund

//! Peak and magnitude estimation over streaming audio buffers.

/// Number of samples carried between buffers per channel.
pub const TAIL_LEN: usize = 4;

/// Samples are folded into the running peak four at a time.
const GROUP: usize = 4;

/// Normalized-sinc weights for 5x oversampling via Whittaker-Shannon
/// interpolation. The window samples sit at x = -1.5, -0.5, +0.5, +1.5 and
/// each row reconstructs one of the four points at x = -0.3, -0.1, +0.1,
/// +0.3 between the two center samples. The values encode the interpolation
/// kernel; keep them exactly as they are.
const SINC_WEIGHTS: [[f32; 4]; 4] = [
    [-0.103943, 0.233872, 0.935489, -0.155915],
    [-0.189207, 0.504551, 0.756827, -0.216236],
    [-0.216236, 0.756827, 0.504551, -0.189207],
    [-0.155915, 0.935489, 0.233872, -0.103943],
];

/// Last four samples of the previous buffer for one channel.
///
/// Seeds the interpolation window and the running peak so that peaks
/// spanning a buffer boundary are not missed. Starts at zero; silence flows
/// through as a zero tail, which cannot bias the estimate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelTail {
    samples: [f32; TAIL_LEN],
}

impl ChannelTail {
    /// Shifts in the last `min(4, N)` samples of `buffer`, keeping the
    /// newest retained samples when fewer than four arrive.
    pub fn push(&mut self, buffer: &[f32]) {
        let tail = &mut self.samples;
        match buffer.len() {
            0 => {}
            1 => {
                tail.copy_within(1.., 0);
                tail[3] = buffer[0];
            }
            2 => {
                tail.copy_within(2.., 0);
                tail[2..].copy_from_slice(buffer);
            }
            3 => {
                tail[0] = tail[3];
                tail[1..].copy_from_slice(buffer);
            }
            n => tail.copy_from_slice(&buffer[n - TAIL_LEN..]),
        }
    }
}

/// Maximum absolute sample value over complete groups of four, seeded from
/// the carried tail.
///
/// Trailing samples short of a full group are skipped here; they reach the
/// next call through the tail. The four-lane grouping matches a 4-wide SIMD
/// layout and has no effect on the result.
pub fn sample_peak(tail: &ChannelTail, samples: &[f32]) -> f32 {
    let mut peak = tail.samples;
    for group in samples.chunks_exact(GROUP) {
        for (lane, &x) in peak.iter_mut().zip(group) {
            *lane = lane.max(x.abs());
        }
    }
    hmax(peak)
}

/// Peak of the 5x oversampled reconstruction of the signal.
///
/// For every complete group of four new samples the four-sample window
/// slides one sample at a time (starting from the carried tail) and four
/// interpolated values are produced per position with [`SINC_WEIGHTS`]. The
/// result covers the original samples and all interpolated points, so it
/// never reads below [`sample_peak`] for the same input.
pub fn true_peak(tail: &ChannelTail, samples: &[f32]) -> f32 {
    let mut work = tail.samples;
    let mut peak = tail.samples;
    for group in samples.chunks_exact(GROUP) {
        for (lane, &x) in peak.iter_mut().zip(group) {
            *lane = lane.max(x.abs());
        }
        for &sample in group {
            work.copy_within(1.., 0);
            work[3] = sample;
            for (lane, weights) in peak.iter_mut().zip(&SINC_WEIGHTS) {
                *lane = lane.max(dot4(&work, weights).abs());
            }
        }
    }
    hmax(peak)
}

/// Root mean square of one buffer. Stateless across calls; an empty buffer
/// reads as silence rather than NaN.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|x| x * x).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Converts a linear level to decibels. Zero and negative inputs map to
/// negative infinity, never NaN.
pub fn mul_to_db(mul: f32) -> f32 {
    if mul > 0.0 {
        20.0 * mul.log10()
    } else {
        f32::NEG_INFINITY
    }
}

fn dot4(v: &[f32; 4], w: &[f32; 4]) -> f32 {
    v[0] * w[0] + v[1] * w[1] + v[2] * w[2] + v[3] * w[3]
}

fn hmax(lanes: [f32; 4]) -> f32 {
    lanes.into_iter().fold(f32::NEG_INFINITY, f32::max)
}
