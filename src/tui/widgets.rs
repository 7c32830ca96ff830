// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Mikael Lund

//! Display smoothing state for the level meter.
//!
//! The audio thread publishes raw dB snapshots into a [`LevelCell`]; once
//! per frame the [`MeterDisplay`] pulls the latest snapshot (or notices it
//! has gone stale) and advances per-channel meter ballistics.

use crate::meter::{Levels, MAX_CHANNELS};
use std::sync::{Arc, Mutex};

/// Targets fall back to silence when no snapshot arrived for this long.
pub const STALE_AGE: f32 = 0.05; // [s]
/// How long the clip indicator stays lit after a full-scale peak.
pub const CLIP_FLASH_DURATION: f32 = 1.0; // [s]

/// Meter ballistics; rates are per second, levels in dB.
#[derive(Clone, Copy, Debug)]
pub struct Ballistics {
    pub magnitude_attack_rate: f32,
    pub magnitude_min: f32,
    pub peak_decay_rate: f32,
    pub peak_hold_duration: f32,
}

impl Default for Ballistics {
    fn default() -> Self {
        Self {
            magnitude_attack_rate: 0.99 / 0.3,
            magnitude_min: -60.0,
            peak_decay_rate: 20.0 / 0.85, // [dB/s]
            peak_hold_duration: 20.0,     // [s]
        }
    }
}

fn clamp_db(x: f32, min: f32, max: f32) -> f32 {
    x.max(min).min(max)
}

/// Animated display state for one channel.
///
/// Magnitude, peak and hold start at negative infinity, the "never updated"
/// sentinel; the first real target snaps instead of ramping from it.
#[derive(Clone, Copy, Debug)]
pub struct ChannelVolume {
    pub display_magnitude: f32,
    pub display_peak: f32,
    pub peak_hold: f32,
    peak_hold_age: f32,
    clip_flash: bool,
    clip_flash_age: f32,
}

impl Default for ChannelVolume {
    fn default() -> Self {
        Self {
            display_magnitude: f32::NEG_INFINITY,
            display_peak: f32::NEG_INFINITY,
            peak_hold: f32::NEG_INFINITY,
            peak_hold_age: 0.0,
            clip_flash: false,
            clip_flash_age: 0.0,
        }
    }
}

impl ChannelVolume {
    /// Moves the magnitude toward `target` at the attack rate, clamped to
    /// the displayable range.
    fn tick_magnitude(&mut self, ballistics: &Ballistics, target: f32, dt: f32) {
        if !self.display_magnitude.is_finite() {
            self.display_magnitude = target;
        } else {
            let attack =
                (target - self.display_magnitude) * dt * ballistics.magnitude_attack_rate;
            self.display_magnitude = clamp_db(
                self.display_magnitude + attack,
                ballistics.magnitude_min,
                0.0,
            );
        }
    }

    /// Snaps the peak upward, decays it linearly otherwise, and maintains
    /// the hold and clip-flash timers.
    fn tick_peak(&mut self, ballistics: &Ballistics, target: f32, dt: f32) {
        if target >= self.display_peak || self.display_peak.is_nan() {
            self.display_peak = target;
        } else {
            let decay = dt * ballistics.peak_decay_rate;
            self.display_peak = clamp_db(self.display_peak - decay, target, 0.0);
        }

        if target >= self.peak_hold
            || !self.peak_hold.is_finite()
            || self.peak_hold_age > ballistics.peak_hold_duration
        {
            self.peak_hold = target;
            self.peak_hold_age = 0.0;
        } else {
            self.peak_hold_age += dt;
        }

        if self.clip_flash {
            if self.clip_flash_age >= CLIP_FLASH_DURATION {
                self.clip_flash = false;
            } else {
                self.clip_flash_age += dt;
            }
        }
        if target >= 0.0 && !self.clip_flash {
            self.clip_flash = true;
            self.clip_flash_age = 0.0;
        }
    }

    /// Peak value to render: pinned to full scale while the clip indicator
    /// is lit.
    pub fn render_peak(&self) -> f32 {
        if self.clip_flash { 0.0 } else { self.display_peak }
    }

    pub const fn clip_active(&self) -> bool {
        self.clip_flash
    }
}

/// Latest raw snapshot crossing from the audio thread to the display.
///
/// The producer overwrites and flags; the consumer takes-and-clears.
/// Neither side computes while holding the lock.
#[derive(Clone, Default)]
pub struct LevelCell(Arc<Mutex<CellState>>);

#[derive(Default)]
struct CellState {
    magnitude: [f32; MAX_CHANNELS],
    peak: [f32; MAX_CHANNELS],
    updated: bool,
}

impl LevelCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Producer side: store the snapshot and mark it fresh.
    pub fn store(&self, levels: &Levels) {
        if let Ok(mut cell) = self.0.lock() {
            cell.magnitude = levels.magnitude;
            cell.peak = levels.peak;
            cell.updated = true;
        }
    }

    /// Consumer side: the snapshot, if one arrived since the last take.
    pub fn take(&self) -> Option<([f32; MAX_CHANNELS], [f32; MAX_CHANNELS])> {
        let Ok(mut cell) = self.0.lock() else {
            return None;
        };
        if !cell.updated {
            return None;
        }
        cell.updated = false;
        Some((cell.magnitude, cell.peak))
    }
}

/// Per-channel smoothing driven once per rendered frame.
pub struct MeterDisplay {
    pub volumes: [ChannelVolume; MAX_CHANNELS],
    magnitude: [f32; MAX_CHANNELS],
    peak: [f32; MAX_CHANNELS],
    age: f32,
}

impl Default for MeterDisplay {
    fn default() -> Self {
        Self {
            volumes: [ChannelVolume::default(); MAX_CHANNELS],
            magnitude: [f32::NEG_INFINITY; MAX_CHANNELS],
            peak: [f32::NEG_INFINITY; MAX_CHANNELS],
            // Stale until the first snapshot arrives.
            age: f32::INFINITY,
        }
    }
}

impl MeterDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances all channels by `dt` seconds against the latest snapshot in
    /// `cell`. When the snapshot goes stale the targets fall back to
    /// silence, so a stalled audio callback reads as a falling meter rather
    /// than a frozen one.
    pub fn tick(&mut self, cell: &LevelCell, ballistics: &Ballistics, dt: f32) {
        match cell.take() {
            Some((magnitude, peak)) => {
                self.magnitude = magnitude;
                self.peak = peak;
                self.age = 0.0;
            }
            None => {
                if self.age >= STALE_AGE {
                    self.magnitude = [f32::NEG_INFINITY; MAX_CHANNELS];
                    self.peak = [f32::NEG_INFINITY; MAX_CHANNELS];
                } else {
                    self.age += dt;
                }
            }
        }

        for ch in 0..MAX_CHANNELS {
            self.volumes[ch].tick_magnitude(ballistics, self.magnitude[ch], dt);
            self.volumes[ch].tick_peak(ballistics, self.peak[ch], dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.1;

    fn ballistics() -> Ballistics {
        Ballistics::default()
    }

    #[test]
    fn first_magnitude_update_snaps() {
        let mut volume = ChannelVolume::default();
        volume.tick_magnitude(&ballistics(), -20.0, DT);
        assert_eq!(volume.display_magnitude, -20.0);
    }

    #[test]
    fn magnitude_ramps_toward_target() {
        let mut volume = ChannelVolume::default();
        volume.tick_magnitude(&ballistics(), -40.0, DT);
        volume.tick_magnitude(&ballistics(), -20.0, DT);
        let expected = -40.0 + 20.0 * DT * (0.99 / 0.3);
        assert!((volume.display_magnitude - expected).abs() < 1e-4);
    }

    #[test]
    fn silence_drops_magnitude_to_the_floor() {
        let mut volume = ChannelVolume::default();
        volume.tick_magnitude(&ballistics(), -20.0, DT);
        volume.tick_magnitude(&ballistics(), f32::NEG_INFINITY, DT);
        assert_eq!(volume.display_magnitude, ballistics().magnitude_min);
    }

    #[test]
    fn peak_snaps_up_and_decays_linearly() {
        let mut volume = ChannelVolume::default();
        volume.tick_peak(&ballistics(), 0.0, DT);
        assert_eq!(volume.display_peak, 0.0);

        volume.tick_peak(&ballistics(), -40.0, DT);
        let expected = -(20.0 / 0.85) * DT;
        assert!((volume.display_peak - expected).abs() < 1e-4);
    }

    #[test]
    fn peak_decay_never_passes_target() {
        let mut volume = ChannelVolume::default();
        volume.tick_peak(&ballistics(), -1.0, DT);
        volume.tick_peak(&ballistics(), -1.5, DT);
        assert_eq!(volume.display_peak, -1.5);
    }

    #[test]
    fn peak_hold_expires_strictly_after_duration() {
        // dt of 1/8 s keeps the age arithmetic exact in f32.
        const DT8: f32 = 0.125;
        let ballistics = Ballistics {
            peak_hold_duration: 0.5,
            ..Ballistics::default()
        };
        let mut volume = ChannelVolume::default();
        volume.tick_peak(&ballistics, -6.0, DT8);
        assert_eq!(volume.peak_hold, -6.0);

        // Held through age == duration; only age > duration releases it.
        for _ in 0..5 {
            volume.tick_peak(&ballistics, -30.0, DT8);
            assert_eq!(volume.peak_hold, -6.0);
        }
        volume.tick_peak(&ballistics, -30.0, DT8);
        assert_eq!(volume.peak_hold, -30.0);
    }

    #[test]
    fn higher_peak_refreshes_hold() {
        let mut volume = ChannelVolume::default();
        volume.tick_peak(&ballistics(), -12.0, DT);
        volume.tick_peak(&ballistics(), -6.0, DT);
        assert_eq!(volume.peak_hold, -6.0);
        volume.tick_peak(&ballistics(), -30.0, DT);
        assert_eq!(volume.peak_hold, -6.0);
    }

    #[test]
    fn clip_flash_triggers_at_full_scale() {
        let mut volume = ChannelVolume::default();
        volume.tick_peak(&ballistics(), 0.0, DT);
        assert!(volume.clip_active());
        assert_eq!(volume.render_peak(), 0.0);
    }

    #[test]
    fn clip_flash_clears_after_duration() {
        const DT8: f32 = 0.125;
        let mut volume = ChannelVolume::default();
        volume.tick_peak(&ballistics(), 0.0, DT8);
        for _ in 0..8 {
            volume.tick_peak(&ballistics(), -20.0, DT8);
            assert!(volume.clip_active());
        }
        volume.tick_peak(&ballistics(), -20.0, DT8);
        assert!(!volume.clip_active());
    }

    #[test]
    fn reclip_during_active_flash_does_not_extend_it() {
        const DT8: f32 = 0.125;
        let mut volume = ChannelVolume::default();
        volume.tick_peak(&ballistics(), 0.0, DT8);
        for _ in 0..4 {
            volume.tick_peak(&ballistics(), -20.0, DT8);
        }
        // Re-clip halfway through; the flash age keeps running.
        volume.tick_peak(&ballistics(), 0.0, DT8);
        for _ in 0..3 {
            volume.tick_peak(&ballistics(), -20.0, DT8);
        }
        assert!(volume.clip_active());
        volume.tick_peak(&ballistics(), -20.0, DT8);
        assert!(!volume.clip_active());
    }

    #[test]
    fn sustained_clip_keeps_flash_armed() {
        let mut volume = ChannelVolume::default();
        for _ in 0..20 {
            volume.tick_peak(&ballistics(), 0.5, 0.125);
            assert!(volume.clip_active());
        }
    }

    #[test]
    fn level_cell_take_clears_updated_flag() {
        let cell = LevelCell::new();
        assert!(cell.take().is_none());

        let magnitude = [0.0; MAX_CHANNELS];
        let peak = [0.0; MAX_CHANNELS];
        cell.store(&Levels {
            magnitude,
            peak,
            input_peak: peak,
        });
        assert!(cell.take().is_some());
        assert!(cell.take().is_none());
    }

    #[test]
    fn display_reads_silence_until_first_snapshot() {
        let cell = LevelCell::new();
        let mut display = MeterDisplay::new();
        display.tick(&cell, &ballistics(), DT);
        assert_eq!(display.volumes[0].display_magnitude, f32::NEG_INFINITY);
        assert_eq!(display.volumes[0].display_peak, f32::NEG_INFINITY);
    }

    #[test]
    fn stale_snapshot_falls_back_to_silence() {
        let cell = LevelCell::new();
        let mut display = MeterDisplay::new();

        let mut magnitude = [f32::NEG_INFINITY; MAX_CHANNELS];
        let mut peak = [f32::NEG_INFINITY; MAX_CHANNELS];
        magnitude[0] = -12.0;
        peak[0] = -6.0;
        cell.store(&Levels {
            magnitude,
            peak,
            input_peak: peak,
        });

        display.tick(&cell, &ballistics(), DT);
        assert_eq!(display.volumes[0].display_magnitude, -12.0);
        assert_eq!(display.volumes[0].display_peak, -6.0);

        // First missed frame only ages the snapshot; the next one is past
        // the threshold and reads as silence.
        display.tick(&cell, &ballistics(), DT);
        assert_eq!(display.volumes[0].display_magnitude, -12.0);

        display.tick(&cell, &ballistics(), DT);
        assert_eq!(
            display.volumes[0].display_magnitude,
            ballistics().magnitude_min
        );
        assert!(display.volumes[0].display_peak < -6.0);
    }
}
