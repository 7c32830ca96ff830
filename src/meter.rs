// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Mikael Lund

//! Level metering engine fed by the audio callback.
//!
//! [`Meter::push_audio`] turns raw per-channel planes into a decibel
//! snapshot and fans it out to registered observers. Processing state and
//! the observer list live behind separate locks so observer churn never
//! stalls the audio path.

use crate::dsp::{self, ChannelTail};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Highest number of channels the meter tracks.
pub const MAX_CHANNELS: usize = 8;

/// Peak estimation algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeakMode {
    /// Maximum absolute sample value.
    #[default]
    SamplePeak,
    /// Peak of the 5x oversampled reconstruction, catching inter-sample
    /// overs that sample peaks miss.
    TruePeak,
}

/// One audio buffer split into per-channel planes.
///
/// Planes beyond the active channel count are `None`; all present planes
/// hold `frames` samples.
pub struct AudioData<'a> {
    pub planes: [Option<&'a [f32]>; MAX_CHANNELS],
    pub frames: usize,
}

impl<'a> AudioData<'a> {
    /// Wraps up to [`MAX_CHANNELS`] planes of equal length.
    pub fn from_planes(planes_in: &'a [Vec<f32>], frames: usize) -> Self {
        let mut planes = [None; MAX_CHANNELS];
        for (slot, plane) in planes.iter_mut().zip(planes_in) {
            *slot = Some(&plane[..frames.min(plane.len())]);
        }
        Self { planes, frames }
    }
}

/// Levels snapshot in decibels, one entry per channel.
#[derive(Clone, Copy, Debug)]
pub struct Levels {
    pub magnitude: [f32; MAX_CHANNELS],
    pub peak: [f32; MAX_CHANNELS],
    /// Pre-fader alias of `peak`, kept for observer compatibility.
    #[allow(dead_code)]
    pub input_peak: [f32; MAX_CHANNELS],
}

/// Observer callback receiving each snapshot.
pub type ObserverFn = Arc<dyn Fn(&Levels) + Send + Sync>;

struct Observer {
    callback: ObserverFn,
    token: u64,
}

struct ProcessState {
    mode: PeakMode,
    tails: [ChannelTail; MAX_CHANNELS],
    magnitude: [f32; MAX_CHANNELS],
    peak: [f32; MAX_CHANNELS],
}

impl ProcessState {
    fn process(&mut self, data: &AudioData) {
        let mut channel = 0;
        for plane in data.planes.iter().flatten() {
            if channel >= MAX_CHANNELS {
                break;
            }
            let samples = &plane[..data.frames.min(plane.len())];
            self.peak[channel] = match self.mode {
                PeakMode::SamplePeak => dsp::sample_peak(&self.tails[channel], samples),
                PeakMode::TruePeak => dsp::true_peak(&self.tails[channel], samples),
            };
            self.magnitude[channel] = dsp::rms(samples);
            self.tails[channel].push(samples);
            channel += 1;
        }
        // Channels without a plane read as silence.
        for ch in channel..MAX_CHANNELS {
            self.magnitude[ch] = 0.0;
            self.peak[ch] = 0.0;
        }
    }
}

/// Converts audio buffers into per-channel magnitude/peak levels and fans
/// the decibel snapshot out to observers.
///
/// `push_audio` must come from a single producer thread at a time; observer
/// registration may happen from any thread. Planes are `&[f32]`, so sample
/// alignment holds by construction and needs no runtime check.
pub struct Meter {
    state: Mutex<ProcessState>,
    observers: Mutex<Vec<Observer>>,
    output_channels: Option<usize>,
}

/// Thread-safe handle shared between the audio and display threads.
pub type SharedMeter = Arc<Meter>;

impl Meter {
    /// Creates a meter with zeroed tails in sample-peak mode.
    pub fn new(output_channels: Option<usize>) -> Self {
        Self {
            state: Mutex::new(ProcessState {
                mode: PeakMode::default(),
                tails: [ChannelTail::default(); MAX_CHANNELS],
                magnitude: [0.0; MAX_CHANNELS],
                peak: [0.0; MAX_CHANNELS],
            }),
            observers: Mutex::new(Vec::new()),
            output_channels,
        }
    }

    /// Selects the peak algorithm, effective from the next buffer.
    pub fn set_peak_mode(&self, mode: PeakMode) {
        if let Ok(mut state) = self.state.lock() {
            state.mode = mode;
        }
    }

    /// Number of channels the display should show. Falls back to stereo
    /// when the output configuration is unknown.
    pub fn channel_count(&self) -> usize {
        self.output_channels.unwrap_or(2)
    }

    /// Analyzes one buffer and notifies observers with the dB snapshot.
    ///
    /// Estimation and tail updates happen under the processing lock; the
    /// fan-out runs afterwards under the observer lock, newest observer
    /// first. An observer removed while a push is in flight may still see
    /// that push's snapshot.
    pub fn push_audio(&self, data: &AudioData) {
        let levels = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            state.process(data);

            let mut magnitude = [0.0f32; MAX_CHANNELS];
            let mut peak = [0.0f32; MAX_CHANNELS];
            for ch in 0..MAX_CHANNELS {
                magnitude[ch] = dsp::mul_to_db(state.magnitude[ch]);
                peak[ch] = dsp::mul_to_db(state.peak[ch]);
            }
            Levels {
                magnitude,
                peak,
                input_peak: peak,
            }
        };

        if let Ok(observers) = self.observers.lock() {
            for observer in observers.iter().rev() {
                (observer.callback)(&levels);
            }
        }
    }

    /// Registers an observer. The same (callback, token) pair may be added
    /// more than once.
    pub fn add_observer(&self, callback: ObserverFn, token: u64) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.push(Observer { callback, token });
        }
    }

    /// Removes at most one observer matching the (callback, token) pair.
    /// Takes effect for pushes after any currently in flight.
    pub fn remove_observer(&self, callback: &ObserverFn, token: u64) {
        if let Ok(mut observers) = self.observers.lock()
            && let Some(pos) = observers
                .iter()
                .position(|o| o.token == token && Arc::ptr_eq(&o.callback, callback))
        {
            observers.remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(meter: &Meter) -> (ObserverFn, Arc<Mutex<Vec<Levels>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ObserverFn = Arc::new(move |levels: &Levels| {
            sink.lock().unwrap().push(*levels);
        });
        meter.add_observer(callback.clone(), 0);
        (callback, seen)
    }

    fn mono(samples: &[f32]) -> AudioData<'_> {
        let mut planes = [None; MAX_CHANNELS];
        planes[0] = Some(samples);
        AudioData {
            planes,
            frames: samples.len(),
        }
    }

    #[test]
    fn square_wave_reports_zero_db() {
        let meter = Meter::new(Some(2));
        let (_cb, seen) = capture(&meter);

        meter.push_audio(&mono(&[1.0, -1.0, 1.0, -1.0]));

        let levels = seen.lock().unwrap()[0];
        assert_eq!(levels.peak[0], 0.0);
        assert_eq!(levels.magnitude[0], 0.0);
        assert_eq!(levels.input_peak[0], levels.peak[0]);
    }

    #[test]
    fn missing_planes_report_silence() {
        let meter = Meter::new(Some(2));
        let (_cb, seen) = capture(&meter);

        meter.push_audio(&mono(&[0.5, 0.5, 0.5, 0.5]));
        meter.push_audio(&mono(&[0.5, 0.5, 0.5, 0.5]));

        for levels in seen.lock().unwrap().iter() {
            assert_eq!(levels.magnitude[1], f32::NEG_INFINITY);
            assert_eq!(levels.peak[1], f32::NEG_INFINITY);
        }
    }

    #[test]
    fn mode_switch_applies_to_next_buffer() {
        const S: f32 = std::f32::consts::FRAC_1_SQRT_2;
        let meter = Meter::new(Some(1));
        let (_cb, seen) = capture(&meter);
        let buf = [S, S, -S, -S, S, S, -S, -S];

        meter.push_audio(&mono(&buf));
        meter.set_peak_mode(PeakMode::TruePeak);
        meter.push_audio(&mono(&buf));

        let seen = seen.lock().unwrap();
        // Sample peak sits about 3 dB down; the reconstruction clips.
        assert!(seen[0].peak[0] < -3.0);
        assert!(seen[1].peak[0] > 0.0);
    }

    #[test]
    fn observers_run_newest_first() {
        let meter = Meter::new(Some(1));
        let order = Arc::new(Mutex::new(Vec::new()));
        for id in 0..3u64 {
            let sink = order.clone();
            let callback: ObserverFn = Arc::new(move |_: &Levels| sink.lock().unwrap().push(id));
            meter.add_observer(callback, id);
        }

        meter.push_audio(&mono(&[0.0; 4]));
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn remove_matches_callback_and_token() {
        let meter = Meter::new(Some(1));
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        let callback: ObserverFn = Arc::new(move |_: &Levels| *sink.lock().unwrap() += 1);
        meter.add_observer(callback.clone(), 1);
        meter.add_observer(callback.clone(), 2);

        meter.remove_observer(&callback, 2);
        meter.push_audio(&mono(&[0.0; 4]));
        assert_eq!(*count.lock().unwrap(), 1);

        meter.remove_observer(&callback, 1);
        meter.push_audio(&mono(&[0.0; 4]));
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn channel_count_defaults_to_stereo() {
        assert_eq!(Meter::new(None).channel_count(), 2);
        assert_eq!(Meter::new(Some(6)).channel_count(), 6);
    }
}
