// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Mikael Lund

use std::f32::consts::TAU;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

const TONE_SAMPLE_RATE: u32 = 44_100;

/// Audio source feeding the output callback: a decoded WAV file or a
/// generated test tone.
pub struct Source {
    kind: SourceKind,
    channels: usize,
    sample_rate: u32,
    paused: bool,
    name: String,
}

enum SourceKind {
    /// Interleaved f32 samples, looped.
    Wave { samples: Vec<f32>, position: usize },
    /// Endless sine wave.
    Tone {
        phase: f32,
        step: f32,
        amplitude: f32,
    },
}

impl Source {
    /// Decodes a WAV file into interleaved f32 samples.
    ///
    /// Accepts mono and stereo files with integer (8 to 32 bit) or 32-bit
    /// float samples.
    pub fn from_wav<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let mut reader = hound::WavReader::open(path).map_err(invalid_data)?;
        let spec = reader.spec();

        if spec.channels == 0 || spec.channels > 2 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported channel count: {}", spec.channels),
            ));
        }

        let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Float, 32) => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(invalid_data)?,
            (hound::SampleFormat::Int, bits @ 8..=32) => {
                let scale = (1i64 << (bits - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()
                    .map_err(invalid_data)?
            }
            (format, bits) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Unsupported sample format: {format:?} {bits} bit"),
                ));
            }
        };

        if samples.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Empty audio stream",
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            kind: SourceKind::Wave {
                samples,
                position: 0,
            },
            channels: spec.channels as usize,
            sample_rate: spec.sample_rate,
            paused: false,
            name,
        })
    }

    /// Sine test tone at the given frequency and dBFS level.
    pub fn tone(frequency: f32, level_db: f32, channels: usize) -> Self {
        Self {
            kind: SourceKind::Tone {
                phase: 0.0,
                step: TAU * frequency / TONE_SAMPLE_RATE as f32,
                amplitude: 10.0f32.powf(level_db / 20.0),
            },
            channels,
            sample_rate: TONE_SAMPLE_RATE,
            paused: false,
            name: format!("{frequency:.0} Hz tone @ {level_db:.1} dBFS"),
        }
    }

    /// Fills an interleaved output buffer, looping file playback.
    ///
    /// Paused sources produce silence, which still flows through the meter
    /// like any other signal.
    pub fn fill(&mut self, buffer: &mut [f32]) {
        if self.paused {
            buffer.fill(0.0);
            return;
        }

        match &mut self.kind {
            SourceKind::Wave { samples, position } => {
                for sample in buffer.iter_mut() {
                    *sample = samples[*position];
                    *position = (*position + 1) % samples.len();
                }
            }
            SourceKind::Tone {
                phase,
                step,
                amplitude,
            } => {
                for frame in buffer.chunks_mut(self.channels) {
                    frame.fill(phase.sin() * *amplitude);
                    *phase = (*phase + *step) % TAU;
                }
            }
        }
    }

    /// Toggles between playing and paused states.
    pub const fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Returns whether playback is currently paused.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    pub const fn channels(&self) -> usize {
        self.channels
    }

    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Human-readable description for the header line.
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn invalid_data(err: hound::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

/// Thread-safe handle for sharing the source between audio and UI threads.
pub type SharedSource = Arc<Mutex<Source>>;

/// Wraps a source for thread-safe sharing.
pub fn create_shared_source(source: Source) -> SharedSource {
    Arc::new(Mutex::new(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_amplitude_matches_level() {
        let mut source = Source::tone(1000.0, -20.0, 1);
        let mut buffer = vec![0.0f32; 4096];
        source.fill(&mut buffer);
        let peak = buffer.iter().fold(0.0f32, |r, &x| r.max(x.abs()));
        assert!((peak - 0.1).abs() < 1e-3, "peak {peak}");
    }

    #[test]
    fn stereo_tone_duplicates_channels() {
        let mut source = Source::tone(440.0, -6.0, 2);
        let mut buffer = vec![0.0f32; 512];
        source.fill(&mut buffer);
        for frame in buffer.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn paused_source_is_silent() {
        let mut source = Source::tone(440.0, 0.0, 1);
        source.toggle_pause();
        let mut buffer = vec![1.0f32; 64];
        source.fill(&mut buffer);
        assert!(buffer.iter().all(|&x| x == 0.0));
    }
}
