// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Mikael Lund

mod config;
mod dsp;
mod meter;
mod source;
mod tui;

use clap::Parser;
use meter::{AudioData, Levels, Meter, ObserverFn, PeakMode, SharedMeter};
use source::{SharedSource, Source, create_shared_source};
use std::path::PathBuf;
use std::sync::Arc;
use tinyaudio::prelude::*;
use tui::widgets::LevelCell;

#[derive(Parser)]
#[command(name = "peakwatch")]
#[command(about = "A terminal loudness and true-peak meter")]
struct Args {
    /// WAV file to play and meter (default: built-in test tone)
    wav_file: Option<PathBuf>,

    /// Peak algorithm: sample or true (default: from global config)
    #[arg(short = 'p', long)]
    peak_mode: Option<String>,

    /// Peak decay preset: fast, medium or slow (default: from global config)
    #[arg(short, long)]
    decay: Option<String>,

    /// Test tone frequency in Hz
    #[arg(long, default_value_t = 440.0)]
    tone_freq: f32,

    /// Test tone level in dBFS (0 exercises the clip indicator)
    #[arg(long, default_value_t = -6.0, allow_hyphen_values = true)]
    tone_level: f32,

    /// Disable TUI and print levels as text
    #[arg(long)]
    no_tui: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mode_override = match args.peak_mode.as_deref() {
        None => None,
        Some("sample") => Some(PeakMode::SamplePeak),
        Some("true") => Some(PeakMode::TruePeak),
        Some(other) => {
            eprintln!("Error: Unknown peak mode '{other}' (expected 'sample' or 'true')");
            std::process::exit(1);
        }
    };

    let decay_preset = match args.decay.as_deref() {
        None => None,
        Some("fast") => Some(0),
        Some("medium") => Some(1),
        Some("slow") => Some(2),
        Some(other) => {
            eprintln!("Error: Unknown decay preset '{other}' (expected 'fast', 'medium' or 'slow')");
            std::process::exit(1);
        }
    };

    let source = match &args.wav_file {
        Some(path) => Source::from_wav(path)?,
        None => Source::tone(args.tone_freq, args.tone_level, 2),
    };

    let channels = source.channels();
    let sample_rate = source.sample_rate();
    let frames_per_buffer = (sample_rate / 100).max(64) as usize; // ~10 ms

    let meter = Arc::new(Meter::new(Some(channels)));
    let source = create_shared_source(source);

    let params = OutputDeviceParameters {
        channels_count: channels,
        sample_rate: sample_rate as usize,
        channel_sample_count: frames_per_buffer,
    };

    // Audio callback runs in a separate thread: fill the interleaved
    // output, split it into per-channel planes, and feed the meter.
    let _device = run_output_device(params, {
        let source = source.clone();
        let meter = meter.clone();
        let mut planes = vec![vec![0.0f32; frames_per_buffer]; channels];
        move |data| {
            if let Ok(mut s) = source.lock() {
                s.fill(data);
            }
            let frames = data.len() / channels;
            for (ch, plane) in planes.iter_mut().enumerate() {
                plane.resize(frames, 0.0);
                for (frame, sample) in plane.iter_mut().enumerate() {
                    *sample = data[frame * channels + ch];
                }
            }
            meter.push_audio(&AudioData::from_planes(&planes, frames));
        }
    })?;

    if args.no_tui {
        let _config = config::ConfigInterest::acquire();
        let mode = mode_override.unwrap_or_else(|| config::snapshot().peak_meter_type);
        meter.set_peak_mode(mode);
        run_simple(&source, &meter)
    } else {
        tui::run_tui(source, meter, mode_override, decay_preset)?;
        Ok(())
    }
}

fn run_simple(source: &SharedSource, meter: &SharedMeter) -> Result<(), Box<dyn std::error::Error>> {
    if let Ok(s) = source.lock() {
        println!("Source:   {}", s.name());
        println!("Channels: {}", s.channels());
        println!("Rate:     {} Hz", s.sample_rate());
    }
    println!("Press Ctrl+C to stop");

    let cell = LevelCell::new();
    let sink = cell.clone();
    let observer: ObserverFn = Arc::new(move |levels: &Levels| sink.store(levels));
    meter.add_observer(observer, 0);

    let channels = meter.channel_count();
    loop {
        std::thread::sleep(std::time::Duration::from_millis(500));
        if let Some((magnitude, peak)) = cell.take() {
            let mut line = String::new();
            for ch in 0..channels {
                line.push_str(&format!(
                    "  ch{}: rms {:>9} peak {:>9}",
                    ch + 1,
                    format_db(magnitude[ch]),
                    format_db(peak[ch])
                ));
            }
            println!("{line}");
        }
    }
}

fn format_db(db: f32) -> String {
    if db.is_finite() {
        format!("{db:.1} dB")
    } else {
        "-inf".to_string()
    }
}
