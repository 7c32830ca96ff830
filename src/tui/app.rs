// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Mikael Lund

//! Application state and logic.

use crate::config::{self, ConfigInterest};
use crate::meter::{Levels, MAX_CHANNELS, ObserverFn, PeakMode, SharedMeter};
use crate::source::SharedSource;
use std::sync::Arc;

use super::theme::{ColorScheme, DEFAULT_SCHEME, MeterPalette, SCHEMES, resolve_palette};
use super::widgets::{Ballistics, LevelCell, MeterDisplay};

/// Peak decay presets offered in the UI, in dB/s (20 dB over the classic
/// meter fall times).
pub const DECAY_PRESETS: [(&str, f32); 3] = [
    ("Fast", 20.0 / 0.85),
    ("Medium", 20.0 / 1.7),
    ("Slow", 20.0 / 2.333),
];

/// Popup dialog state.
#[derive(Debug, Clone)]
pub enum Popup {
    None,
    Help,
    Error(String),
}

/// TUI application state tying the meter to the display smoother.
pub struct App {
    pub source: SharedSource,
    pub meter: SharedMeter,
    pub display: MeterDisplay,
    pub ballistics: Ballistics,
    pub palette: MeterPalette,
    pub peak_mode: PeakMode,
    pub channels: usize,
    pub paused: bool,
    pub popup: Popup,
    pub color_scheme: usize,
    pub source_name: String,
    cell: LevelCell,
    observer: ObserverFn,
    observer_token: u64,
    /// Per-instance overrides; `None` follows the global configuration.
    mode_override: Option<PeakMode>,
    decay_preset: Option<usize>,
    _config_interest: ConfigInterest,
}

impl App {
    /// Creates the application and registers the level observer on the
    /// meter.
    pub fn new(
        source: SharedSource,
        meter: SharedMeter,
        mode_override: Option<PeakMode>,
        decay_preset: Option<usize>,
    ) -> Self {
        let cell = LevelCell::new();
        let sink = cell.clone();
        let observer: ObserverFn = Arc::new(move |levels: &Levels| sink.store(levels));
        let observer_token = 0;
        meter.add_observer(observer.clone(), observer_token);

        let (paused, source_name) = match source.lock() {
            Ok(s) => (s.is_paused(), s.name().to_string()),
            Err(_) => (false, String::new()),
        };
        let channels = meter.channel_count().min(MAX_CHANNELS);

        let mut app = Self {
            source,
            meter,
            display: MeterDisplay::new(),
            ballistics: Ballistics::default(),
            palette: SCHEMES[DEFAULT_SCHEME].meter,
            peak_mode: PeakMode::default(),
            channels,
            paused,
            popup: Popup::None,
            color_scheme: DEFAULT_SCHEME,
            source_name,
            cell,
            observer,
            observer_token,
            mode_override,
            decay_preset,
            _config_interest: ConfigInterest::acquire(),
        };
        app.apply_settings();
        app.meter.set_peak_mode(app.peak_mode);
        app
    }

    pub fn scheme(&self) -> &'static ColorScheme {
        &SCHEMES[self.color_scheme]
    }

    /// Resolves overrides against the global fallback. Runs every tick; the
    /// global read is a cheap in-memory copy, the file is only touched by
    /// [`App::reload_config`].
    fn apply_settings(&mut self) {
        let global = config::snapshot();

        self.ballistics.peak_decay_rate = match self.decay_preset {
            Some(i) => DECAY_PRESETS[i].1,
            None => global.peak_decay_rate,
        };

        let mode = self.mode_override.unwrap_or(global.peak_meter_type);
        if mode != self.peak_mode {
            self.peak_mode = mode;
            self.meter.set_peak_mode(mode);
        }

        self.palette = resolve_palette(self.scheme(), &global);
    }

    /// Advances the display by `dt` seconds of wall-clock time.
    pub fn update(&mut self, dt: f32) {
        self.apply_settings();
        self.display.tick(&self.cell, &self.ballistics, dt);
        if let Ok(source) = self.source.lock() {
            self.paused = source.is_paused();
        }
    }

    pub fn toggle_pause(&mut self) {
        let poisoned = match self.source.lock() {
            Ok(mut source) => {
                source.toggle_pause();
                self.paused = source.is_paused();
                false
            }
            Err(_) => true,
        };
        if poisoned {
            self.show_error("Audio source lock poisoned".to_string());
        }
    }

    /// Cycles sample peak -> true peak -> follow global.
    pub fn cycle_peak_mode(&mut self) {
        self.mode_override = match self.mode_override {
            Some(PeakMode::SamplePeak) => Some(PeakMode::TruePeak),
            Some(PeakMode::TruePeak) => None,
            None => Some(PeakMode::SamplePeak),
        };
        self.apply_settings();
    }

    /// Cycles through the decay presets, then back to the global default.
    pub fn cycle_decay_preset(&mut self) {
        self.decay_preset = match self.decay_preset {
            None => Some(0),
            Some(i) if i + 1 < DECAY_PRESETS.len() => Some(i + 1),
            Some(_) => None,
        };
        self.apply_settings();
    }

    /// Re-reads the config file so edited defaults reach running meters.
    pub fn reload_config(&mut self) {
        config::refresh();
        self.apply_settings();
    }

    pub fn next_color_scheme(&mut self) {
        self.color_scheme = (self.color_scheme + 1) % SCHEMES.len();
        self.apply_settings();
    }

    pub fn mode_label(&self) -> String {
        let name = match self.peak_mode {
            PeakMode::SamplePeak => "Sample",
            PeakMode::TruePeak => "True",
        };
        if self.mode_override.is_none() {
            format!("{name} (global)")
        } else {
            name.to_string()
        }
    }

    pub fn decay_label(&self) -> String {
        match self.decay_preset {
            Some(i) => DECAY_PRESETS[i].0.to_string(),
            None => format!("{:.1} dB/s (global)", self.ballistics.peak_decay_rate),
        }
    }

    // Popup methods
    pub fn show_help(&mut self) {
        self.popup = Popup::Help;
    }

    pub fn show_error(&mut self, msg: String) {
        self.popup = Popup::Error(msg);
    }

    pub fn close_popup(&mut self) {
        self.popup = Popup::None;
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.meter.remove_observer(&self.observer, self.observer_token);
    }
}
