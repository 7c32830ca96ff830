// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Mikael Lund

//! Process-wide fallback configuration.
//!
//! Meters created without explicit overrides follow these values live, so a
//! reload propagates to running meters without recreating them. The file is
//! re-read only on explicit reload events, never polled per frame.

use crate::meter::PeakMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

/// Fallback values and display overrides shared by all meter instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Peak decay rate in dB/s used when no per-instance rate is set.
    pub peak_decay_rate: f32,
    /// Peak algorithm used when no per-instance mode is set.
    pub peak_meter_type: PeakMode,
    /// Replace the scheme's meter colors with the ones below.
    pub override_colors: bool,
    pub color_bg_nominal: Option<String>,
    pub color_bg_warning: Option<String>,
    pub color_bg_error: Option<String>,
    pub color_fg_nominal: Option<String>,
    pub color_fg_warning: Option<String>,
    pub color_fg_error: Option<String>,
    pub color_magnitude: Option<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            peak_decay_rate: 20.0 / 0.85,
            peak_meter_type: PeakMode::SamplePeak,
            override_colors: false,
            color_bg_nominal: None,
            color_bg_warning: None,
            color_bg_error: None,
            color_fg_nominal: None,
            color_fg_warning: None,
            color_fg_error: None,
            color_magnitude: None,
        }
    }
}

static INTEREST: AtomicUsize = AtomicUsize::new(0);

fn cell() -> &'static Mutex<GlobalConfig> {
    static CELL: OnceLock<Mutex<GlobalConfig>> = OnceLock::new();
    CELL.get_or_init(|| Mutex::new(GlobalConfig::default()))
}

/// Keeps the global configuration loaded while at least one holder is alive.
///
/// The first acquire reads the config file; later acquires share the cached
/// cell. Dropping the last interest releases it again.
pub struct ConfigInterest(());

impl ConfigInterest {
    pub fn acquire() -> Self {
        if INTEREST.fetch_add(1, Ordering::SeqCst) == 0 {
            refresh();
        }
        Self(())
    }
}

impl Drop for ConfigInterest {
    fn drop(&mut self) {
        INTEREST.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Re-reads the config file into the shared cell. A no-op while nobody
/// holds an interest.
pub fn refresh() {
    if INTEREST.load(Ordering::SeqCst) == 0 {
        return;
    }
    if let Ok(mut config) = cell().lock() {
        *config = load();
    }
}

/// Copy of the current global configuration.
pub fn snapshot() -> GlobalConfig {
    cell().lock().map(|c| c.clone()).unwrap_or_default()
}

/// Loads config from file, returning defaults if not found or invalid.
fn load() -> GlobalConfig {
    let Some(path) = config_path() else {
        return GlobalConfig::default();
    };
    match fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring invalid config {}: {e}", path.display());
            GlobalConfig::default()
        }),
        Err(_) => GlobalConfig::default(),
    }
}

/// Returns the config file path (~/.config/peakwatch/config.toml).
fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("peakwatch").join("config.toml"))
}
