// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Mikael Lund

//! Keyboard input handling.

use crossterm::event::KeyCode;
use std::io;

use super::app::{App, Popup};

/// Processes key input, returning Some to exit the app.
pub fn handle_key(app: &mut App, key: KeyCode) -> Option<io::Result<()>> {
    // Any key closes an open popup first
    if !matches!(app.popup, Popup::None) {
        app.close_popup();
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => return Some(Ok(())),
        KeyCode::Char(' ') => app.toggle_pause(),
        KeyCode::Char('m') => app.cycle_peak_mode(),
        KeyCode::Char('d') => app.cycle_decay_preset(),
        KeyCode::Char('r') => app.reload_config(),
        KeyCode::Char('c') => app.next_color_scheme(),
        KeyCode::Char('h' | '?') => app.show_help(),
        _ => {}
    }
    None
}
