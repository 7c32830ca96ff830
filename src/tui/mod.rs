// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Mikael Lund

//! Terminal user interface for the level meter.

mod app;
mod draw;
mod input;
pub mod theme;
pub mod widgets;

use app::App;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use draw::draw;
use input::handle_key;
use ratatui::DefaultTerminal;
use std::io::{self, stdout};
use std::time::{Duration, Instant};

use crate::meter::{PeakMode, SharedMeter};
use crate::source::SharedSource;

const TARGET_FPS: u64 = 30;

/// Main entry point for the TUI.
pub fn run_tui(
    source: SharedSource,
    meter: SharedMeter,
    mode_override: Option<PeakMode>,
    decay_preset: Option<usize>,
) -> io::Result<()> {
    stdout().execute(EnterAlternateScreen)?;
    enable_raw_mode()?;

    let terminal = ratatui::init();
    let app = App::new(source, meter, mode_override, decay_preset);
    let result = run_app(terminal, app);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_app(mut terminal: DefaultTerminal, mut app: App) -> io::Result<()> {
    let frame_duration = Duration::from_millis(1000 / TARGET_FPS);
    let mut last_frame = Instant::now();

    loop {
        let frame_start = Instant::now();

        // The smoother gets the measured frame time, not the target, so the
        // ballistics stay consistent when drawing or polling runs long.
        let dt = frame_start.duration_since(last_frame).as_secs_f32();
        last_frame = frame_start;

        app.update(dt);
        terminal.draw(|frame| draw(frame, &mut app))?;

        let elapsed = frame_start.elapsed();
        let timeout = frame_duration.saturating_sub(elapsed);

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(action) = handle_key(&mut app, key.code)
        {
            return action;
        }
    }
}
