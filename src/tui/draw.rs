// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Mikael Lund

//! UI rendering functions.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::meter::PeakMode;

use super::app::{App, Popup};
use super::theme::ColorScheme;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let full_area = frame.area();
    let scheme = app.scheme();

    // Fill background with scheme color
    frame.render_widget(
        Block::default().style(Style::default().bg(scheme.background)),
        full_area,
    );

    let [header_area, main_area, footer_area] = Layout::vertical([
        Constraint::Length(6),
        Constraint::Min(10),
        Constraint::Length(1),
    ])
    .areas(full_area);

    draw_header(frame, header_area, app);
    draw_meters(frame, main_area, app);
    draw_footer(frame, footer_area, app);
    draw_popup(frame, app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let scheme = app.scheme();

    let block = Block::default()
        .title(" Peak Meter ")
        .title_style(Style::default().fg(scheme.title).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(scheme.border_dim));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [info_area, logo_area] =
        Layout::horizontal([Constraint::Min(40), Constraint::Length(20)]).areas(inner);

    frame.render_widget(Paragraph::new(info_lines(app)), info_area);
    frame.render_widget(Paragraph::new(logo_lines(scheme)), logo_area);
}

fn info_lines(app: &App) -> Vec<Line<'static>> {
    let scheme = app.scheme();
    let label = Style::default().fg(scheme.text_secondary);

    let status = if app.paused {
        Span::styled("  [PAUSED]", Style::default().fg(scheme.title).bold())
    } else {
        Span::styled("  [PLAYING]", Style::default().fg(scheme.accent))
    };

    vec![
        Line::from(vec![
            Span::styled("Source:   ", label),
            Span::styled(
                app.source_name.clone(),
                Style::default().fg(scheme.text_primary).bold(),
            ),
            status,
        ]),
        Line::from(vec![
            Span::styled("Peak:     ", label),
            Span::styled(app.mode_label(), Style::default().fg(scheme.accent)),
            Span::styled("   Decay: ", label),
            Span::styled(app.decay_label(), Style::default().fg(scheme.accent)),
        ]),
        Line::from(vec![
            Span::styled("Channels: ", label),
            Span::styled(
                app.channels.to_string(),
                Style::default().fg(scheme.text_primary),
            ),
            Span::styled("   Hold: ", label),
            Span::styled(
                format!("{:.0} s", app.ballistics.peak_hold_duration),
                Style::default().fg(scheme.text_primary),
            ),
            Span::styled("   Theme: ", label),
            Span::styled(scheme.name, Style::default().fg(scheme.text_primary)),
        ]),
    ]
}

/// Small bar-graph wordmark in the header corner.
fn logo_lines(scheme: &ColorScheme) -> Vec<Line<'static>> {
    let g = Style::default().fg(scheme.meter.fg_nominal);
    let y = Style::default().fg(scheme.meter.fg_warning);
    let r = Style::default().fg(scheme.meter.fg_error);

    vec![
        Line::from(vec![Span::raw("          "), Span::styled("▂▂", r)]),
        Line::from(vec![
            Span::raw("    "),
            Span::styled("▄▄ ", g),
            Span::styled("██ ", y),
            Span::styled("██", r),
        ]),
        Line::from(vec![
            Span::styled(" ▃▃ ", g),
            Span::styled("██ ", g),
            Span::styled("██ ", y),
            Span::styled("██", r),
        ]),
        Line::from(vec![Span::styled(" peakwatch", Style::default().fg(scheme.accent))]),
    ]
}

/// Warning and error zone thresholds in dB for the active peak algorithm.
/// True peak headroom is tighter since it already accounts for
/// inter-sample overs.
const fn zone_thresholds(mode: PeakMode) -> (f32, f32) {
    match mode {
        PeakMode::TruePeak => (-13.0, -2.0),
        PeakMode::SamplePeak => (-20.0, -9.0),
    }
}

fn draw_meters(frame: &mut Frame, area: Rect, app: &App) {
    let scheme = app.scheme();
    let palette = &app.palette;

    let block = Block::default()
        .title(" Levels ")
        .title_style(Style::default().fg(scheme.title).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(scheme.border_dim));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height < 2 {
        return;
    }

    let bar_rows = inner.height as usize - 1;
    let min_db = app.ballistics.magnitude_min;
    #[allow(clippy::cast_precision_loss)]
    let step = -min_db / bar_rows as f32;
    let (warning, error) = zone_thresholds(app.peak_mode);

    let mut lines = Vec::with_capacity(bar_rows + 1);
    for row in 0..bar_rows {
        #[allow(clippy::cast_precision_loss)]
        let row_db = -(row as f32) * step;
        let mut spans = vec![scale_label(row_db, step, scheme)];

        for volume in &app.display.volumes[..app.channels] {
            let (bg, fg) = if row_db >= error {
                (palette.bg_error, palette.fg_error)
            } else if row_db >= warning {
                (palette.bg_warning, palette.fg_warning)
            } else {
                (palette.bg_nominal, palette.fg_nominal)
            };

            let magnitude_color = if volume.display_magnitude >= row_db {
                palette.magnitude
            } else {
                bg
            };

            let hold_marker = volume.peak_hold.is_finite()
                && (volume.peak_hold.min(0.0) - row_db).abs() < step / 2.0;
            let peak_color = if volume.render_peak() >= row_db || hold_marker {
                fg
            } else {
                bg
            };

            spans.push(Span::raw(" "));
            spans.push(Span::styled("█", Style::default().fg(magnitude_color)));
            spans.push(Span::styled("██", Style::default().fg(peak_color)));
        }
        lines.push(Line::from(spans));
    }

    let mut labels = vec![Span::raw("    ")];
    for (ch, volume) in app.display.volumes[..app.channels].iter().enumerate() {
        let style = if volume.clip_active() {
            Style::default().fg(palette.fg_error).bold()
        } else {
            Style::default().fg(scheme.text_secondary)
        };
        labels.push(Span::styled(format!(" {:^3}", ch + 1), style));
    }
    lines.push(Line::from(labels));

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Right-aligned dB label on the rows closest to each 10 dB mark.
fn scale_label(row_db: f32, step: f32, scheme: &ColorScheme) -> Span<'static> {
    let nearest = (row_db / 10.0).round() * 10.0;
    if (row_db - nearest).abs() < step / 2.0 {
        #[allow(clippy::cast_possible_truncation)]
        let label = format!("{:>4}", nearest as i32);
        Span::styled(label, Style::default().fg(scheme.text_secondary))
    } else {
        Span::raw("    ")
    }
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let scheme = app.scheme();
    let key = Style::default().fg(scheme.accent).bold();
    let dim = Style::default().fg(scheme.text_secondary);
    let sep = Style::default().fg(scheme.border_dim);

    let spans = vec![
        Span::styled(" SPC", key),
        Span::styled(" Pause ", dim),
        Span::styled("\u{2502} ", sep),
        Span::styled("m", key),
        Span::styled(" Peak mode ", dim),
        Span::styled("\u{2502} ", sep),
        Span::styled("d", key),
        Span::styled(" Decay ", dim),
        Span::styled("\u{2502} ", sep),
        Span::styled("r", key),
        Span::styled(" Reload ", dim),
        Span::styled("\u{2502} ", sep),
        Span::styled("c", key),
        Span::styled(" Color ", dim),
        Span::styled("\u{2502} ", sep),
        Span::styled("q", key),
        Span::styled(" Quit", dim),
    ];

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_popup(frame: &mut Frame, app: &App) {
    let scheme = app.scheme();

    let (title, content, small) = match &app.popup {
        Popup::None => return,
        Popup::Help => (" Help ", help_text(scheme), true),
        Popup::Error(msg) => (" Error ", vec![Line::from(msg.as_str())], false),
    };

    let area = if small {
        centered_rect(45, 40, frame.area())
    } else {
        centered_rect(60, 70, frame.area())
    };

    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(title)
        .title_style(Style::default().fg(scheme.title).bold())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(scheme.border_focus));

    let para = Paragraph::new(content).block(block);
    frame.render_widget(para, area);
}

fn help_text(scheme: &ColorScheme) -> Vec<Line<'static>> {
    let key = Style::default().fg(scheme.accent);
    let hdr = Style::default().fg(scheme.title).bold();

    macro_rules! row {
        ($k:expr, $d:expr) => {
            Line::from(vec![
                Span::styled(format!(" {:<7}", $k), key),
                Span::raw($d),
            ])
        };
    }

    vec![
        Line::from(vec![Span::styled(" Keys", hdr)]),
        row!("SPC", "Play/pause"),
        row!("m", "Peak mode: sample/true/global"),
        row!("d", "Peak decay: fast/medium/slow/global"),
        row!("r", "Reload config file"),
        row!("c", "Color scheme"),
        row!("h/?", "Help"),
        row!("q/Esc", "Quit"),
    ]
}

/// Creates a centered rectangle for popups.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, center, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center);

    center
}
