// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Mikael Lund

//! Color schemes and palettes for TUI theming.

use crate::config::GlobalConfig;
use ratatui::style::Color;

/// Meter bar colors: background/foreground per level zone plus the RMS
/// column.
#[derive(Clone, Copy)]
pub struct MeterPalette {
    pub bg_nominal: Color,
    pub bg_warning: Color,
    pub bg_error: Color,
    pub fg_nominal: Color,
    pub fg_warning: Color,
    pub fg_error: Color,
    pub magnitude: Color,
}

/// Complete color scheme for TUI theming.
#[derive(Clone, Copy)]
pub struct ColorScheme {
    pub name: &'static str,
    pub background: Color,
    pub meter: MeterPalette,
    pub accent: Color,
    pub title: Color,
    pub border_focus: Color,
    pub border_dim: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
}

/// Mixer-style zone colors shared by the default schemes.
const MIXER: MeterPalette = MeterPalette {
    bg_nominal: Color::Rgb(0x26, 0x7f, 0x26),
    bg_warning: Color::Rgb(0x7f, 0x7f, 0x26),
    bg_error: Color::Rgb(0x7f, 0x26, 0x26),
    fg_nominal: Color::Rgb(0x4c, 0xff, 0x4c),
    fg_warning: Color::Rgb(0xff, 0xff, 0x4c),
    fg_error: Color::Rgb(0xff, 0x4c, 0x4c),
    magnitude: Color::Rgb(0x00, 0xd8, 0xd8),
};

pub const DEFAULT_SCHEME: usize = 0;

pub const SCHEMES: &[ColorScheme] = &[
    ColorScheme {
        name: "Studio Dark",
        background: Color::Rgb(0x10, 0x10, 0x10),
        meter: MIXER,
        accent: Color::Rgb(0x8b, 0xe9, 0xfd),
        title: Color::Rgb(0x00, 0x88, 0xff),
        border_focus: Color::Rgb(0x8b, 0xe9, 0xfd),
        border_dim: Color::Rgb(0x33, 0x33, 0x33),
        text_primary: Color::Rgb(0xbb, 0xbb, 0xbb),
        text_secondary: Color::Rgb(0x77, 0x77, 0x77),
    },
    ColorScheme {
        name: "Broadcast",
        background: Color::Rgb(0x0a, 0x0a, 0x14),
        meter: MeterPalette {
            magnitude: Color::Rgb(0xf8, 0xf8, 0xf2),
            ..MIXER
        },
        accent: Color::Rgb(0xff, 0xb8, 0x6c),
        title: Color::Rgb(0xf1, 0xfa, 0x8c),
        border_focus: Color::Rgb(0xff, 0xb8, 0x6c),
        border_dim: Color::Rgb(0x2a, 0x2a, 0x3a),
        text_primary: Color::Rgb(0xf8, 0xf8, 0xf2),
        text_secondary: Color::Rgb(0x62, 0x72, 0xa4),
    },
    ColorScheme {
        name: "Monochrome",
        background: Color::Rgb(0x00, 0x00, 0x00),
        meter: MeterPalette {
            bg_nominal: Color::Rgb(0x30, 0x30, 0x30),
            bg_warning: Color::Rgb(0x50, 0x50, 0x50),
            bg_error: Color::Rgb(0x70, 0x70, 0x70),
            fg_nominal: Color::Rgb(0xa0, 0xa0, 0xa0),
            fg_warning: Color::Rgb(0xd0, 0xd0, 0xd0),
            fg_error: Color::Rgb(0xff, 0xff, 0xff),
            magnitude: Color::Rgb(0xe0, 0xe0, 0xe0),
        },
        accent: Color::Rgb(0xff, 0xff, 0xff),
        title: Color::Rgb(0xd0, 0xd0, 0xd0),
        border_focus: Color::Rgb(0xff, 0xff, 0xff),
        border_dim: Color::Rgb(0x30, 0x30, 0x30),
        text_primary: Color::Rgb(0xc0, 0xc0, 0xc0),
        text_secondary: Color::Rgb(0x70, 0x70, 0x70),
    },
];

/// Parses "#RRGGBB" (the '#' is optional) into a terminal color.
pub fn parse_hex(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let n = u32::from_str_radix(hex, 16).ok()?;
    Some(Color::Rgb((n >> 16) as u8, (n >> 8) as u8, n as u8))
}

/// Returns the scheme's meter palette with any configured overrides
/// applied. Unparsable entries keep the scheme color.
pub fn resolve_palette(scheme: &ColorScheme, config: &GlobalConfig) -> MeterPalette {
    let mut palette = scheme.meter;
    if !config.override_colors {
        return palette;
    }

    let slots = [
        (&mut palette.bg_nominal, &config.color_bg_nominal),
        (&mut palette.bg_warning, &config.color_bg_warning),
        (&mut palette.bg_error, &config.color_bg_error),
        (&mut palette.fg_nominal, &config.color_fg_nominal),
        (&mut palette.fg_warning, &config.color_fg_warning),
        (&mut palette.fg_error, &config.color_fg_error),
        (&mut palette.magnitude, &config.color_magnitude),
    ];
    for (slot, value) in slots {
        if let Some(color) = value.as_deref().and_then(parse_hex) {
            *slot = color;
        }
    }
    palette
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! hex_tests {
        ($($name:ident: $input:expr => $expected:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!(parse_hex($input), $expected);
                }
            )*
        };
    }

    hex_tests! {
        hex_with_hash: "#ff8000" => Some(Color::Rgb(0xff, 0x80, 0x00)),
        hex_without_hash: "4cff4c" => Some(Color::Rgb(0x4c, 0xff, 0x4c)),
        hex_with_whitespace: " #000000 " => Some(Color::Rgb(0, 0, 0)),
        hex_too_short: "#fff" => None,
        hex_not_hex: "#gggggg" => None,
    }

    #[test]
    fn overrides_only_apply_when_enabled() {
        let scheme = &SCHEMES[DEFAULT_SCHEME];
        let mut config = GlobalConfig::default();
        config.color_fg_error = Some("#123456".to_string());

        let palette = resolve_palette(scheme, &config);
        assert_eq!(palette.fg_error, scheme.meter.fg_error);

        config.override_colors = true;
        let palette = resolve_palette(scheme, &config);
        assert_eq!(palette.fg_error, Color::Rgb(0x12, 0x34, 0x56));
        // Unset entries keep the scheme color.
        assert_eq!(palette.magnitude, scheme.meter.magnitude);
    }
}
