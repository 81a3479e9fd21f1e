//! Dark/light display mode.
//!
//! The theme affects both the terminal chrome and the style variables handed
//! to the diagram renderer, so a toggle restyles the UI and forces a
//! re-render of the preview.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::render::{RenderOptions, ThemeVariables};

/// Font stack passed to the renderer for every theme.
pub const DIAGRAM_FONT_FAMILY: &str = "system-ui, -apple-system, sans-serif";

/// Process-wide display mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub const fn from_dark(dark: bool) -> Self {
        if dark { Self::Dark } else { Self::Light }
    }

    pub const fn is_dark(self) -> bool {
        matches!(self, Self::Dark)
    }

    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Preference value as persisted (`"light"` or `"dark"`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Backend theme name for this mode.
    pub const fn renderer_theme_name(self) -> &'static str {
        match self {
            Self::Light => "default",
            Self::Dark => "dark",
        }
    }

    /// Style variables applied to the renderer for this mode.
    pub fn style_variables(self) -> ThemeVariables {
        let dark = self.is_dark();
        let pick = |d: &str, l: &str| if dark { d } else { l }.to_string();
        ThemeVariables {
            dark_mode: dark,
            primary_color: pick("#3b82f6", "#2563eb"),
            primary_text_color: pick("#f9fafb", "#1f2937"),
            primary_border_color: pick("#4b5563", "#d1d5db"),
            line_color: pick("#6b7280", "#374151"),
            secondary_color: pick("#374151", "#f3f4f6"),
            tertiary_color: pick("#1f2937", "#ffffff"),
            background: pick("#1f2937", "#ffffff"),
            main_bkg: pick("#374151", "#f9fafb"),
            second_bkg: pick("#4b5563", "#f3f4f6"),
            font_family: DIAGRAM_FONT_FAMILY.to_string(),
        }
    }

    /// Full set of render options for this mode.
    pub fn render_options(self) -> RenderOptions {
        RenderOptions {
            theme_name: self.renderer_theme_name().to_string(),
            style_variables: self.style_variables(),
        }
    }

    /// Opaque background painted behind rasterized exports.
    pub const fn export_background(self) -> [u8; 3] {
        match self {
            Self::Light => [0xff, 0xff, 0xff],
            Self::Dark => [0x1f, 0x29, 0x37],
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the theme used at startup.
///
/// An explicit light/dark request wins, then the stored preference, then the
/// ambient color scheme. `ambient` is only consulted when needed because the
/// terminal query is slow.
pub fn resolve_startup_theme(
    explicit: Option<Theme>,
    stored: Option<Theme>,
    ambient: impl FnOnce() -> Option<Theme>,
) -> Theme {
    explicit
        .or(stored)
        .or_else(ambient)
        .unwrap_or_default()
}

/// Detect the terminal's color scheme.
///
/// `COLORFGBG` is cheap and checked first; otherwise the terminal is asked
/// for its background color.
pub fn detect_ambient() -> Option<Theme> {
    if let Some(theme) = theme_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref()) {
        return Some(theme);
    }
    let _raw = crossterm::terminal::enable_raw_mode();
    let reply = query_terminal_background();
    let _ = crossterm::terminal::disable_raw_mode();
    reply.ok().flatten().map(|(r, g, b)| theme_from_rgb(r, g, b))
}

/// Classify `COLORFGBG` (`"fg;bg"` or `"fg;default;bg"`) by its background index.
pub fn theme_from_colorfgbg(value: Option<&str>) -> Option<Theme> {
    let bg = value?.rsplit(';').next()?.trim().parse::<u8>().ok()?;
    // Indices 7 and 9..=15 are the light ANSI colors.
    Some(Theme::from_dark(!(bg == 7 || (9..=15).contains(&bg))))
}

/// Classify an RGB background by perceived brightness.
pub fn theme_from_rgb(r: u8, g: u8, b: u8) -> Theme {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    Theme::from_dark(luma < 140.0)
}

#[cfg(not(unix))]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    Ok(None)
}

// OSC 11 goes to /dev/tty so the terminal answers even when stdout is piped.
#[cfg(unix)]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    use std::io::{Read, Write};
    use std::sync::mpsc;

    let mut tty = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/tty")?;
    let mut reader = tty.try_clone()?;
    tty.write_all(b"\x1b]11;?\x07")?;
    tty.flush()?;

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = [0u8; 128];
        let mut reply = Vec::new();
        while let Ok(n) = reader.read(&mut buf) {
            if n == 0 {
                break;
            }
            reply.extend_from_slice(&buf[..n]);
            if reply.contains(&0x07) || reply.windows(2).any(|w| w == b"\x1b\\") {
                let _ = tx.send(reply);
                break;
            }
        }
    });

    Ok(rx
        .recv_timeout(Duration::from_millis(75))
        .ok()
        .and_then(|bytes| parse_osc11_reply(&String::from_utf8_lossy(&bytes))))
}

/// Parse `ESC ] 11 ; rgb:RRRR/GGGG/BBBB` (BEL or ST terminated).
pub fn parse_osc11_reply(reply: &str) -> Option<(u8, u8, u8)> {
    let data = &reply[reply.find("rgb:")? + 4..];
    let mut channels = data
        .split(['/', '\x07', '\x1b'])
        .map(parse_osc_channel);
    Some((channels.next()??, channels.next()??, channels.next()??))
}

fn parse_osc_channel(hex: &str) -> Option<u8> {
    let hex = hex.trim();
    match hex.len() {
        2 => u8::from_str_radix(hex, 16).ok(),
        n if n >= 4 => u16::from_str_radix(hex.get(..4)?, 16)
            .ok()
            .map(|v| v.to_be_bytes()[0]),
        _ => None,
    }
}
