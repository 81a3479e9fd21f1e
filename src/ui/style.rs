//! Colors for the terminal chrome and the editor's syntax highlighting.
//!
//! Everything is derived from the current [`Theme`] on every frame, so a
//! theme toggle restyles the whole UI without any cached state.

use ratatui::style::{Color, Modifier, Style};

use crate::highlight::TokenKind;
use crate::theme::Theme;

/// Resolved colors for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub bar_bg: Color,
    pub bar_fg: Color,
    pub gutter: Color,
    pub cursor_bg: Color,
    pub cursor_fg: Color,
    pub selection_bg: Color,
    pub error: Color,
    pub keyword: Color,
    pub arrow: Color,
    pub string: Color,
    pub comment: Color,
    pub label: Color,
}

#[allow(clippy::cast_possible_truncation)]
const fn hex(rgb: u32) -> Color {
    Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

const DARK: Palette = Palette {
    background: hex(0x11_18_27),
    text: hex(0xf9_fa_fb),
    muted: hex(0x9c_a3_af),
    border: hex(0x4b_55_63),
    accent: hex(0x3b_82_f6),
    bar_bg: hex(0x1f_29_37),
    bar_fg: hex(0xe5_e7_eb),
    gutter: hex(0x6b_72_80),
    cursor_bg: hex(0xf9_fa_fb),
    cursor_fg: hex(0x11_18_27),
    selection_bg: hex(0x37_41_51),
    error: hex(0xf8_71_71),
    keyword: hex(0xc0_84_fc),
    arrow: hex(0x60_a5_fa),
    string: hex(0x86_ef_ac),
    comment: hex(0x6b_72_80),
    label: hex(0xfb_bf_24),
};

const LIGHT: Palette = Palette {
    background: hex(0xff_ff_ff),
    text: hex(0x1f_29_37),
    muted: hex(0x6b_72_80),
    border: hex(0xd1_d5_db),
    accent: hex(0x25_63_eb),
    bar_bg: hex(0xf3_f4_f6),
    bar_fg: hex(0x1f_29_37),
    gutter: hex(0x9c_a3_af),
    cursor_bg: hex(0x1f_29_37),
    cursor_fg: hex(0xff_ff_ff),
    selection_bg: hex(0xdb_ea_fe),
    error: hex(0xdc_26_26),
    keyword: hex(0x7c_3a_ed),
    arrow: hex(0x25_63_eb),
    string: hex(0x15_80_3d),
    comment: hex(0x9c_a3_af),
    label: hex(0xb4_53_09),
};

pub const fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => DARK,
        Theme::Light => LIGHT,
    }
}

impl Palette {
    /// Base style for pane contents.
    pub fn base(&self) -> Style {
        Style::default().bg(self.background).fg(self.text)
    }

    pub fn bar(&self) -> Style {
        Style::default().bg(self.bar_bg).fg(self.bar_fg)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused { self.accent } else { self.border })
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn cursor(&self) -> Style {
        Style::default().bg(self.cursor_bg).fg(self.cursor_fg)
    }

    /// Style for a highlighted token of Mermaid source.
    pub fn token(&self, kind: TokenKind) -> Style {
        let base = self.base();
        match kind {
            TokenKind::Keyword => base.fg(self.keyword).add_modifier(Modifier::BOLD),
            TokenKind::Arrow => base.fg(self.arrow),
            TokenKind::String => base.fg(self.string),
            TokenKind::Comment => base.fg(self.comment).add_modifier(Modifier::ITALIC),
            TokenKind::Label => base.fg(self.label),
            TokenKind::Text => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palettes_differ_per_theme() {
        assert_ne!(palette(Theme::Dark), palette(Theme::Light));
        assert_eq!(palette(Theme::Dark).bar_bg, Color::Rgb(0x1f, 0x29, 0x37));
        assert_eq!(palette(Theme::Light).background, Color::Rgb(0xff, 0xff, 0xff));
    }

    #[test]
    fn test_keywords_are_bold() {
        let style = palette(Theme::Light).token(TokenKind::Keyword);
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(style.fg, Some(LIGHT.keyword));
    }
}
