use iced::color;
use iced::theme::Palette;
use iced::{Color, Theme};

use facelens_core::overlay::overlay_renderer::Tone;

/// Resolve the iced Theme, following the system appearance.
pub fn resolve_theme() -> Theme {
    let palette = if detect_system_dark_mode() {
        dark_palette()
    } else {
        light_palette()
    };
    Theme::custom("FaceLens", palette)
}

fn dark_palette() -> Palette {
    Palette {
        background: color!(0x0f, 0x14, 0x1a),
        text: color!(0xd8, 0xe1, 0xea),
        primary: color!(0x22, 0xd3, 0xee),
        success: color!(0x30, 0xd1, 0x58),
        warning: color!(0xff, 0xcc, 0x00),
        danger: color!(0xff, 0x45, 0x3a),
    }
}

fn light_palette() -> Palette {
    Palette {
        background: color!(0xf5, 0xf5, 0xf7),
        text: color!(0x1d, 0x1d, 0x1f),
        primary: color!(0x08, 0x91, 0xb2),
        success: color!(0x34, 0xc7, 0x59),
        warning: color!(0xff, 0x9f, 0x0a),
        danger: color!(0xff, 0x3b, 0x30),
    }
}

/// Box border and label color for an overlay tone.
pub fn tone_color(theme: &Theme, tone: Tone) -> Color {
    let palette = theme.palette();
    match tone {
        Tone::Success => palette.success,
        Tone::Danger => palette.danger,
    }
}

pub fn muted_color(theme: &Theme) -> Color {
    Color {
        a: 0.7,
        ..theme.palette().text
    }
}

pub fn tertiary_color(theme: &Theme) -> Color {
    Color {
        a: 0.5,
        ..theme.palette().text
    }
}

/// Slightly lifted panel background.
pub fn surface_color(theme: &Theme) -> Color {
    let bg = theme.palette().background;
    let luma = bg.r * 0.299 + bg.g * 0.587 + bg.b * 0.114;
    let shift = if luma > 0.5 { -0.04 } else { 0.06 };
    Color {
        r: (bg.r + shift).clamp(0.0, 1.0),
        g: (bg.g + shift).clamp(0.0, 1.0),
        b: (bg.b + shift).clamp(0.0, 1.0),
        a: 1.0,
    }
}

fn detect_system_dark_mode() -> bool {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
            .map(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .trim()
                    .eq_ignore_ascii_case("dark")
            })
            .unwrap_or(true)
    }
    #[cfg(not(target_os = "macos"))]
    {
        true
    }
}
