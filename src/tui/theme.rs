//! Theme system for the terminal pane
//!
//! Colors are carried in an explicit `Theme` value handed to the widget;
//! there is no global style registry. Pick a preset by name from config, or
//! build one by hand.

use ratatui::style::Color;

/// Colors used by the message pane
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    // Background colors
    pub bg_main: Color,

    // Border colors
    pub border: Color,
    pub border_focused: Color,

    // Text colors
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,

    // Bubble colors
    pub own_bubble: Color,
    pub own_bubble_bg: Color,
    pub other_bubble: Color,
    pub other_bubble_bg: Color,
    pub system_fg: Color,

    // Pane chrome
    pub load_earlier_fg: Color,
    pub typing_fg: Color,
    pub affordance_fg: Color,
    pub affordance_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::catppuccin_mocha()
    }
}

impl Theme {
    /// Catppuccin Mocha theme (default)
    pub fn catppuccin_mocha() -> Self {
        Self {
            bg_main: Color::Rgb(30, 30, 46),

            border: Color::Rgb(49, 50, 68),
            border_focused: Color::Rgb(137, 180, 250),

            text_primary: Color::Rgb(205, 214, 244),
            text_secondary: Color::Rgb(166, 173, 200),
            text_muted: Color::Rgb(108, 112, 134),

            own_bubble: Color::Rgb(137, 180, 250),
            own_bubble_bg: Color::Rgb(35, 40, 60),
            other_bubble: Color::Rgb(166, 227, 161),
            other_bubble_bg: Color::Rgb(35, 50, 45),
            system_fg: Color::Rgb(148, 226, 213),

            load_earlier_fg: Color::Rgb(203, 166, 247),
            typing_fg: Color::Rgb(249, 226, 175),
            affordance_fg: Color::Rgb(30, 30, 46),
            affordance_bg: Color::Rgb(205, 214, 244),
        }
    }

    /// Nord theme
    pub fn nord() -> Self {
        Self {
            bg_main: Color::Rgb(46, 52, 64), // nord0

            border: Color::Rgb(76, 86, 106),           // nord3
            border_focused: Color::Rgb(136, 192, 208), // nord8

            text_primary: Color::Rgb(236, 239, 244),   // nord6
            text_secondary: Color::Rgb(229, 233, 240), // nord5
            text_muted: Color::Rgb(143, 157, 179),     // nord4

            own_bubble: Color::Rgb(129, 161, 193), // nord9
            own_bubble_bg: Color::Rgb(46, 55, 70),
            other_bubble: Color::Rgb(163, 190, 140), // nord14
            other_bubble_bg: Color::Rgb(50, 60, 55),
            system_fg: Color::Rgb(136, 192, 208),

            load_earlier_fg: Color::Rgb(180, 142, 173), // nord15
            typing_fg: Color::Rgb(235, 203, 139),       // nord13
            affordance_fg: Color::Rgb(46, 52, 64),
            affordance_bg: Color::Rgb(236, 239, 244),
        }
    }

    /// Catppuccin Latte, for light terminals
    pub fn catppuccin_latte() -> Self {
        Self {
            bg_main: Color::Rgb(239, 241, 245),

            border: Color::Rgb(204, 208, 218),
            border_focused: Color::Rgb(30, 102, 245),

            text_primary: Color::Rgb(76, 79, 105),
            text_secondary: Color::Rgb(92, 95, 119),
            text_muted: Color::Rgb(140, 143, 161),

            own_bubble: Color::Rgb(30, 102, 245),
            own_bubble_bg: Color::Rgb(220, 228, 248),
            other_bubble: Color::Rgb(64, 160, 43),
            other_bubble_bg: Color::Rgb(222, 240, 220),
            system_fg: Color::Rgb(23, 146, 153),

            load_earlier_fg: Color::Rgb(136, 57, 239),
            typing_fg: Color::Rgb(223, 142, 29),
            affordance_fg: Color::Rgb(239, 241, 245),
            affordance_bg: Color::Rgb(76, 79, 105),
        }
    }

    /// Look up a preset by its config name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace('-', "_").as_str() {
            "catppuccin_mocha" | "mocha" | "dark" => Some(Self::catppuccin_mocha()),
            "catppuccin_latte" | "latte" | "light" => Some(Self::catppuccin_latte()),
            "nord" => Some(Self::nord()),
            _ => None,
        }
    }

    /// Resolve a preset name, falling back to the default with a warning
    pub fn resolve(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!(theme = name, "Unknown theme, using default");
            Self::default()
        })
    }

    /// Parse a `#rrggbb` color
    pub fn parse_color(hex: &str) -> Option<Color> {
        if !hex.starts_with('#') || hex.len() != 7 {
            return None;
        }

        let r = u8::from_str_radix(&hex[1..3], 16).ok()?;
        let g = u8::from_str_radix(&hex[3..5], 16).ok()?;
        let b = u8::from_str_radix(&hex[5..7], 16).ok()?;

        Some(Color::Rgb(r, g, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Theme::from_name("nord"), Some(Theme::nord()));
        assert_eq!(Theme::from_name("Catppuccin-Mocha"), Some(Theme::catppuccin_mocha()));
        assert_eq!(Theme::from_name("light"), Some(Theme::catppuccin_latte()));
        assert_eq!(Theme::from_name("solarized"), None);
    }

    #[test]
    fn test_resolve_falls_back() {
        assert_eq!(Theme::resolve("nope"), Theme::default());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(Theme::parse_color("#89b4fa"), Some(Color::Rgb(137, 180, 250)));
        assert_eq!(Theme::parse_color("89b4fa"), None);
        assert_eq!(Theme::parse_color("#zzzzzz"), None);
    }
}
