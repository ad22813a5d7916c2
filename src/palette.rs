//! Palette and style configuration for the markup formatter
//!
//! The palette is loaded once at logger creation and shared read-only. It maps
//! each (brightness, channel, hue) triple and each special/format code to the
//! ANSI sequence the formatter substitutes for the corresponding `&` token.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Which side of the cell a color token targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Foreground,
    Background,
}

/// Brightness tier of a color token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brightness {
    Dark,
    Bright,
}

/// The eight hues addressable from markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hue {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

/// Codes that reset or invert the current style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialCode {
    Reset,
    Reverse,
}

/// Text attribute codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCode {
    Bold,
    Italic,
    Under,
    Strike,
}

/// Resolution of a single markup key character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    Channel(Channel),
    Color { hue: Hue, brightness: Brightness },
    Special(SpecialCode),
    Format(FormatCode),
}

/// Resolve a markup key character to its slot in the palette.
///
/// The color keys follow the classic `0-9a-f` scheme: digits are the dark
/// tier, letters the bright tier.
pub fn lookup_code(key: char) -> Option<Code> {
    use Brightness::{Bright, Dark};
    use Hue::*;

    let code = match key {
        '-' => Code::Channel(Channel::Foreground),
        '_' => Code::Channel(Channel::Background),

        '0' => Code::Color { hue: Black, brightness: Dark },
        '8' => Code::Color { hue: Black, brightness: Bright },
        '4' => Code::Color { hue: Red, brightness: Dark },
        'c' => Code::Color { hue: Red, brightness: Bright },
        '2' => Code::Color { hue: Green, brightness: Dark },
        'a' => Code::Color { hue: Green, brightness: Bright },
        '6' => Code::Color { hue: Yellow, brightness: Dark },
        'e' => Code::Color { hue: Yellow, brightness: Bright },
        '1' => Code::Color { hue: Blue, brightness: Dark },
        '9' => Code::Color { hue: Blue, brightness: Bright },
        '5' => Code::Color { hue: Magenta, brightness: Dark },
        'd' => Code::Color { hue: Magenta, brightness: Bright },
        '3' => Code::Color { hue: Cyan, brightness: Dark },
        'b' => Code::Color { hue: Cyan, brightness: Bright },
        '7' => Code::Color { hue: White, brightness: Dark },
        'f' => Code::Color { hue: White, brightness: Bright },

        'r' => Code::Special(SpecialCode::Reset),
        'k' => Code::Special(SpecialCode::Reverse),
        'l' => Code::Format(FormatCode::Bold),
        'o' => Code::Format(FormatCode::Italic),
        'n' => Code::Format(FormatCode::Under),
        'm' => Code::Format(FormatCode::Strike),

        _ => return None,
    };
    Some(code)
}

/// ANSI sequences for the eight hues of one (brightness, channel) pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HueSet {
    pub black: String,
    pub red: String,
    pub green: String,
    pub yellow: String,
    pub blue: String,
    pub magenta: String,
    pub cyan: String,
    pub white: String,
}

impl HueSet {
    fn get(&self, hue: Hue) -> &str {
        match hue {
            Hue::Black => &self.black,
            Hue::Red => &self.red,
            Hue::Green => &self.green,
            Hue::Yellow => &self.yellow,
            Hue::Blue => &self.blue,
            Hue::Magenta => &self.magenta,
            Hue::Cyan => &self.cyan,
            Hue::White => &self.white,
        }
    }

    /// Standard 8-color SGR sequences starting at the given base code
    /// (30 = dark foreground, 40 = dark background, 90/100 = bright tiers).
    fn standard(base: u8) -> Self {
        let seq = |offset: u8| format!("\u{1b}[{}m", base + offset);
        Self {
            black: seq(0),
            red: seq(1),
            green: seq(2),
            yellow: seq(3),
            blue: seq(4),
            magenta: seq(5),
            cyan: seq(6),
            white: seq(7),
        }
    }
}

/// Foreground and background hue tables for one brightness tier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelSet {
    pub fg: HueSet,
    pub bg: HueSet,
}

/// Sequences for the special codes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecialSet {
    pub reset: String,
    pub reverse: String,
}

/// Sequences for the text attribute codes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatSet {
    pub bold: String,
    pub italic: String,
    pub under: String,
    pub strike: String,
}

/// Immutable style table consumed by the markup formatter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Palette {
    pub dark: ChannelSet,
    pub bright: ChannelSet,
    pub special: SpecialSet,
    pub format: FormatSet,
}

impl Palette {
    /// Sequence for a resolvable two-character color token.
    pub fn color(&self, brightness: Brightness, channel: Channel, hue: Hue) -> &str {
        let tier = match brightness {
            Brightness::Dark => &self.dark,
            Brightness::Bright => &self.bright,
        };
        match channel {
            Channel::Foreground => tier.fg.get(hue),
            Channel::Background => tier.bg.get(hue),
        }
    }

    /// Sequence for a special code.
    pub fn special(&self, code: SpecialCode) -> &str {
        match code {
            SpecialCode::Reset => &self.special.reset,
            SpecialCode::Reverse => &self.special.reverse,
        }
    }

    /// Sequence for a text attribute code.
    pub fn text_format(&self, code: FormatCode) -> &str {
        match code {
            FormatCode::Bold => &self.format.bold,
            FormatCode::Italic => &self.format.italic,
            FormatCode::Under => &self.format.under,
            FormatCode::Strike => &self.format.strike,
        }
    }

    /// Load a palette override from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read palette file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse palette file: {}", path.display()))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            dark: ChannelSet {
                fg: HueSet::standard(30),
                bg: HueSet::standard(40),
            },
            bright: ChannelSet {
                fg: HueSet::standard(90),
                bg: HueSet::standard(100),
            },
            special: SpecialSet {
                reset: "\u{1b}[0m".to_string(),
                reverse: "\u{1b}[7m".to_string(),
            },
            format: FormatSet {
                bold: "\u{1b}[1m".to_string(),
                italic: "\u{1b}[3m".to_string(),
                under: "\u{1b}[4m".to_string(),
                strike: "\u{1b}[9m".to_string(),
            },
        }
    }
}
