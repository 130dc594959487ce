use serde::{Deserialize, Serialize};
use std::fmt;

/// The eight ANSI colors plus the sink's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Color {
    #[default]
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

const PALETTE: [Color; 8] = [
    Color::Black,
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::White,
];

impl Color {
    /// Map an ANSI palette index (0-7) to a color. Anything else is `None`.
    pub fn from_ansi(index: u16) -> Option<Self> {
        PALETTE.get(usize::from(index)).copied()
    }
}

/// Visual attributes of a run of console text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Style {
    pub foreground: Color,
    pub background: Color,
    pub bold: bool,
}

impl Style {
    pub fn fg(foreground: Color) -> Self {
        Self {
            foreground,
            ..Self::default()
        }
    }

    /// Apply one Select Graphic Rendition code. Unsupported codes are ignored.
    pub fn apply_sgr(&mut self, code: u16) {
        match code {
            0 => *self = Style::default(),
            1 => self.bold = true,
            30..=37 => {
                if let Some(color) = Color::from_ansi(code - 30) {
                    self.foreground = color;
                }
            }
            40..=47 => {
                if let Some(color) = Color::from_ansi(code - 40) {
                    self.background = color;
                }
            }
            _ => {}
        }
    }
}

/// A chunk of decoded console text with the style it was written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRun {
    pub text: String,
    pub style: Style,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Terminal result of a single RPC call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Failed(String),
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }
}

/// Severity of a build log line as sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Unknown(i32),
}

impl LogLevel {
    pub fn from_wire(level: i32) -> Self {
        match level {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            other => LogLevel::Unknown(other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Unknown(_) => "UNKNOWN",
        }
    }

    /// Console color conventionally used to render this level.
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Debug => Color::Default,
            LogLevel::Info => Color::Cyan,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
            LogLevel::Unknown(_) => Color::Default,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
