use std::io::{self, Write};

use colored::{Color, ColoredString, Colorize};

/// Severity markers recognized in a line, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityTag {
    Error,
    Warning,
    Info,
}

impl SeverityTag {
    pub const ALL: [SeverityTag; 3] = [SeverityTag::Error, SeverityTag::Warning, SeverityTag::Info];

    pub fn marker(self) -> &'static str {
        match self {
            SeverityTag::Error => "[error]",
            SeverityTag::Warning => "[warning]",
            SeverityTag::Info => "[info]",
        }
    }

    pub fn style(self) -> Style {
        match self {
            SeverityTag::Error => Style::new(Color::Black, Color::Red),
            SeverityTag::Warning => Style::new(Color::Black, Color::Yellow),
            SeverityTag::Info => Style::new(Color::White, Color::Green),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub fg: Color,
    pub bg: Color,
}

impl Style {
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self { fg, bg }
    }

    pub fn paint(&self, text: &str) -> ColoredString {
        text.color(self.fg).on_color(self.bg)
    }
}

/// Ordered (marker, style) pairs. The first marker contained in a line picks
/// its style; lines without any marker get the fallback.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<(String, Style)>,
    fallback: Style,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(
            SeverityTag::ALL
                .iter()
                .map(|tag| (tag.marker().to_string(), tag.style())),
            Style::new(Color::Black, Color::White),
        )
    }
}

impl Palette {
    pub fn new(entries: impl IntoIterator<Item = (String, Style)>, fallback: Style) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            fallback,
        }
    }

    /// Matching is case-sensitive.
    pub fn style_for(&self, line: &str) -> Style {
        self.entries
            .iter()
            .find(|(marker, _)| line.contains(marker.as_str()))
            .map(|(_, style)| *style)
            .unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> Style {
        self.fallback
    }
}

/// Writes each line in the style its palette picks.
pub struct ConsoleSink<W: Write> {
    palette: Palette,
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout(palette: Palette) -> Self {
        Self::new(palette, io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(palette: Palette, out: W) -> Self {
        Self { palette, out }
    }

    pub fn emit(&mut self, line: &str) -> io::Result<()> {
        let style = self.palette.style_for(line);
        writeln!(self.out, "{}", style.paint(line))?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
