//! Terminal display/input surface.

use owo_colors::{OwoColorize, Style};
use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use watch_core::{DisplaySurface, StyleHint, WatchEntry};

pub struct ConsoleSurface {
    out: Mutex<Box<dyn Write + Send>>,
    color: bool,
}

impl ConsoleSurface {
    /// Colored output on stdout, unless `NO_COLOR` is set.
    pub fn stdout() -> Self {
        let color = std::env::var_os("NO_COLOR").is_none();
        Self::new(Box::new(io::stdout()), color)
    }

    pub fn new(out: Box<dyn Write + Send>, color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            color,
        }
    }

    /// Write a prompt without a trailing newline.
    pub fn prompt(&self, text: &str) {
        self.emit(|out| {
            write!(out, "{} ", text)?;
            out.flush()
        });
    }

    fn emit<F>(&self, f: F)
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = f(&mut **out) {
            tracing::warn!("Console write failed: {}", e);
        }
    }
}

fn style_for(hint: StyleHint) -> Style {
    match hint {
        StyleHint::Plain => Style::new(),
        StyleHint::AboveUpper => Style::new().red().bold(),
        StyleHint::BelowLower => Style::new().green().bold(),
        StyleHint::Success => Style::new().green(),
        StyleHint::Warning => Style::new().yellow(),
        StyleHint::Error => Style::new().red(),
    }
}

/// Marker prepended to alert lines so they stand out without color.
fn marker_for(hint: StyleHint) -> &'static str {
    match hint {
        StyleHint::AboveUpper => "▲ ",
        StyleHint::BelowLower => "▼ ",
        StyleHint::Warning => "! ",
        StyleHint::Error => "✗ ",
        StyleHint::Success => "✓ ",
        StyleHint::Plain => "  ",
    }
}

fn format_bound(bound: Option<f64>) -> String {
    match bound {
        Some(b) if b != 0.0 => format!("{:.2}", b),
        _ => "-".to_string(),
    }
}

impl DisplaySurface for ConsoleSurface {
    fn write_line(&self, text: &str, style: StyleHint) {
        let line = format!("{}{}", marker_for(style), text);
        let color = self.color;
        self.emit(|out| {
            if color {
                writeln!(out, "{}", line.style(style_for(style)))
            } else {
                writeln!(out, "{}", line)
            }
        });
    }

    fn write_table(&self, entries: &[WatchEntry]) {
        self.emit(|out| {
            writeln!(out, "{:<12} {:>12} {:>12}", "Symbol", "Upper", "Lower")?;
            writeln!(out, "{}", "-".repeat(38))?;
            for entry in entries {
                writeln!(
                    out,
                    "{:<12} {:>12} {:>12}",
                    entry.symbol,
                    format_bound(entry.upper_bound),
                    format_bound(entry.lower_bound)
                )?;
            }
            Ok(())
        });
    }
}

/// Line-oriented input paired with the console for prompts.
pub struct ConsoleInput<R: BufRead> {
    reader: R,
}

impl<R: BufRead> ConsoleInput<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read one trimmed line; `None` at end of input.
    pub fn read_text(&mut self, surface: &ConsoleSurface, prompt: &str) -> io::Result<Option<String>> {
        surface.prompt(prompt);
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Read a non-negative number. An empty line means 0 (no threshold);
    /// anything unparsable re-prompts.
    pub fn read_number(&mut self, surface: &ConsoleSurface, prompt: &str) -> io::Result<Option<f64>> {
        loop {
            let Some(text) = self.read_text(surface, prompt)? else {
                return Ok(None);
            };
            if text.is_empty() {
                return Ok(Some(0.0));
            }
            match parse_bound(&text) {
                Some(value) => return Ok(Some(value)),
                None => surface.write_line(
                    &format!("'{}' is not a non-negative number", text),
                    StyleHint::Warning,
                ),
            }
        }
    }
}

pub fn parse_bound(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_parse_bound() {
        assert_eq!(parse_bound("950"), Some(950.0));
        assert_eq!(parse_bound(" 12.5 "), Some(12.5));
        assert_eq!(parse_bound("-1"), None);
        assert_eq!(parse_bound("NaN"), None);
        assert_eq!(parse_bound("abc"), None);
    }

    #[test]
    fn test_alert_lines_are_marked() {
        let buf = SharedBuf::default();
        let surface = ConsoleSurface::new(Box::new(buf.clone()), false);

        surface.write_line("AAA above", StyleHint::AboveUpper);
        surface.write_line("AAA below", StyleHint::BelowLower);
        surface.write_line("AAA normal", StyleHint::Plain);

        let out = buf.contents();
        assert!(out.contains("▲ AAA above"));
        assert!(out.contains("▼ AAA below"));
        assert!(out.contains("  AAA normal"));
    }

    #[test]
    fn test_table_shows_unset_bounds_as_dash() {
        let buf = SharedBuf::default();
        let surface = ConsoleSurface::new(Box::new(buf.clone()), false);

        surface.write_table(&[WatchEntry::new("AAA", Some(100.0), Some(0.0))]);

        let out = buf.contents();
        let row = out.lines().find(|l| l.starts_with("AAA")).unwrap();
        assert!(row.contains("100.00"));
        assert!(row.trim_end().ends_with('-'));
    }

    #[test]
    fn test_read_number_reprompts_then_accepts() {
        let buf = SharedBuf::default();
        let surface = ConsoleSurface::new(Box::new(buf.clone()), false);
        let mut input = ConsoleInput::new(Cursor::new("oops\n-3\n42\n\n"));

        assert_eq!(input.read_number(&surface, "Upper:").unwrap(), Some(42.0));
        assert_eq!(input.read_number(&surface, "Lower:").unwrap(), Some(0.0));
        assert_eq!(input.read_number(&surface, "Lower:").unwrap(), None);
        assert_eq!(buf.contents().matches("not a non-negative number").count(), 2);
    }
}
