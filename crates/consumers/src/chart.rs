use std::fmt::Write as _;
use std::io::Write;

use crate::render::{Series, View};

/// Eight block heights, lowest first.
const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// ANSI "clear screen, cursor home".
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const TIME_FORMAT: &str = "%H:%M:%S";

/// Computes (min, max) over finite values with a small padding so flat lines
/// don't collapse. Returns `None` if nothing is finite.
fn y_range(values: &[f64]) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min > max {
        return None;
    }

    // Prevent zero-height range.
    if (max - min).abs() < 1e-9 {
        let pad = if min.abs() < 1e-9 { 1.0 } else { min.abs() * 0.1 };
        min -= pad;
        max += pad;
    }

    let padding = (max - min) * 0.05;
    Some((min - padding, max + padding))
}

/// Render the last `width` values as a one-line Unicode sparkline.
///
/// Non-finite values are drawn as blanks.
pub fn sparkline(values: &[f64], width: usize) -> String {
    let tail = &values[values.len().saturating_sub(width)..];
    let Some((lo, hi)) = y_range(tail) else {
        return " ".repeat(tail.len());
    };
    let top = (LEVELS.len() - 1) as f64;

    tail.iter()
        .map(|&v| {
            if v.is_finite() {
                let idx = ((v - lo) / (hi - lo) * top).round() as usize;
                LEVELS[idx.min(LEVELS.len() - 1)]
            } else {
                ' '
            }
        })
        .collect()
}

/// Terminal chart view: one titled sparkline block per series.
///
/// A frame is assembled in memory and written out in one go on
/// [`present`](View::present), so the sink never shows a half-drawn frame.
pub struct TextChart<W> {
    out: W,
    width: usize,
    ansi: bool,
    frame: String,
}

impl<W: Write + Send + 'static> TextChart<W> {
    /// A chart whose sparklines are at most `width` columns wide.
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width: width.max(1),
            ansi: true,
            frame: String::new(),
        }
    }

    /// Whether to clear the terminal before each frame.
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send + 'static> View for TextChart<W> {
    fn clear(&mut self) {
        self.frame.clear();
    }

    fn draw(&mut self, series: &Series) {
        let values: Vec<f64> = series.points.iter().map(|s| s.value).collect();
        let unit = &series.spec.unit;

        if unit.is_empty() {
            let _ = writeln!(self.frame, "{}", series.title());
        } else {
            let _ = writeln!(self.frame, "{} ({unit})", series.title());
        }
        let _ = writeln!(self.frame, "  {}", sparkline(&values, self.width));

        let shown = &series.points[series.points.len().saturating_sub(self.width)..];
        if let (Some(first), Some(last)) = (shown.first(), shown.last()) {
            let _ = writeln!(
                self.frame,
                "  {} .. {}  last {:.1}{}{}",
                first.timestamp.format(TIME_FORMAT),
                last.timestamp.format(TIME_FORMAT),
                last.value,
                if unit.is_empty() { "" } else { " " },
                unit,
            );
        }
        self.frame.push('\n');
    }

    fn present(&mut self) -> std::io::Result<()> {
        if self.ansi {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        if self.frame.is_empty() {
            self.out.write_all(b"waiting for data...\n")?;
        } else {
            self.out.write_all(self.frame.as_bytes())?;
        }
        self.out.flush()
    }
}
