use crate::quake::{BandCounts, MagnitudeBand};

/// Legend panel content: one line per band plus any feed notices
#[derive(Clone, Debug)]
pub struct Legend {
    lines: Vec<(MagnitudeBand, String)>,
    skipped: usize,
    pub visible: bool,
}

impl Legend {
    /// Starts empty; filled once the event feed completes
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            skipped: 0,
            visible: true,
        }
    }

    /// Replace the band lines with the given counts, in band order
    pub fn update(&mut self, counts: &BandCounts) {
        self.lines = counts
            .iter()
            .map(|(band, n)| (band, format!("{}: {}", band.name(), n)))
            .collect();
    }

    pub fn set_skipped(&mut self, skipped: usize) {
        self.skipped = skipped;
    }

    pub fn lines(&self) -> &[(MagnitudeBand, String)] {
        &self.lines
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Band lines joined with newlines
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|(_, line)| line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

impl Default for Legend {
    fn default() -> Self {
        Self::new()
    }
}
