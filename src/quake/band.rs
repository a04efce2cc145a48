use ratatui::style::Color;
use std::fmt;

/// Severity category assigned to an earthquake from its magnitude
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MagnitudeBand {
    Minor,
    Light,
    Moderate,
    Strong,
    Mayor,
    Great,
}

impl MagnitudeBand {
    /// Fixed display order (legend, layer control, render order)
    pub const ALL: [MagnitudeBand; 6] = [
        MagnitudeBand::Minor,
        MagnitudeBand::Light,
        MagnitudeBand::Moderate,
        MagnitudeBand::Strong,
        MagnitudeBand::Mayor,
        MagnitudeBand::Great,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MagnitudeBand::Minor => "Minor",
            MagnitudeBand::Light => "Light",
            MagnitudeBand::Moderate => "Moderate",
            MagnitudeBand::Strong => "Strong",
            MagnitudeBand::Mayor => "Mayor",
            MagnitudeBand::Great => "Great",
        }
    }

    /// Position in `ALL`
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn style(self) -> &'static BandStyle {
        &BAND_STYLES[self.index()]
    }
}

impl fmt::Display for MagnitudeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a magnitude into its band.
///
/// The range tests are open at both ends, so the exact values 3.9, 5, 6 and 7,
/// the slivers between x.99 and the next integer, anything from 7.99 up, and
/// NaN all land in `Great`. Existing maps and counts depend on this; change
/// it deliberately or not at all.
pub fn classify(magnitude: f64) -> MagnitudeBand {
    let m = magnitude;
    if m < 3.9 {
        MagnitudeBand::Minor
    } else if m > 3.9 && m < 4.99 {
        MagnitudeBand::Light
    } else if m > 5.0 && m < 5.99 {
        MagnitudeBand::Moderate
    } else if m > 6.0 && m < 6.99 {
        MagnitudeBand::Strong
    } else if m > 7.0 && m < 7.99 {
        MagnitudeBand::Mayor
    } else {
        MagnitudeBand::Great
    }
}

/// Visual descriptor for a band's circle markers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BandStyle {
    pub fill: Color,
    pub stroke: Color,
    /// Marker radius in screen pixels
    pub radius: u8,
    pub fill_opacity: f32,
}

const ORANGE: Color = Color::Rgb(255, 165, 0);
const DARK_RED: Color = Color::Rgb(139, 0, 0);

/// Indexed by `MagnitudeBand::index`
pub static BAND_STYLES: [BandStyle; 6] = [
    BandStyle { fill: Color::White, stroke: Color::White, radius: 4, fill_opacity: 0.5 },
    BandStyle { fill: Color::Yellow, stroke: Color::Yellow, radius: 6, fill_opacity: 0.5 },
    BandStyle { fill: ORANGE, stroke: ORANGE, radius: 8, fill_opacity: 0.5 },
    BandStyle { fill: Color::Red, stroke: Color::Red, radius: 10, fill_opacity: 0.5 },
    BandStyle { fill: DARK_RED, stroke: DARK_RED, radius: 12, fill_opacity: 0.5 },
    BandStyle { fill: Color::Black, stroke: Color::Black, radius: 14, fill_opacity: 0.5 },
];

/// Per-band tally of classified events
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BandCounts {
    counts: [usize; 6],
}

impl BandCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, band: MagnitudeBand) {
        self.counts[band.index()] += 1;
    }

    pub fn get(&self, band: MagnitudeBand) -> usize {
        self.counts[band.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// (band, count) pairs in band order
    pub fn iter(&self) -> impl Iterator<Item = (MagnitudeBand, usize)> + '_ {
        MagnitudeBand::ALL.iter().map(move |&b| (b, self.get(b)))
    }
}
