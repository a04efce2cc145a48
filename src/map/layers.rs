use crate::map::renderer::LineString;
use crate::quake::MagnitudeBand;
use ratatui::style::Color;

/// A circle marker for one earthquake
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub lon: f64,
    pub lat: f64,
    /// Index into the renderer's event list (for popups)
    pub event: usize,
}

/// Stroke style for line overlays
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlateStyle {
    pub color: Color,
    pub weight: f32,
    pub opacity: f32,
}

pub const PLATE_STYLE: PlateStyle = PlateStyle {
    color: Color::Rgb(255, 165, 0),
    weight: 2.5,
    opacity: 0.65,
};

/// A set of lines drawn together with one style
#[derive(Clone, Debug)]
pub struct ShapeCollection {
    pub lines: Vec<LineString>,
    pub style: PlateStyle,
}

/// Named, independently visible collection of map shapes.
/// Items are only ever appended.
#[derive(Clone, Debug)]
pub struct LayerGroup<T> {
    pub name: &'static str,
    pub visible: bool,
    items: Vec<T>,
}

impl<T> LayerGroup<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            visible: true,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Identifies one toggleable overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Overlay {
    Band(MagnitudeBand),
    TectonicPlates,
}

impl Overlay {
    /// Layer control order: bands first, then plates
    pub fn all() -> impl Iterator<Item = Overlay> {
        MagnitudeBand::ALL
            .into_iter()
            .map(Overlay::Band)
            .chain(std::iter::once(Overlay::TectonicPlates))
    }

    /// Overlay bound to a digit key ('1'..='7')
    pub fn from_digit(digit: char) -> Option<Overlay> {
        let idx = digit.to_digit(10)? as usize;
        Overlay::all().nth(idx.checked_sub(1)?)
    }
}

/// All overlay groups: one per magnitude band plus the plate boundaries
#[derive(Clone, Debug)]
pub struct Overlays {
    bands: [LayerGroup<Marker>; 6],
    pub plates: LayerGroup<ShapeCollection>,
}

impl Overlays {
    pub fn new() -> Self {
        Self {
            bands: MagnitudeBand::ALL.map(|b| LayerGroup::new(b.name())),
            plates: LayerGroup::new("Tectonic Plates"),
        }
    }

    pub fn band(&self, band: MagnitudeBand) -> &LayerGroup<Marker> {
        &self.bands[band.index()]
    }

    pub fn band_mut(&mut self, band: MagnitudeBand) -> &mut LayerGroup<Marker> {
        &mut self.bands[band.index()]
    }

    pub fn name(&self, overlay: Overlay) -> &'static str {
        match overlay {
            Overlay::Band(b) => self.band(b).name,
            Overlay::TectonicPlates => self.plates.name,
        }
    }

    pub fn is_visible(&self, overlay: Overlay) -> bool {
        match overlay {
            Overlay::Band(b) => self.band(b).visible,
            Overlay::TectonicPlates => self.plates.visible,
        }
    }

    /// Flip visibility; the layer contents are untouched
    pub fn toggle(&mut self, overlay: Overlay) {
        let visible = match overlay {
            Overlay::Band(b) => &mut self.band_mut(b).visible,
            Overlay::TectonicPlates => &mut self.plates.visible,
        };
        *visible = !*visible;
    }

    /// Visible band groups in band order
    pub fn visible_bands(&self) -> impl Iterator<Item = (MagnitudeBand, &LayerGroup<Marker>)> {
        MagnitudeBand::ALL
            .into_iter()
            .map(move |b| (b, self.band(b)))
            .filter(|(_, group)| group.visible)
    }

    pub fn marker_count(&self) -> usize {
        self.bands.iter().map(LayerGroup::len).sum()
    }
}

impl Default for Overlays {
    fn default() -> Self {
        Self::new()
    }
}
