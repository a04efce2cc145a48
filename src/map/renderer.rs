use crate::braille::BrailleCanvas;
use crate::legend::Legend;
use crate::map::basemap::BaseLayer;
use crate::map::geometry::{draw_circle_marker, draw_line, draw_thick_line};
use crate::map::layers::{Marker, Overlay, Overlays, PlateStyle, ShapeCollection, PLATE_STYLE};
use crate::map::projection::Viewport;
use crate::map::spatial::SpatialGrid;
use crate::quake::{BandCounts, EventBatch, MagnitudeBand, SeismicEvent};

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Hit-test grid cell size in degrees
const MARKER_GRID_CELL: f64 = 2.0;

/// Drawn marker radius in Braille dots; a dot is about half a screen pixel
pub fn marker_radius(band: MagnitudeBand) -> i32 {
    (band.style().radius as i32 + 1) / 2
}

/// Level of detail for basemap data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    /// Select LOD based on zoom level
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }
}

/// One rasterized canvas per drawable layer, back to front
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    pub plates: BrailleCanvas,
    pub plate_style: PlateStyle,
    /// Visible bands in band order
    pub bands: Vec<(MagnitudeBand, BrailleCanvas)>,
}

/// Owns the basemap vectors, the active base layer, the overlay groups,
/// the parsed events and the legend.
pub struct MapRenderer {
    coastlines_low: Vec<LineString>,
    coastlines_medium: Vec<LineString>,
    coastlines_high: Vec<LineString>,
    borders_medium: Vec<LineString>,
    borders_high: Vec<LineString>,
    pub base_layer: BaseLayer,
    pub overlays: Overlays,
    pub legend: Legend,
    events: Vec<SeismicEvent>,
    counts: BandCounts,
    /// (band, index within band group) by position
    marker_grid: SpatialGrid<(MagnitudeBand, usize)>,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            coastlines_low: Vec::new(),
            coastlines_medium: Vec::new(),
            coastlines_high: Vec::new(),
            borders_medium: Vec::new(),
            borders_high: Vec::new(),
            base_layer: BaseLayer::default(),
            overlays: Overlays::new(),
            legend: Legend::new(),
            events: Vec::new(),
            counts: BandCounts::new(),
            marker_grid: SpatialGrid::new(MARKER_GRID_CELL),
        }
    }

    /// Classify every event, file a marker into its band group and
    /// refresh the legend with the resulting counts.
    pub fn render_events(&mut self, batch: EventBatch) {
        for event in batch.events {
            let band = event.band();
            let marker = Marker {
                lon: event.lon,
                lat: event.lat,
                event: self.events.len(),
            };

            let group = self.overlays.band_mut(band);
            self.marker_grid.insert(marker.lon, marker.lat, (band, group.len()));
            group.push(marker);

            self.counts.increment(band);
            self.events.push(event);
        }

        self.legend.set_skipped(self.legend.skipped() + batch.skipped);
        self.legend.update(&self.counts);
    }

    /// Show zero counts when the event feed could not be loaded
    pub fn reset_legend(&mut self) {
        self.legend.update(&self.counts);
    }

    /// Add all plate boundary lines as one styled collection
    pub fn render_plates(&mut self, lines: Vec<LineString>) {
        self.overlays.plates.push(ShapeCollection {
            lines,
            style: PLATE_STYLE,
        });
    }

    pub fn counts(&self) -> &BandCounts {
        &self.counts
    }

    pub fn event(&self, idx: usize) -> Option<&SeismicEvent> {
        self.events.get(idx)
    }

    pub fn toggle_overlay(&mut self, overlay: Overlay) {
        self.overlays.toggle(overlay);
    }

    pub fn cycle_base_layer(&mut self) {
        self.base_layer = self.base_layer.next();
    }

    /// Closest visible marker whose drawn circle, or `tolerance_px`
    /// if that is larger, covers pixel (px, py)
    pub fn marker_at(&self, px: i32, py: i32, tolerance_px: i32, viewport: &Viewport) -> Option<&Marker> {
        let (lon, lat) = viewport.unproject(px, py);
        let widest = MagnitudeBand::ALL
            .into_iter()
            .map(marker_radius)
            .max()
            .unwrap_or(0);
        let radius_deg = tolerance_px.max(widest) as f64 * viewport.degrees_per_pixel();

        self.marker_grid
            .query_radius(lon, lat, radius_deg)
            .into_iter()
            .filter(|(band, _)| self.overlays.band(*band).visible)
            .filter_map(|&(band, idx)| {
                let marker = self.overlays.band(band).items().get(idx)?;
                let (mx, my) = viewport.project(marker.lon, marker.lat);
                let d2 = (mx - px).pow(2) + (my - py).pow(2);
                let reach = tolerance_px.max(marker_radius(band));
                (d2 <= reach * reach).then_some((d2, marker))
            })
            .min_by_key(|(d2, _)| *d2)
            .map(|(_, m)| m)
    }

    /// Get coastlines for the given LOD, falling back to coarser data
    fn get_coastlines(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::High if !self.coastlines_high.is_empty() => self.coastlines_high.as_slice(),
            Lod::High | Lod::Medium if !self.coastlines_medium.is_empty() => {
                self.coastlines_medium.as_slice()
            }
            _ => self.coastlines_low.as_slice(),
        }
    }

    fn get_borders(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::High if !self.borders_high.is_empty() => self.borders_high.as_slice(),
            _ => self.borders_medium.as_slice(),
        }
    }

    /// Rasterize every visible layer for a `width`x`height` character area
    pub fn render(&self, width: usize, height: usize, viewport: &Viewport) -> MapLayers {
        let lod = Lod::from_zoom(viewport.zoom);
        let palette = self.base_layer.palette();

        let mut coastlines = BrailleCanvas::new(width, height);
        for line in self.get_coastlines(lod) {
            draw_linestring(&mut coastlines, line, viewport, false);
        }

        let mut borders = BrailleCanvas::new(width, height);
        if palette.borders.is_some() {
            for line in self.get_borders(lod) {
                draw_linestring(&mut borders, line, viewport, false);
            }
        }

        let mut plates = BrailleCanvas::new(width, height);
        if self.overlays.plates.visible {
            for collection in self.overlays.plates.items() {
                let thick = collection.style.weight >= 2.0;
                for line in &collection.lines {
                    draw_linestring(&mut plates, line, viewport, thick);
                }
            }
        }

        let bands = self
            .overlays
            .visible_bands()
            .map(|(band, group)| {
                let style = band.style();
                let radius = marker_radius(band);
                let mut canvas = BrailleCanvas::new(width, height);
                for marker in group.items() {
                    let (px, py) = viewport.project(marker.lon, marker.lat);
                    if viewport.is_visible(px, py) {
                        draw_circle_marker(&mut canvas, px, py, radius, style.fill_opacity);
                    }
                }
                (band, canvas)
            })
            .collect();

        MapLayers {
            coastlines,
            borders,
            plates,
            plate_style: PLATE_STYLE,
            bands,
        }
    }

    /// Add coastline data at a specific LOD
    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    /// Add border data at a specific LOD
    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    /// Check if any basemap coastline data is loaded
    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a linestring with viewport culling
fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport, thick: bool) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            // Skip segments that wrap the antimeridian
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                if thick {
                    draw_thick_line(canvas, prev_x, prev_y, px, py);
                } else {
                    draw_line(canvas, prev_x, prev_y, px, py);
                }
            }
        }

        prev = Some((px, py));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(lon: f64, lat: f64, magnitude: f64) -> SeismicEvent {
        SeismicEvent {
            lon,
            lat,
            magnitude,
            place: format!("M{magnitude} test"),
            time: None,
        }
    }

    fn batch(events: Vec<SeismicEvent>, skipped: usize) -> EventBatch {
        EventBatch { events, skipped }
    }

    #[test]
    fn test_single_light_event() {
        let mut map = MapRenderer::new();
        map.render_events(batch(vec![event(-122.4, 37.8, 4.5)], 0));

        let light = map.overlays.band(MagnitudeBand::Light);
        assert_eq!(light.len(), 1);
        assert_eq!(light.items()[0].lat, 37.8);
        assert_eq!(light.items()[0].lon, -122.4);
        assert_eq!(MagnitudeBand::Light.style().fill, ratatui::style::Color::Yellow);
        assert_eq!(MagnitudeBand::Light.style().radius, 6);

        for band in MagnitudeBand::ALL {
            if band != MagnitudeBand::Light {
                assert!(map.overlays.band(band).is_empty());
            }
        }

        let text = map.legend.text();
        assert!(text.contains("Light: 1"));
        for name in ["Minor", "Moderate", "Strong", "Mayor", "Great"] {
            assert!(text.contains(&format!("{name}: 0")), "{text}");
        }
    }

    #[test]
    fn test_counts_sum_to_parsed_events() {
        let mags = [1.0, 3.9, 4.2, 5.0, 5.5, 6.5, 7.2, 8.0, 2.2, 4.99];
        let events = mags.iter().map(|&m| event(10.0, 10.0, m)).collect();
        let mut map = MapRenderer::new();
        map.render_events(batch(events, 3));

        assert_eq!(map.counts().total(), mags.len());
        assert_eq!(map.overlays.marker_count(), mags.len());
        assert_eq!(map.legend.skipped(), 3);
        assert_eq!(map.counts().get(MagnitudeBand::Great), 4);
    }

    #[test]
    fn test_every_marker_in_its_band_group() {
        let mut map = MapRenderer::new();
        let events = (0..60).map(|i| event(i as f64, 0.0, i as f64 * 0.15)).collect();
        map.render_events(batch(events, 0));

        for band in MagnitudeBand::ALL {
            for marker in map.overlays.band(band).items() {
                assert_eq!(map.event(marker.event).unwrap().band(), band);
            }
        }
    }

    #[test]
    fn test_toggle_does_not_touch_data() {
        let mut map = MapRenderer::new();
        map.render_events(batch(vec![event(0.0, 0.0, 4.5), event(1.0, 1.0, 6.5)], 0));
        map.render_plates(vec![vec![(0.0, 0.0), (1.0, 1.0)]]);

        let counts_before = *map.counts();
        let legend_before = map.legend.text();
        let light_before = map.overlays.band(MagnitudeBand::Light).items().to_vec();

        for overlay in Overlay::all() {
            map.toggle_overlay(overlay);
        }
        map.cycle_base_layer();

        assert_eq!(*map.counts(), counts_before);
        assert_eq!(map.legend.text(), legend_before);
        assert_eq!(map.overlays.band(MagnitudeBand::Light).items(), &light_before[..]);
        assert_eq!(map.overlays.plates.len(), 1);
    }

    #[test]
    fn test_plates_are_one_collection() {
        let mut map = MapRenderer::new();
        map.render_plates(vec![
            vec![(-30.0, 60.0), (-25.0, 50.0)],
            vec![(140.0, 35.0), (142.0, 38.0)],
        ]);

        assert_eq!(map.overlays.plates.len(), 1);
        let collection = &map.overlays.plates.items()[0];
        assert_eq!(collection.lines.len(), 2);
        assert_eq!(collection.style.weight, 2.5);
        assert_eq!(collection.style.opacity, 0.65);
    }

    #[test]
    fn test_hidden_band_not_drawn() {
        let mut map = MapRenderer::new();
        map.render_events(batch(vec![event(0.0, 0.0, 4.5)], 0));
        let vp = Viewport::new(0.0, 0.0, 1.0, 80, 40);

        let layers = map.render(40, 10, &vp);
        let light = layers.bands.iter().find(|(b, _)| *b == MagnitudeBand::Light).unwrap();
        assert!(light.1.cells().count() > 0);

        map.toggle_overlay(Overlay::Band(MagnitudeBand::Light));
        let layers = map.render(40, 10, &vp);
        assert!(layers.bands.iter().all(|(b, _)| *b != MagnitudeBand::Light));
    }

    #[test]
    fn test_marker_hit_test() {
        let mut map = MapRenderer::new();
        map.render_events(batch(vec![event(-122.4, 37.8, 4.5), event(139.7, 35.7, 6.1)], 0));
        let vp = Viewport::new(0.0, 20.0, 1.0, 400, 200);

        let (px, py) = vp.project(139.7, 35.7);
        let hit = map.marker_at(px + 1, py, 4, &vp).unwrap();
        assert_eq!(map.event(hit.event).unwrap().magnitude, 6.1);

        assert!(map.marker_at(0, 199, 4, &vp).is_none());

        map.toggle_overlay(Overlay::Band(MagnitudeBand::Strong));
        assert!(map.marker_at(px, py, 4, &vp).is_none());
    }

    #[test]
    fn test_great_marker_hit_on_its_ring() {
        let mut map = MapRenderer::new();
        map.render_events(batch(vec![event(0.0, 0.0, 8.4), event(60.0, 0.0, 1.2)], 0));
        let vp = Viewport::new(30.0, 0.0, 1.0, 400, 200);
        let ring = marker_radius(MagnitudeBand::Great);
        assert_eq!(ring, 7);

        let (gx, gy) = vp.project(0.0, 0.0);
        let hit = map.marker_at(gx + ring, gy, 4, &vp).unwrap();
        assert_eq!(map.event(hit.event).unwrap().band(), MagnitudeBand::Great);

        // Minor markers are small; the same offset misses them
        let (mx, my) = vp.project(60.0, 0.0);
        assert!(map.marker_at(mx + ring, my, 4, &vp).is_none());
    }

    #[test]
    fn test_lod_fallback() {
        let mut map = MapRenderer::new();
        assert!(!map.has_data());
        map.add_coastline(vec![(0.0, 0.0), (1.0, 1.0)], Lod::Low);
        assert!(map.has_data());
        assert_eq!(map.get_coastlines(Lod::High).len(), 1);
        assert!(map.get_borders(Lod::High).is_empty());
    }
}
