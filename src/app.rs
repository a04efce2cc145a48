use crate::config::MapConfig;
use crate::feed::FeedUpdate;
use crate::map::{Lod, MapRenderer, Overlay, TileId, Viewport};
use crate::quake::SeismicEvent;
use std::sync::Arc;

/// Minimum hit radius for clicking a marker, in Braille pixels.
/// Larger markers are hit anywhere inside their drawn circle.
const CLICK_TOLERANCE_PX: i32 = 4;

/// An open marker popup
#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    /// Index into the renderer's events
    pub event: usize,
    /// Terminal cell the popup points at
    pub anchor: (u16, u16),
}

/// Application state: the single owner of the view, the map and its layers
pub struct App {
    config: Arc<MapConfig>,
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub popup: Option<Popup>,
    /// User-visible messages about feed and credential problems
    pub notices: Vec<String>,
    pub show_layer_control: bool,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Set once the current press has moved; a press without drag is a click
    dragged: bool,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Tile URLs for the active base layer over the current view
    tile_urls: Vec<String>,
}

/// Terminal cell to Braille pixel, accounting for the 1-cell border
fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    let px = (col.saturating_sub(1) as i32) * 2;
    let py = (row.saturating_sub(1) as i32) * 4;
    (px, py)
}

impl App {
    pub fn new(config: Arc<MapConfig>, width: usize, height: usize) -> Self {
        // Braille gives 2x4 resolution per character
        // Account for border (2 chars horizontal, 2 chars vertical plus status bar)
        let inner_width = width.saturating_sub(2);
        let inner_height = height.saturating_sub(3);
        let viewport = Viewport::from_config(&config, inner_width * 2, inner_height * 4);

        Self {
            config,
            viewport,
            map_renderer: MapRenderer::new(),
            popup: None,
            notices: Vec::new(),
            show_layer_control: false,
            should_quit: false,
            last_mouse: None,
            dragged: false,
            mouse_pos: None,
            tile_urls: Vec::new(),
        }
    }

    /// Record the credential problem before any fetch starts
    pub fn check_credential(&mut self) {
        if let Err(e) = self.config.require_credential() {
            tracing::warn!(error = %e, "tile credential missing");
            self.notify(e.to_string());
        }
        self.refresh_tiles();
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }

    /// Apply a finished fetch. Runs to completion before the next input event.
    pub fn apply_update(&mut self, update: FeedUpdate) {
        match update {
            FeedUpdate::Events(Ok(batch)) => {
                let skipped = batch.skipped;
                self.map_renderer.render_events(batch);
                tracing::info!(
                    markers = self.map_renderer.overlays.marker_count(),
                    "earthquake markers placed"
                );
                if skipped > 0 {
                    tracing::warn!(skipped, "event records skipped as malformed");
                }
            }
            FeedUpdate::Events(Err(e)) => {
                self.map_renderer.reset_legend();
                self.notify(format!("Earthquakes unavailable: {e}"));
            }
            FeedUpdate::Plates(Ok(lines)) => {
                self.map_renderer.render_plates(lines);
            }
            FeedUpdate::Plates(Err(e)) => {
                self.notify(format!("Tectonic plates unavailable: {e}"));
            }
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let inner_width = width.saturating_sub(2);
        let inner_height = height.saturating_sub(3);
        self.viewport.width = inner_width * 2;
        self.viewport.height = inner_height * 4;
        self.refresh_tiles();
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
        self.refresh_tiles();
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
        self.refresh_tiles();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
        self.refresh_tiles();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
        self.refresh_tiles();
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
        self.refresh_tiles();
    }

    pub fn toggle_overlay(&mut self, overlay: Overlay) {
        self.map_renderer.toggle_overlay(overlay);
        // A popup for a marker that just disappeared would dangle
        if let Some(popup) = &self.popup {
            let hidden = self
                .map_renderer
                .event(popup.event)
                .map(|ev| !self.map_renderer.overlays.is_visible(Overlay::Band(ev.band())))
                .unwrap_or(true);
            if hidden {
                self.popup = None;
            }
        }
    }

    pub fn cycle_base_layer(&mut self) {
        self.map_renderer.cycle_base_layer();
        self.refresh_tiles();
    }

    pub fn toggle_legend(&mut self) {
        self.map_renderer.legend.toggle();
    }

    pub fn toggle_layer_control(&mut self) {
        self.show_layer_control = !self.show_layer_control;
    }

    /// Esc: close the popup if one is open, otherwise quit
    pub fn escape(&mut self) {
        if self.popup.take().is_none() {
            self.quit();
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Open the popup for the marker nearest to a terminal cell, if any
    pub fn select_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        // Aim at the middle of the cell
        let (px, py) = (px + 1, py + 2);
        self.popup = self
            .map_renderer
            .marker_at(px, py, CLICK_TOLERANCE_PX, &self.viewport)
            .map(|marker| Popup {
                event: marker.event,
                anchor: (col, row),
            });
    }

    /// Event shown in the open popup
    pub fn popup_event(&self) -> Option<&SeismicEvent> {
        self.popup
            .as_ref()
            .and_then(|p| self.map_renderer.event(p.event))
    }

    /// Recompute tile URLs for the active base layer; only when a credential exists
    fn refresh_tiles(&mut self) {
        let Some(token) = self.config.access_token.as_deref() else {
            self.tile_urls.clear();
            return;
        };
        let base = self.map_renderer.base_layer;
        self.tile_urls = TileId::covering(&self.viewport)
            .into_iter()
            .map(|tile| base.tile_url(token, tile))
            .collect();
        tracing::debug!(base = base.label(), tiles = self.tile_urls.len(), "base tiles in view");
    }

    pub fn tile_urls(&self) -> &[String] {
        &self.tile_urls
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn lod_level(&self) -> &'static str {
        match Lod::from_zoom(self.viewport.zoom) {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }

    pub fn begin_press(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Pan by the drag delta since the last event
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - col as i32;
            let dy = last_y as i32 - row as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
            }
            // Less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((col, row));
    }

    /// Button released: a press that never moved selects a marker
    pub fn end_press(&mut self, col: u16, row: u16) {
        if self.last_mouse.is_some() && !self.dragged {
            self.select_at(col, row);
        }
        self.last_mouse = None;
        self.dragged = false;
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Mouse position in Braille pixel coordinates (for the cursor marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.map(|(col, row)| cell_to_pixel(col, row))
    }
}
