use crate::map::projection::Viewport;
use ratatui::style::Color;
use std::f64::consts::PI;

const TILE_TEMPLATE: &str =
    "https://api.mapbox.com/styles/v1/mapbox/{style}/tiles/256/{z}/{x}/{y}?access_token={accessToken}";
const TILE_SIZE: f64 = 256.0;
const MAX_TILE_ZOOM: u8 = 18;

pub const ATTRIBUTION: &str = "Map data © OpenStreetMap contributors, CC-BY-SA, Imagery © Mapbox";

/// Selectable background; exactly one is active at a time
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BaseLayer {
    #[default]
    Light,
    Street,
    Satellite,
}

/// Terminal colors used to draw a base layer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BasePalette {
    pub background: Color,
    pub coastline: Color,
    /// `None` hides country borders on this base layer
    pub borders: Option<Color>,
}

impl BaseLayer {
    pub const ALL: [BaseLayer; 3] = [BaseLayer::Light, BaseLayer::Street, BaseLayer::Satellite];

    pub fn label(self) -> &'static str {
        match self {
            BaseLayer::Light => "Light Map",
            BaseLayer::Street => "Street Map",
            BaseLayer::Satellite => "Satellite Map",
        }
    }

    /// Mapbox style id
    pub fn style_id(self) -> &'static str {
        match self {
            BaseLayer::Light => "light-v9",
            BaseLayer::Street => "streets-v11",
            BaseLayer::Satellite => "satellite-v9",
        }
    }

    pub fn next(self) -> BaseLayer {
        match self {
            BaseLayer::Light => BaseLayer::Street,
            BaseLayer::Street => BaseLayer::Satellite,
            BaseLayer::Satellite => BaseLayer::Light,
        }
    }

    pub fn palette(self) -> BasePalette {
        match self {
            BaseLayer::Light => BasePalette {
                background: Color::Rgb(214, 214, 214),
                coastline: Color::Rgb(120, 120, 120),
                borders: None,
            },
            BaseLayer::Street => BasePalette {
                background: Color::Rgb(236, 232, 222),
                coastline: Color::Rgb(70, 110, 160),
                borders: Some(Color::Rgb(160, 110, 140)),
            },
            BaseLayer::Satellite => BasePalette {
                background: Color::Rgb(14, 28, 40),
                coastline: Color::Rgb(110, 150, 90),
                borders: None,
            },
        }
    }

    /// Tile URL for this style at z/x/y
    pub fn tile_url(self, access_token: &str, tile: TileId) -> String {
        TILE_TEMPLATE
            .replace("{style}", self.style_id())
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
            .replace("{accessToken}", access_token)
    }
}

/// Slippy-map tile coordinate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    /// Tile containing (lon, lat) at zoom z
    pub fn containing(lon: f64, lat: f64, z: u8) -> Self {
        let n = 1_i64 << z;
        let x_raw = ((lon + 180.0) / 360.0 * n as f64).floor() as i64;
        let lat_rad = lat.clamp(-85.0511, 85.0511).to_radians();
        let y_raw = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n as f64)
            .floor() as i64;

        Self {
            z,
            x: x_raw.rem_euclid(n) as u32,
            y: y_raw.clamp(0, n - 1) as u32,
        }
    }

    /// Tile zoom whose world width best matches the viewport's world width
    pub fn zoom_for(viewport: &Viewport) -> u8 {
        let world_px = viewport.zoom * viewport.width.max(1) as f64;
        let z = (world_px / TILE_SIZE).log2().round();
        z.clamp(0.0, MAX_TILE_ZOOM as f64) as u8
    }

    /// Tiles needed to cover the viewport, row by row
    pub fn covering(viewport: &Viewport) -> Vec<TileId> {
        let z = Self::zoom_for(viewport);
        let w = viewport.width as i32;
        let h = viewport.height as i32;
        let (west, north) = viewport.unproject(0, 0);
        let (east, south) = viewport.unproject(w, h);

        let top_left = Self::containing(west.max(-180.0), north, z);
        let bottom_right = Self::containing(east.min(179.9999), south, z);

        let mut tiles = Vec::new();
        for y in top_left.y..=bottom_right.y {
            for x in top_left.x..=bottom_right.x {
                tiles.push(TileId { z, x, y });
            }
        }
        tiles
    }
}
