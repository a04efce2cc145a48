mod basemap;
mod geometry;
mod layers;
mod projection;
mod renderer;
mod spatial;

pub use basemap::{BaseLayer, BasePalette, TileId, ATTRIBUTION};
pub use layers::{LayerGroup, Marker, Overlay, Overlays, PlateStyle, ShapeCollection, PLATE_STYLE};
pub use projection::{wrap_lon, Viewport};
pub use renderer::{LineString, Lod, MapLayers, MapRenderer};
