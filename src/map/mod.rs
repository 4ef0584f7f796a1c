mod basemap;
mod geometry;
mod projection;
mod surface;

pub use basemap::Basemap;
pub use projection::{Bounds, LatLng, Viewport, MAX_ZOOM, MIN_ZOOM};
pub use surface::{
    MapLayers, MapSurface, Marker, MarkerGlyph, Popup, TerminalMap, DEFAULT_CENTER,
    DEFAULT_FIT_PADDING, DEFAULT_ZOOM, FOCUS_ZOOM,
};
