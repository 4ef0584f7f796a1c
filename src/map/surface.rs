use crate::braille::BrailleCanvas;
use crate::data::Place;
use crate::map::basemap::Basemap;
use crate::map::geometry::draw_ring;
use crate::map::projection::{Bounds, LatLng, Viewport};

/// Default map view: Times Square
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 40.7580,
    lng: -73.9855,
};
pub const DEFAULT_ZOOM: f64 = 12.0;
/// Zoom used when a list card is selected
pub const FOCUS_ZOOM: f64 = 16.0;
/// Padding in Braille pixels kept around fitted bounds
pub const DEFAULT_FIT_PADDING: u32 = 6;

/// Text shown when a marker is opened
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub lines: Vec<String>,
}

impl Popup {
    pub fn for_place(place: &Place) -> Self {
        let mut lines = vec![place.address.clone()];
        if place.is_rated() {
            lines.push(format!("★ {}", place.rating));
        }
        if let Some(website) = &place.website {
            lines.push(format!("Website: {website}"));
        }
        Self {
            title: place.name.clone(),
            lines,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: LatLng,
    pub popup: Popup,
}

/// The operations the view needs from an interactive map
pub trait MapSurface {
    /// Create the view at `center`
    fn initialize(&mut self, center: LatLng, zoom: f64);

    /// Remove every marker and close any open popup
    fn clear_markers(&mut self);

    /// Add a marker with its popup, returning its index
    fn add_marker(&mut self, place: &Place) -> usize;

    fn fit_bounds(&mut self, bounds: &Bounds, padding: u32);

    fn focus_on(&mut self, position: LatLng, zoom: f64);

    /// Reveal the popup of marker `index`; false if there is no such marker
    fn open_popup(&mut self, index: usize) -> bool;

    fn fit_padding(&self) -> u32 {
        DEFAULT_FIT_PADDING
    }

    /// Replace all markers with one per place, in order, and fit the view to
    /// them. An empty slice leaves the viewport alone.
    fn render_markers(&mut self, places: &[&Place]) {
        self.clear_markers();
        for place in places {
            self.add_marker(place);
        }
        if let Some(bounds) = Bounds::from_points(places.iter().map(|p| LatLng::new(p.lat, p.lng))) {
            let padding = self.fit_padding();
            self.fit_bounds(&bounds, padding);
        }
    }
}

/// A marker glyph position in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerGlyph {
    pub x: u16,
    pub y: u16,
    pub index: usize,
    pub open: bool,
}

/// Everything needed to paint one frame of the map
pub struct MapLayers<'a> {
    pub basemap: BrailleCanvas,
    pub markers: Vec<MarkerGlyph>,
    /// Anchor cell and content of the open popup, if it is on screen
    pub popup: Option<(u16, u16, &'a Popup)>,
}

/// Braille terminal implementation of [`MapSurface`]
pub struct TerminalMap {
    pub viewport: Viewport,
    markers: Vec<Marker>,
    open_popup: Option<usize>,
    basemap: Basemap,
    fit_padding: u32,
    home: (LatLng, f64),
}

impl TerminalMap {
    /// `width`/`height` are character cells of the map pane
    pub fn new(width: u16, height: u16, basemap: Basemap) -> Self {
        Self {
            viewport: Viewport::new(
                DEFAULT_CENTER,
                DEFAULT_ZOOM,
                width as usize * 2,
                height as usize * 4,
            ),
            markers: Vec::new(),
            open_popup: None,
            basemap,
            fit_padding: DEFAULT_FIT_PADDING,
            home: (DEFAULT_CENTER, DEFAULT_ZOOM),
        }
    }

    pub fn with_fit_padding(mut self, padding: u32) -> Self {
        self.fit_padding = padding;
        self
    }

    /// Track the pane size; Braille gives 2x4 pixels per cell
    pub fn resize(&mut self, width: u16, height: u16) {
        self.viewport.width = width as usize * 2;
        self.viewport.height = height as usize * 4;
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn open_popup_index(&self) -> Option<usize> {
        self.open_popup
    }

    pub fn close_popup(&mut self) {
        self.open_popup = None;
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom towards a cell of the map pane
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        self.viewport.zoom_in_at(col as i32 * 2, row as i32 * 4);
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        self.viewport.zoom_out_at(col as i32 * 2, row as i32 * 4);
    }

    /// Back to the view given at initialization
    pub fn reset_view(&mut self) {
        let (center, zoom) = self.home;
        self.viewport.set_view(center, zoom);
    }

    /// Marker whose glyph is drawn at the given pane cell
    pub fn marker_at(&self, col: u16, row: u16) -> Option<usize> {
        self.markers.iter().position(|m| {
            let (px, py) = self.viewport.project(m.position.lat, m.position.lng);
            self.viewport.is_visible(px, py) && (px / 2, py / 4) == (col as i32, row as i32)
        })
    }

    pub fn zoom_level(&self) -> String {
        format!("z{:.0}", self.viewport.zoom)
    }

    pub fn center_coords(&self) -> String {
        let c = self.viewport.center();
        format!(
            "{:.4}°{}, {:.4}°{}",
            c.lat.abs(),
            if c.lat >= 0.0 { "N" } else { "S" },
            c.lng.abs(),
            if c.lng >= 0.0 { "E" } else { "W" }
        )
    }

    /// Rasterize the basemap and place marker glyphs for a pane of
    /// `width` x `height` cells
    pub fn render(&self, width: u16, height: u16) -> MapLayers<'_> {
        let mut viewport = self.viewport.clone();
        viewport.width = width as usize * 2;
        viewport.height = height as usize * 4;

        let mut basemap = BrailleCanvas::new(width as usize, height as usize);
        self.basemap.draw(&mut basemap, &viewport);

        let mut markers = Vec::new();
        let mut popup = None;
        for (index, marker) in self.markers.iter().enumerate() {
            let (px, py) = viewport.project(marker.position.lat, marker.position.lng);
            if !viewport.is_visible(px, py) {
                continue;
            }
            let (x, y) = ((px / 2) as u16, (py / 4) as u16);
            let open = self.open_popup == Some(index);
            if open {
                draw_ring(&mut basemap, px, py, 5);
                popup = Some((x, y, &marker.popup));
            }
            markers.push(MarkerGlyph { x, y, index, open });
        }

        MapLayers {
            basemap,
            markers,
            popup,
        }
    }
}

impl MapSurface for TerminalMap {
    fn initialize(&mut self, center: LatLng, zoom: f64) {
        self.home = (center, zoom);
        self.viewport.set_view(center, zoom);
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
        self.open_popup = None;
    }

    fn add_marker(&mut self, place: &Place) -> usize {
        self.markers.push(Marker {
            position: LatLng::new(place.lat, place.lng),
            popup: Popup::for_place(place),
        });
        self.markers.len() - 1
    }

    fn fit_bounds(&mut self, bounds: &Bounds, padding: u32) {
        self.viewport.fit_bounds(bounds, padding);
    }

    fn focus_on(&mut self, position: LatLng, zoom: f64) {
        self.viewport.set_view(position, zoom);
    }

    fn open_popup(&mut self, index: usize) -> bool {
        if index < self.markers.len() {
            self.open_popup = Some(index);
            true
        } else {
            false
        }
    }

    fn fit_padding(&self) -> u32 {
        self.fit_padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Place> {
        let mut cafe = Place::new("Cafe", 40.7527, -73.9772, 4.5, &["cafe"]);
        cafe.address = "89 E 42nd St".into();
        cafe.website = Some("https://example.org".into());
        let mut park = Place::new("Park", 40.7812, -73.9665, 0.0, &["park"]);
        park.address = "Central Park".into();
        vec![cafe, park]
    }

    #[test]
    fn test_popup_content() {
        let places = sample();
        let popup = Popup::for_place(&places[0]);
        assert_eq!(popup.title, "Cafe");
        assert_eq!(popup.lines, vec!["89 E 42nd St", "★ 4.5", "Website: https://example.org"]);

        // Unrated, no website: address only
        assert_eq!(Popup::for_place(&places[1]).lines, vec!["Central Park"]);
    }

    #[test]
    fn test_render_markers_replaces_and_fits() {
        let places = sample();
        let refs: Vec<&Place> = places.iter().collect();
        let mut map = TerminalMap::new(60, 30, Basemap::default());
        map.initialize(DEFAULT_CENTER, DEFAULT_ZOOM);

        map.render_markers(&refs);
        map.render_markers(&refs);
        assert_eq!(map.markers().len(), 2);
        assert_ne!(map.viewport.zoom, DEFAULT_ZOOM);

        let layers = map.render(60, 30);
        assert_eq!(layers.markers.len(), 2);
        assert_eq!(layers.markers[0].index, 0);
    }

    #[test]
    fn test_empty_render_keeps_viewport() {
        let mut map = TerminalMap::new(60, 30, Basemap::default());
        map.initialize(DEFAULT_CENTER, DEFAULT_ZOOM);
        map.pan(5, 5);
        let before = map.viewport.center();

        map.render_markers(&[]);
        assert!(map.markers().is_empty());
        assert_eq!(map.viewport.center(), before);
        assert_eq!(map.viewport.zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn test_open_popup_and_marker_lookup() {
        let places = sample();
        let refs: Vec<&Place> = places.iter().collect();
        let mut map = TerminalMap::new(60, 30, Basemap::default());
        map.render_markers(&refs);

        assert!(!map.open_popup(2));
        map.focus_on(LatLng::new(places[1].lat, places[1].lng), FOCUS_ZOOM);
        assert!(map.open_popup(1));

        let layers = map.render(60, 30);
        let (x, y, popup) = layers.popup.expect("popup on screen");
        assert_eq!(popup.title, "Park");
        assert_eq!((x, y), (30, 15));
        assert_eq!(map.marker_at(30, 15), Some(1));

        map.clear_markers();
        assert_eq!(map.open_popup_index(), None);
    }
}
