use glam::DVec2;
use std::f64::consts::PI;

/// Pixels per tile edge at zoom 0, as in slippy-map tiling
pub const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 19.0;
/// Web Mercator latitude limit
const MAX_LAT: f64 = 85.051_128_78;

/// A geographic coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Geographic bounding box, stored as (lng, lat) vectors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    /// Smallest box containing every point, `None` for an empty input
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut points = points.into_iter().map(|p| DVec2::new(p.lng, p.lat));
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn south_west(&self) -> LatLng {
        LatLng::new(self.min.y, self.min.x)
    }

    pub fn north_east(&self) -> LatLng {
        LatLng::new(self.max.y, self.max.x)
    }
}

/// Normalized Web Mercator position, both axes in [0, 1], y growing south
#[inline]
fn mercator(lat: f64, lng: f64) -> DVec2 {
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    DVec2::new(
        (lng + 180.0) / 360.0,
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0,
    )
}

#[inline]
fn inverse_mercator(m: DVec2) -> LatLng {
    let lat = (PI * (1.0 - 2.0 * m.y)).sinh().atan().to_degrees();
    LatLng::new(lat, m.x * 360.0 - 180.0)
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug)]
pub struct Viewport {
    pub center_lat: f64,
    pub center_lng: f64,
    /// Web-map zoom level (0 = whole world in one tile)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lat: center.lat,
            center_lng: center.lng,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(self.center_lat, self.center_lng)
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * 2f64.powf(self.zoom)
    }

    fn half_size(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64) / 2.0
    }

    fn set_center_mercator(&mut self, m: DVec2) {
        let m = DVec2::new(m.x.rem_euclid(1.0), m.y.clamp(0.0, 1.0));
        let center = inverse_mercator(m);
        self.center_lat = center.lat;
        self.center_lng = center.lng;
    }

    /// Recenter and set zoom
    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.center_lat = center.lat;
        self.center_lng = center.lng;
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let m = mercator(self.center_lat, self.center_lng)
            + DVec2::new(dx as f64, dy as f64) / self.world_size();
        self.set_center_mercator(m);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1.0).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - 1.0).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -1.0);
    }

    /// Change zoom while keeping the coordinate under (px, py) in place
    fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        let anchor = self.unproject(px, py);
        self.zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        let (new_px, new_py) = self.project(anchor.lat, anchor.lng);
        self.pan(new_px - px, new_py - py);
    }

    /// Largest whole zoom at which `bounds` plus `padding` pixels on every
    /// side fits the viewport, centered on the bounds
    pub fn fit_bounds(&mut self, bounds: &Bounds, padding: u32) {
        let sw = bounds.south_west();
        let ne = bounds.north_east();
        let a = mercator(sw.lat, sw.lng);
        let b = mercator(ne.lat, ne.lng);
        let extent = (b - a).abs();

        let pad = 2.0 * padding as f64;
        let available = DVec2::new(
            (self.width as f64 - pad).max(1.0),
            (self.height as f64 - pad).max(1.0),
        );

        let mut zoom = MAX_ZOOM;
        while zoom > MIN_ZOOM {
            let size = extent * TILE_SIZE * 2f64.powf(zoom);
            if size.x <= available.x && size.y <= available.y {
                break;
            }
            zoom -= 1.0;
        }

        self.zoom = zoom;
        self.set_center_mercator((a + b) / 2.0);
    }

    /// Unproject pixel coordinates back to geographic coordinates
    pub fn unproject(&self, px: i32, py: i32) -> LatLng {
        let offset = DVec2::new(px as f64, py as f64) - self.half_size();
        inverse_mercator(mercator(self.center_lat, self.center_lng) + offset / self.world_size())
    }

    /// Project a geographic coordinate to pixel coordinates
    pub fn project(&self, lat: f64, lng: f64) -> (i32, i32) {
        let delta = mercator(lat, lng) - mercator(self.center_lat, self.center_lng);
        let p = delta * self.world_size() + self.half_size();
        (p.x.round() as i32, p.y.round() as i32)
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= 0 && px < self.width as i32 && py >= 0 && py < self.height as i32
    }

    /// Rough bounding box check for a line segment
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}
