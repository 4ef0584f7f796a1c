use crate::braille::BrailleCanvas;
use crate::map::geometry::{clip_line, draw_line};
use crate::map::projection::Viewport;
use anyhow::{Context, Result};
use geojson::{GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

/// A geographic line as (lng, lat) pairs, GeoJSON axis order
pub type LineString = Vec<(f64, f64)>;

/// Line features drawn dimly underneath the place markers
#[derive(Default)]
pub struct Basemap {
    lines: Vec<LineString>,
}

impl Basemap {
    /// Load every line and polygon outline from a GeoJSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading basemap {}", path.display()))?;
        let geojson: GeoJson = content
            .parse()
            .with_context(|| format!("parsing basemap {}", path.display()))?;

        let mut basemap = Self::default();
        process_geojson_lines(&geojson, |line| basemap.add_line(line));
        Ok(basemap)
    }

    /// Coarse Manhattan shoreline, used when no basemap file is configured
    pub fn fallback() -> Self {
        let mut basemap = Self::default();
        basemap.add_line(vec![
            (-74.0153, 40.7009), (-74.0120, 40.7060), (-73.9990, 40.7080),
            (-73.9779, 40.7106), (-73.9716, 40.7270), (-73.9742, 40.7360),
            (-73.9680, 40.7440), (-73.9580, 40.7590), (-73.9420, 40.7760),
            (-73.9360, 40.7880), (-73.9290, 40.7970), (-73.9340, 40.8090),
            (-73.9340, 40.8340), (-73.9270, 40.8560), (-73.9100, 40.8730),
            (-73.9260, 40.8780), (-73.9340, 40.8700), (-73.9470, 40.8480),
            (-73.9600, 40.8200), (-73.9720, 40.8000), (-73.9880, 40.7780),
            (-74.0040, 40.7590), (-74.0110, 40.7400), (-74.0130, 40.7270),
            (-74.0170, 40.7110), (-74.0153, 40.7009),
        ]);
        basemap
    }

    pub fn add_line(&mut self, line: LineString) {
        if line.len() >= 2 {
            self.lines.push(line);
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Rasterize all lines into the canvas with viewport culling
    pub fn draw(&self, canvas: &mut BrailleCanvas, viewport: &Viewport) {
        for line in &self.lines {
            draw_linestring(canvas, line, viewport);
        }
    }
}

fn draw_linestring(canvas: &mut BrailleCanvas, line: &LineString, viewport: &Viewport) {
    let mut prev: Option<(i32, i32)> = None;

    for &(lng, lat) in line {
        let (px, py) = viewport.project(lat, lng);

        if let Some((prev_x, prev_y)) = prev {
            if viewport.line_might_be_visible((prev_x, prev_y), (px, py)) {
                if let Some(((x0, y0), (x1, y1))) =
                    clip_line((prev_x, prev_y), (px, py), viewport.width, viewport.height)
                {
                    draw_line(canvas, x0, y0, x1, y1);
                }
            }
        }

        prev = Some((px, py));
    }
}

fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => process_geometry_lines(geometry, &mut add_line),
    }
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_line(coords)),
        Value::MultiLineString(lines) => lines.iter().for_each(|l| add_line(to_line(l))),
        // Interior rings included
        Value::Polygon(rings) => rings.iter().for_each(|r| add_line(to_line(r))),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .for_each(|r| add_line(to_line(r))),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}
