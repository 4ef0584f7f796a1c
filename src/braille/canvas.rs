/// Braille Unicode canvas for the basemap layer.
/// Each character cell holds a 2x4 dot grid, so the pixel resolution is
/// `width * 2` by `height * 4`.
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<u8>,
}

const BRAILLE_BASE: u32 = 0x2800;

impl BrailleCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0u8; width * height],
        }
    }

    /// Set a dot. Dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (cx, cy) = (x / 2, y / 4);
        if cx >= self.width || cy >= self.height {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            _ => 0x80,
        };

        self.cells[cy * self.width + cx] |= bit;
    }

    /// Set a dot using signed coordinates, ignoring anything off-canvas
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Glyph for a character cell, or `None` when no dot is set
    pub fn glyph(&self, cx: usize, cy: usize) -> Option<char> {
        if cx >= self.width || cy >= self.height {
            return None;
        }
        match self.cells[cy * self.width + cx] {
            0 => None,
            bits => char::from_u32(BRAILLE_BASE + bits as u32),
        }
    }

    /// Iterate over all non-empty cells as (column, row, glyph)
    pub fn glyphs(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        (0..self.height).flat_map(move |cy| {
            (0..self.width).filter_map(move |cx| self.glyph(cx, cy).map(|ch| (cx, cy, ch)))
        })
    }

    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.height)
            .map(|cy| {
                (0..self.width)
                    .map(|cx| self.glyph(cx, cy).unwrap_or('\u{2800}'))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
