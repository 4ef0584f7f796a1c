//! Matrix rain backdrop. Runs on its own timer and shares nothing with the
//! place data except screen space.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

// Digits plus half-width katakana, all single-cell wide
const GLYPHS: &[char] = &[
    '0', '1', 'ｱ', 'ｲ', 'ｳ', 'ｴ', 'ｵ', 'ｶ', 'ｷ', 'ｸ', 'ｹ', 'ｺ', 'ｻ', 'ｼ', 'ｽ', 'ｾ', 'ｿ', 'ﾀ',
    'ﾁ', 'ﾂ', 'ﾃ', 'ﾄ', 'ﾅ', 'ﾆ', 'ﾇ', 'ﾈ', 'ﾉ', 'ﾊ', 'ﾋ', 'ﾌ', 'ﾍ', 'ﾎ', 'ﾏ', 'ﾐ', 'ﾑ', 'ﾒ',
    'ﾓ', 'ﾔ', 'ﾕ', 'ﾖ', 'ﾗ', 'ﾘ', 'ﾙ', 'ﾚ', 'ﾛ', 'ﾜ', 'ｦ', 'ﾝ',
];

/// Terminal cells between rain columns
pub const COLUMN_PITCH: u16 = 2;
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);
/// Chance per tick that a drop below the bottom edge restarts at the top
const RESET_PROBABILITY: f64 = 0.025;
/// Brightness kept per tick, out of 256 (a 5% black wash)
const FADE_KEEP: u16 = 243;
const MIN_VISIBLE: u8 = 12;

#[derive(Clone, Copy, Default)]
struct Trail {
    glyph: char,
    intensity: u8,
}

pub struct MatrixRain {
    width: u16,
    height: u16,
    /// Row of the next glyph, per column
    drops: Vec<u32>,
    cells: Vec<Trail>,
    rng: StdRng,
    interval: Duration,
    last_tick: Option<Instant>,
}

impl MatrixRain {
    pub fn new(width: u16, height: u16, interval: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut rain = Self {
            width: 0,
            height: 0,
            drops: Vec::new(),
            cells: Vec::new(),
            rng,
            interval,
            last_tick: None,
        };
        rain.resize(width, height);
        rain
    }

    /// Re-fit to a new screen size. Existing trails are dropped; drops of
    /// surviving columns keep their position.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells = vec![Trail::default(); width as usize * height as usize];
        self.drops.resize((width / COLUMN_PITCH) as usize, 1);
    }

    pub fn columns(&self) -> usize {
        self.drops.len()
    }

    /// Fade every trail, then draw one fresh glyph per column
    pub fn tick(&mut self) {
        for cell in &mut self.cells {
            let faded = (cell.intensity as u16 * FADE_KEEP / 256) as u8;
            cell.intensity = if faded < MIN_VISIBLE { 0 } else { faded };
        }

        let Self {
            width,
            height,
            drops,
            cells,
            rng,
            ..
        } = self;

        for (col, drop) in drops.iter_mut().enumerate() {
            let row = *drop as usize;
            if row < *height as usize {
                let x = col * COLUMN_PITCH as usize;
                cells[row * *width as usize + x] = Trail {
                    glyph: GLYPHS[rng.gen_range(0..GLYPHS.len())],
                    intensity: u8::MAX,
                };
            } else if rng.gen_bool(RESET_PROBABILITY) {
                *drop = 0;
            }
            *drop = drop.saturating_add(1);
        }
    }

    /// Tick if the interval has elapsed since the last tick
    pub fn tick_if_due(&mut self, now: Instant) -> bool {
        let due = self
            .last_tick
            .map_or(true, |last| now.duration_since(last) >= self.interval);
        if due {
            self.tick();
            self.last_tick = Some(now);
        }
        due
    }

    /// Visible glyphs as (column, row, glyph, brightness)
    pub fn glyphs(&self) -> impl Iterator<Item = (u16, u16, char, u8)> + '_ {
        let width = self.width.max(1) as usize;
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            (cell.intensity > 0).then(|| {
                (
                    (idx % width) as u16,
                    (idx / width) as u16,
                    cell.glyph,
                    cell.intensity,
                )
            })
        })
    }

    #[cfg(test)]
    fn drop_rows(&self) -> &[u32] {
        &self.drops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_follow_width() {
        let mut rain = MatrixRain::new(80, 24, DEFAULT_TICK, Some(1));
        assert_eq!(rain.columns(), 40);
        rain.resize(21, 10);
        assert_eq!(rain.columns(), 10);
        rain.resize(0, 0);
        rain.tick();
        assert_eq!(rain.glyphs().count(), 0);
    }

    #[test]
    fn test_glyphs_stay_on_screen() {
        let mut rain = MatrixRain::new(30, 8, DEFAULT_TICK, Some(42));
        for _ in 0..500 {
            rain.tick();
            for (x, y, ch, _) in rain.glyphs() {
                assert!(x < 30 && y < 8);
                assert_eq!(x % COLUMN_PITCH, 0);
                assert!(GLYPHS.contains(&ch));
            }
        }
    }

    #[test]
    fn test_trails_fade() {
        let mut rain = MatrixRain::new(2, 3, DEFAULT_TICK, Some(3));
        rain.tick();
        let first: Vec<_> = rain.glyphs().collect();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].3, u8::MAX);

        rain.tick();
        let dimmer = rain.glyphs().find(|g| (g.0, g.1) == (first[0].0, first[0].1)).unwrap();
        assert!(dimmer.3 < u8::MAX);
    }

    #[test]
    fn test_drops_restart_after_bottom() {
        let mut rain = MatrixRain::new(8, 5, DEFAULT_TICK, Some(9));
        let mut restarted = vec![false; rain.columns()];
        for _ in 0..600 {
            let before = rain.drop_rows().to_vec();
            rain.tick();
            for (col, (&b, &a)) in before.iter().zip(rain.drop_rows()).enumerate() {
                if a < b {
                    restarted[col] = true;
                }
            }
        }
        assert!(restarted.iter().all(|&r| r));
    }

    #[test]
    fn test_tick_if_due() {
        let mut rain = MatrixRain::new(10, 5, Duration::from_millis(50), Some(5));
        let start = Instant::now();
        assert!(rain.tick_if_due(start));
        assert!(!rain.tick_if_due(start + Duration::from_millis(10)));
        assert!(rain.tick_if_due(start + Duration::from_millis(60)));
    }
}
