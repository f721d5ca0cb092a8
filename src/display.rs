/// Width of the high resolution screen, and of the backing buffer.
pub const DISPLAY_WIDTH: usize = 128;
/// Height of the high resolution screen, and of the backing buffer.
pub const DISPLAY_HEIGHT: usize = 64;

/// Monochrome screen.
///
/// In low resolution only the top-left 64x32 pixels of the buffer are used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Display {
    pixels: Box<[bool; DISPLAY_WIDTH * DISPLAY_HEIGHT]>,
    high_res: bool,
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl Display {
    pub fn new() -> Self {
        Self {
            pixels: Box::new([false; DISPLAY_WIDTH * DISPLAY_HEIGHT]),
            high_res: false,
        }
    }

    pub fn is_high_res(&self) -> bool {
        self.high_res
    }

    /// Switch resolution. The screen is cleared.
    pub fn set_high_res(&mut self, high_res: bool) {
        self.high_res = high_res;
        self.clear();
    }

    pub fn width(&self) -> usize {
        if self.high_res {
            DISPLAY_WIDTH
        } else {
            DISPLAY_WIDTH / 2
        }
    }

    pub fn height(&self) -> usize {
        if self.high_res {
            DISPLAY_HEIGHT
        } else {
            DISPLAY_HEIGHT / 2
        }
    }

    /// Pixel at `(x, y)`. Out of range coordinates are unlit.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width() && y < self.height() && self.pixels[y * DISPLAY_WIDTH + x]
    }

    fn set(&mut self, x: usize, y: usize, value: bool) {
        self.pixels[y * DISPLAY_WIDTH + x] = value;
    }

    /// Whole backing buffer, row-major with rows of [`DISPLAY_WIDTH`].
    pub fn pixels(&self) -> &[bool] {
        self.pixels.as_slice()
    }

    /// Replace the buffer and resolution, as stored by [`Display::pixels`].
    ///
    /// Returns `false` if `pixels` has the wrong length.
    pub fn restore(&mut self, high_res: bool, pixels: &[bool]) -> bool {
        if pixels.len() != self.pixels.len() {
            return false;
        }
        self.pixels.copy_from_slice(pixels);
        self.high_res = high_res;
        true
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    /// XOR a sprite onto the screen with its top-left corner at `(x, y)`.
    ///
    /// Each row is `width` bits wide, most significant bit leftmost. The start coordinates
    /// always wrap; the rest of the sprite wraps if `wrap` is set and is clipped otherwise.
    /// Returns whether any lit pixel was turned off.
    pub fn draw(&mut self, x: usize, y: usize, rows: &[u16], width: usize, wrap: bool) -> bool {
        let (w, h) = (self.width(), self.height());
        let (x, y) = (x % w, y % h);
        let mut collision = false;

        for (dy, row) in rows.iter().enumerate() {
            let mut py = y + dy;
            if py >= h {
                if !wrap {
                    break;
                }
                py %= h;
            }
            for dx in 0..width {
                if (*row >> (width - 1 - dx)) & 1 == 0 {
                    continue;
                }
                let mut px = x + dx;
                if px >= w {
                    if !wrap {
                        break;
                    }
                    px %= w;
                }
                let lit = self.get(px, py);
                collision |= lit;
                self.set(px, py, !lit);
            }
        }
        collision
    }

    /// Move every pixel down by `n` rows.
    pub fn scroll_down(&mut self, n: usize) {
        let (w, h) = (self.width(), self.height());
        for y in (0..h).rev() {
            for x in 0..w {
                let value = y >= n && self.get(x, y - n);
                self.set(x, y, value);
            }
        }
    }

    /// Move every pixel right by `n` columns.
    pub fn scroll_right(&mut self, n: usize) {
        let (w, h) = (self.width(), self.height());
        for y in 0..h {
            for x in (0..w).rev() {
                let value = x >= n && self.get(x - n, y);
                self.set(x, y, value);
            }
        }
    }

    /// Move every pixel left by `n` columns.
    pub fn scroll_left(&mut self, n: usize) {
        let (w, h) = (self.width(), self.height());
        for y in 0..h {
            for x in 0..w {
                let value = self.get(x + n, y);
                self.set(x, y, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(display: &Display) -> usize {
        display.pixels().iter().filter(|pixel| **pixel).count()
    }

    #[test]
    fn draws_and_collides() {
        let mut display = Display::new();
        assert!(!display.draw(0, 0, &[0xF0, 0x90], 8, false));
        assert!(display.get(0, 0) && display.get(3, 0));
        assert!(display.get(0, 1) && !display.get(1, 1));
        assert_eq!(lit(&display), 6);

        assert!(display.draw(0, 0, &[0xF0, 0x90], 8, false));
        assert_eq!(lit(&display), 0);
    }

    #[test]
    fn start_wraps_and_rest_clips() {
        let mut display = Display::new();
        display.draw(64 + 62, 32 + 31, &[0xF0, 0xF0], 8, false);
        assert!(display.get(62, 31) && display.get(63, 31));
        assert_eq!(lit(&display), 2);
    }

    #[test]
    fn wraps_with_quirk() {
        let mut display = Display::new();
        display.draw(62, 31, &[0xF0, 0xF0], 8, true);
        assert!(display.get(0, 31) && display.get(1, 31));
        assert!(display.get(62, 0) && display.get(1, 0));
        assert_eq!(lit(&display), 8);
    }

    #[test]
    fn wide_sprites() {
        let mut display = Display::new();
        display.set_high_res(true);
        display.draw(100, 10, &[0x8001], 16, false);
        assert!(display.get(100, 10) && display.get(115, 10));
        assert_eq!(lit(&display), 2);
    }

    #[test]
    fn scrolling() {
        let mut display = Display::new();
        display.draw(4, 0, &[0x80], 8, false);
        display.scroll_down(2);
        assert!(display.get(4, 2) && !display.get(4, 0));
        display.scroll_right(4);
        assert!(display.get(8, 2));
        display.scroll_left(4);
        display.scroll_left(4);
        assert!(display.get(0, 2));
        display.scroll_left(4);
        assert_eq!(lit(&display), 0);
    }

    #[test]
    fn resolution_change_clears() {
        let mut display = Display::new();
        display.draw(0, 0, &[0xFF], 8, false);
        display.set_high_res(true);
        assert_eq!((display.width(), display.height()), (128, 64));
        assert_eq!(lit(&display), 0);
    }
}
