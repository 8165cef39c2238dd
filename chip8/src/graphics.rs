//! This module provides the monochrome display buffer with a fixed resolution
//! of 64x32 pixels. It only holds pixel state; turning pixels into something
//! visible is up to the renderer.

/// The height of the graphics buffer in pixels. This is a constant value
/// set to 32.
pub const HEIGHT: usize = 32;
/// The width of the graphics buffer in pixels. This is a constant value set
/// to 64.
pub const WIDTH: usize = 64;
/// The total number of pixels in the graphics buffer. This is calculated
/// as the product of [`WIDTH`] and [`HEIGHT`].
pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;

/// A struct representing the graphics buffer. This struct holds a row-major
/// array of one-bit pixels. Sprites are XOR-composited onto it and collisions
/// between active pixels are reported back to the caller.
#[derive(Clone, Copy)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Buffer {
    #[cfg_attr(feature = "persistence", serde(with = "serde_big_array::BigArray"))]
    vram: [bool; PIXEL_COUNT],
}

impl Default for Buffer {
    fn default() -> Self {
        Self {
            vram: [false; PIXEL_COUNT],
        }
    }
}

impl Buffer {
    /// Creates a new [`Buffer`] with every pixel off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index into `vram` for the given point, wrapping both coordinates.
    const fn offset(x: usize, y: usize) -> usize {
        (y % HEIGHT) * WIDTH + (x % WIDTH)
    }

    /// Draws a sprite whose rows are given by `rows`, each byte being 8
    /// pixels with the most significant bit leftmost. The origin wraps to
    /// `(x mod 64, y mod 32)` and every pixel wraps on both axes on its own.
    ///
    /// Returns [`true`] if any pixel that was on got turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let mut collision = false;

        for (row, &data) in rows.iter().enumerate() {
            for bit in 0..8 {
                if data & (0x80 >> bit) == 0 {
                    continue;
                }
                let pixel = &mut self.vram[Self::offset(x + bit, y + row)];
                collision |= *pixel;
                *pixel = !*pixel;
            }
        }
        collision
    }

    /// Returns whether the pixel at `(x, y)` is on. Coordinates wrap.
    #[must_use]
    pub fn pixel_at(&self, x: usize, y: usize) -> bool {
        self.vram[Self::offset(x, y)]
    }

    /// Iterates over every pixel as `(x, y, on)`, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        self.vram
            .iter()
            .enumerate()
            .map(|(i, &on)| (i % WIDTH, i / WIDTH, on))
    }

    /// Clears the graphics buffer by turning every pixel off.
    #[inline]
    pub fn clear(&mut self) {
        self.vram = [false; PIXEL_COUNT];
    }
}
