//! Pixel and PixelBuffer data structures.

/// Blue channel value of an ocean pixel.
pub const OCEAN_BLUE: u8 = 128;

/// Red channel value marking a pixel that currently carries cloud cover.
pub const CLOUD_MARKER: u8 = 220;

/// A 24-bit color stored in bitmap byte order (blue, green, red).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pixel {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

/// The classes a terrain pixel can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelClass {
    Ocean,
    Land,
    Star,
    Space,
    /// Thin or thick cloud cover drawn by the overlay pass.
    Cloud,
}

impl Pixel {
    pub const SPACE: Pixel = Pixel { b: 0, g: 0, r: 0 };
    pub const STAR: Pixel = Pixel { b: 255, g: 255, r: 255 };
    pub const OCEAN: Pixel = Pixel { b: OCEAN_BLUE, g: 0, r: 0 };

    pub const fn new(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    /// Land pixel with the given green magnitude.
    pub const fn land(g: u8) -> Self {
        Self { b: 0, g, r: 0 }
    }

    /// Byte triple in on-disk order.
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.b, self.g, self.r]
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            b: bytes[0],
            g: bytes[1],
            r: bytes[2],
        }
    }

    /// Green carries a land magnitude rather than a 0/255 sentinel.
    pub fn has_land_green(self) -> bool {
        self.g != 0 && self.g != 255
    }

    /// Blue is neither 0 nor 255, i.e. the pixel is water-colored.
    pub fn has_water_blue(self) -> bool {
        self.b != 0 && self.b != 255
    }

    pub fn is_ocean_blue(self) -> bool {
        self.b == OCEAN_BLUE
    }

    pub fn has_cloud_marker(self) -> bool {
        self.r == CLOUD_MARKER
    }

    /// Classifies the pixel, or `None` if its color belongs to no class.
    pub fn class(self) -> Option<PixelClass> {
        match self {
            Pixel::SPACE => Some(PixelClass::Space),
            Pixel::STAR => Some(PixelClass::Star),
            Pixel::OCEAN => Some(PixelClass::Ocean),
            p if p.b == 0 && p.r == 0 && p.has_land_green() => Some(PixelClass::Land),
            p if p.has_cloud_marker() => Some(PixelClass::Cloud),
            _ => None,
        }
    }
}

/// A row-major grid of pixels matching the output image dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl PixelBuffer {
    /// Creates a buffer filled with black space.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Pixel::SPACE; width as usize * height as usize],
        }
    }

    /// Wraps row-major pixels, or returns `None` if the length is wrong.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Pixel>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Linear index of `(x, y)`, or `None` outside the grid.
    pub fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut Pixel> {
        let i = self.index(x, y)?;
        Some(&mut self.pixels[i])
    }

    /// Sets `(x, y)`. Returns false if the coordinate is outside the grid.
    pub fn set(&mut self, x: u32, y: u32, pixel: Pixel) -> bool {
        match self.get_mut(x, y) {
            Some(p) => {
                *p = pixel;
                true
            }
            None => false,
        }
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Iterates rows from `y = 0` upward.
    pub fn rows(&self) -> impl Iterator<Item = &[Pixel]> {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    /// Counts pixels of the given class.
    pub fn count(&self, class: PixelClass) -> usize {
        self.pixels.iter().filter(|p| p.class() == Some(class)).count()
    }
}
