//! Byte-exact raster and depth buffers.
//!
//! Both buffers store 4 bytes per pixel in row-major order. The raster buffer
//! holds B,G,R,A channels; the depth buffer holds a little-endian `i32`.

use serde::Deserialize;

/// Bytes used by one pixel in either buffer.
pub const BYTES_PER_PIXEL: usize = 4;

/// Grid size shared by the raster and depth buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn byte_len(&self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }

    /// Row-major pixel index, or `None` when `(x, y)` lies off the grid.
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = u32::try_from(x).ok().filter(|&x| x < self.width)?;
        let y = u32::try_from(y).ok().filter(|&y| y < self.height)?;
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::new(1000, 1000)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// One raster pixel in storage order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bgra {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Bgra {
    pub const OPAQUE: u8 = 255;

    pub fn to_bytes(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }

    pub fn from_bytes([b, g, r, a]: [u8; 4]) -> Self {
        Self { b, g, r, a }
    }
}

impl From<Rgb> for Bgra {
    fn from(rgb: Rgb) -> Self {
        Self {
            b: rgb.b,
            g: rgb.g,
            r: rgb.r,
            a: Bgra::OPAQUE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("matrix holds {actual} bytes, expected {expected} for {width}x{height}")]
    Length {
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
    },
}

fn check_len(dims: Dimensions, bytes: &[u8]) -> Result<(), BufferError> {
    if bytes.len() != dims.byte_len() {
        return Err(BufferError::Length {
            expected: dims.byte_len(),
            actual: bytes.len(),
            width: dims.width,
            height: dims.height,
        });
    }
    Ok(())
}

/// Colour buffer in BGRA byte order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuffer {
    dims: Dimensions,
    bytes: Vec<u8>,
}

impl RasterBuffer {
    pub fn filled(dims: Dimensions, pixel: Bgra) -> Self {
        Self {
            dims,
            bytes: pixel.to_bytes().repeat(dims.pixel_count()),
        }
    }

    pub fn from_bytes(dims: Dimensions, bytes: Vec<u8>) -> Result<Self, BufferError> {
        check_len(dims, &bytes)?;
        Ok(Self { dims, bytes })
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn clear(&mut self, pixel: Bgra) {
        let pattern = pixel.to_bytes();
        for chunk in self.bytes.chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk.copy_from_slice(&pattern);
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Bgra> {
        let at = self.dims.index(x, y)? * BYTES_PER_PIXEL;
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.bytes[at..at + BYTES_PER_PIXEL]);
        Some(Bgra::from_bytes(px))
    }

    /// Writes one pixel. Returns false when `(x, y)` is off the grid.
    pub fn set(&mut self, x: i32, y: i32, pixel: Bgra) -> bool {
        let Some(idx) = self.dims.index(x, y) else {
            return false;
        };
        let at = idx * BYTES_PER_PIXEL;
        self.bytes[at..at + BYTES_PER_PIXEL].copy_from_slice(&pixel.to_bytes());
        true
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Depth buffer of little-endian signed 32-bit values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepthBuffer {
    dims: Dimensions,
    bytes: Vec<u8>,
}

impl DepthBuffer {
    pub fn filled(dims: Dimensions, depth: i32) -> Self {
        Self {
            dims,
            bytes: depth.to_le_bytes().repeat(dims.pixel_count()),
        }
    }

    pub fn from_bytes(dims: Dimensions, bytes: Vec<u8>) -> Result<Self, BufferError> {
        check_len(dims, &bytes)?;
        Ok(Self { dims, bytes })
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    pub fn clear(&mut self, depth: i32) {
        let pattern = depth.to_le_bytes();
        for chunk in self.bytes.chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk.copy_from_slice(&pattern);
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<i32> {
        let at = self.dims.index(x, y)? * BYTES_PER_PIXEL;
        let mut le = [0u8; 4];
        le.copy_from_slice(&self.bytes[at..at + BYTES_PER_PIXEL]);
        Some(i32::from_le_bytes(le))
    }

    pub fn set(&mut self, x: i32, y: i32, depth: i32) -> bool {
        let Some(idx) = self.dims.index(x, y) else {
            return false;
        };
        let at = idx * BYTES_PER_PIXEL;
        self.bytes[at..at + BYTES_PER_PIXEL].copy_from_slice(&depth.to_le_bytes());
        true
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_clear_writes_bgra_pattern() {
        let dims = Dimensions::new(8, 4);
        let mut raster = RasterBuffer::filled(dims, Bgra::from(Rgb::default()));
        raster.clear(Rgb::new(0, 127, 255).into());
        assert_eq!(raster.as_bytes().len(), 8 * 4 * 4);
        for px in raster.as_bytes().chunks_exact(4) {
            assert_eq!(px, [255, 127, 0, 255]);
        }
    }

    #[test]
    fn depth_clear_writes_little_endian() {
        let mut depth = DepthBuffer::filled(Dimensions::new(3, 3), 0);
        depth.clear(1000);
        for px in depth.as_bytes().chunks_exact(4) {
            assert_eq!(px, [0xE8, 0x03, 0x00, 0x00]);
        }
        depth.clear(-2);
        assert_eq!(depth.get(2, 2), Some(-2));
        assert_eq!(&depth.as_bytes()[..4], [0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn off_grid_coordinates_are_ignored() {
        let dims = Dimensions::new(4, 4);
        let mut raster = RasterBuffer::filled(dims, Rgb::new(1, 2, 3).into());
        assert!(!raster.set(-1, 0, Rgb::default().into()));
        assert!(!raster.set(4, 0, Rgb::default().into()));
        assert!(raster.set(3, 3, Rgb::new(9, 9, 9).into()));
        assert_eq!(raster.get(3, 3), Some(Rgb::new(9, 9, 9).into()));
        assert_eq!(raster.get(0, 4), None);
    }

    #[test]
    fn from_bytes_checks_length() {
        let dims = Dimensions::new(2, 2);
        assert!(DepthBuffer::from_bytes(dims, vec![0; 16]).is_ok());
        assert_eq!(
            RasterBuffer::from_bytes(dims, vec![0; 15]).unwrap_err(),
            BufferError::Length {
                expected: 16,
                actual: 15,
                width: 2,
                height: 2
            }
        );
    }

    #[test]
    fn default_grid_is_one_million_pixels() {
        assert_eq!(Dimensions::default().pixel_count(), 1_000_000);
        assert_eq!(Dimensions::default().byte_len(), 4_000_000);
    }
}
