use crate::error::{EngineError, Result};

const CHANNELS: usize = 4;

/// Row-major RGBA8 samples of a whole image.
///
/// Immutable once built; workers share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw RGBA8 bytes, checking that they match the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(EngineError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// A buffer where every pixel has the same color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * CHANNELS)
            .collect();
        Self { width, height, data }
    }

    pub fn from_rgba_image(image: &image::RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.as_raw().clone(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The red, green and blue samples of pixel `(x, y)`.
    ///
    /// The caller guarantees that the coordinate lies within the image.
    #[inline]
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// The RGB samples of one row segment `[left, right)`, in order.
    pub fn row(&self, y: u32, left: u32, right: u32) -> impl Iterator<Item = [u8; 3]> + '_ {
        let start = (y as usize * self.width as usize + left as usize) * CHANNELS;
        let end = (y as usize * self.width as usize + right as usize) * CHANNELS;
        self.data[start..end]
            .chunks_exact(CHANNELS)
            .map(|px| [px[0], px[1], px[2]])
    }

    /// Every pixel's RGB samples in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data.chunks_exact(CHANNELS).map(|px| [px[0], px[1], px[2]])
    }

    /// Overwrites one pixel. Only meant for building buffers before sharing them.
    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.data[i..i + CHANNELS].copy_from_slice(&rgba);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_mismatch_is_rejected() {
        let err = PixelBuffer::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, EngineError::BufferSize { expected: 16, actual: 15 }));
        assert!(PixelBuffer::new(2, 2, vec![0; 16]).is_ok());
        assert!(PixelBuffer::new(0, 0, Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn samples_are_row_major() {
        let mut buffer = PixelBuffer::filled(3, 2, [1, 2, 3, 255]);
        buffer.put_pixel(2, 1, [9, 8, 7, 255]);
        assert_eq!(buffer.rgb(0, 0), [1, 2, 3]);
        assert_eq!(buffer.rgb(2, 1), [9, 8, 7]);
        assert_eq!(&buffer.as_bytes()[20..24], &[9, 8, 7, 255]);

        let row: Vec<_> = buffer.row(1, 1, 3).collect();
        assert_eq!(row, vec![[1, 2, 3], [9, 8, 7]]);
        assert_eq!(buffer.pixels().count(), 6);
    }

    #[test]
    fn converts_from_image_crate() {
        let mut image = image::RgbaImage::new(4, 3);
        image.put_pixel(3, 2, image::Rgba([10, 20, 30, 40]));
        let buffer = PixelBuffer::from_rgba_image(&image);
        assert_eq!((buffer.width(), buffer.height()), (4, 3));
        assert_eq!(buffer.rgb(3, 2), [10, 20, 30]);
        assert_eq!(buffer.rgb(0, 0), [0, 0, 0]);
    }
}
