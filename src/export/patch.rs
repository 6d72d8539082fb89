//! In-place pixel patching of an existing bitmap.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::bmp::{
    expected_file_size, read_header_from, row_stride, BitmapError, BitmapHeader, BYTES_PER_PIXEL,
    PIXEL_DATA_OFFSET,
};
use crate::terrain::Pixel;

/// A cursor over the pixel bytes of a bitmap opened for read and write.
///
/// The session validates the header on open and never changes the file
/// length: every write replaces exactly one existing triple.
#[derive(Debug)]
pub struct PatchSession {
    file: File,
    header: BitmapHeader,
    width: u32,
    height: u32,
}

impl PatchSession {
    /// Opens `path` and checks it holds a `width x height` image.
    ///
    /// # Arguments
    /// * `path` - Existing bitmap file
    /// * `width` - Expected image width
    /// * `height` - Expected image height
    pub fn open(path: &Path, width: u32, height: u32) -> Result<Self, BitmapError> {
        let session = Self::open_existing(path)?;
        if (session.width, session.height) != (width, height) {
            return Err(BitmapError::Format(format!(
                "expected a {}x{} image, found {}x{}",
                width, height, session.width, session.height
            )));
        }
        Ok(session)
    }

    /// Opens `path`, taking the dimensions from its header.
    pub fn open_existing(path: &Path) -> Result<Self, BitmapError> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let header = read_header_from(&mut file)?;
        let (width, height) = header.dimensions();

        let expected = expected_file_size(width, height);
        let actual = file.metadata()?.len();
        if actual < expected {
            return Err(BitmapError::Format(format!(
                "file holds {} bytes but a {}x{} image needs {}",
                actual, width, height, expected
            )));
        }

        Ok(Self {
            file,
            header,
            width,
            height,
        })
    }

    pub fn header(&self) -> &BitmapHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte offset of pixel `(x, y)` within the file.
    pub fn pixel_offset(&self, x: u32, y: u32) -> Option<u64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(
            PIXEL_DATA_OFFSET as u64
                + y as u64 * row_stride(self.width)
                + x as u64 * BYTES_PER_PIXEL as u64,
        )
    }

    /// Moves the cursor to the first byte of pixel `(x, y)`.
    pub fn seek_to_pixel(&mut self, x: u32, y: u32) -> Result<(), BitmapError> {
        let offset = self.pixel_offset(x, y).ok_or(BitmapError::OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Reads the triple at the cursor and advances past it.
    pub fn read_triple(&mut self) -> Result<Pixel, BitmapError> {
        let mut bytes = [0u8; 3];
        self.file.read_exact(&mut bytes)?;
        Ok(Pixel::from_bytes(bytes))
    }

    /// Overwrites the triple at the cursor and advances past it.
    pub fn write_triple(&mut self, pixel: Pixel) -> Result<(), BitmapError> {
        self.file.write_all(&pixel.to_bytes())?;
        Ok(())
    }

    /// Reads pixel `(x, y)`.
    pub fn read_pixel(&mut self, x: u32, y: u32) -> Result<Pixel, BitmapError> {
        self.seek_to_pixel(x, y)?;
        self.read_triple()
    }

    /// Overwrites pixel `(x, y)`.
    pub fn write_pixel(&mut self, x: u32, y: u32, pixel: Pixel) -> Result<(), BitmapError> {
        self.seek_to_pixel(x, y)?;
        self.write_triple(pixel)
    }

    /// Flushes pending writes and closes the file.
    pub fn close(mut self) -> Result<(), BitmapError> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{export_bitmap, BitmapOptions, SizeFields};
    use crate::terrain::PixelBuffer;
    use tempfile::tempdir;

    fn checkered(width: u32, height: u32) -> PixelBuffer {
        let mut buffer = PixelBuffer::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let pixel = match (x + 2 * y) % 3 {
                    0 => Pixel::OCEAN,
                    1 => Pixel::land((10 + x * 7 + y) as u8),
                    _ => Pixel::STAR,
                };
                buffer.set(x, y, pixel);
            }
        }
        buffer
    }

    #[test]
    fn test_patch_reads_back_every_pixel() {
        let dir = tempdir().unwrap();
        for width in [4u32, 5, 6, 7] {
            for size_fields in [SizeFields::Legacy, SizeFields::Exact] {
                let path = dir.path().join(format!("rt_{}_{:?}.bmp", width, size_fields));
                let buffer = checkered(width, 6);
                export_bitmap(&buffer, &path, &BitmapOptions { dpi: 0.0, size_fields }).unwrap();

                let mut session = PatchSession::open(&path, width, 6).unwrap();
                for y in 0..6 {
                    for x in 0..width {
                        assert_eq!(session.read_pixel(x, y).unwrap(), buffer.get(x, y).unwrap());
                    }
                }
                session.close().unwrap();
            }
        }
    }

    #[test]
    fn test_header_matches_export_options() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hdr.bmp");
        let options = BitmapOptions { dpi: 72.0, size_fields: SizeFields::Exact };
        export_bitmap(&checkered(6, 4), &path, &options).unwrap();

        let session = PatchSession::open_existing(&path).unwrap();
        assert_eq!((session.width(), session.height()), (6, 4));
        assert_eq!(*session.header(), BitmapHeader::new(6, 4, &options).unwrap());
        assert_eq!(session.header().file_size as u64, std::fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_sequential_reads_follow_cursor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("seq.bmp");
        let buffer = checkered(5, 2);
        export_bitmap(&buffer, &path, &BitmapOptions::default()).unwrap();

        let mut session = PatchSession::open(&path, 5, 2).unwrap();
        session.seek_to_pixel(1, 1).unwrap();
        assert_eq!(session.read_triple().unwrap(), buffer.get(1, 1).unwrap());
        assert_eq!(session.read_triple().unwrap(), buffer.get(2, 1).unwrap());
    }

    #[test]
    fn test_write_preserves_length_and_neighbors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("patch.bmp");
        let buffer = checkered(7, 3);
        export_bitmap(&buffer, &path, &BitmapOptions::default()).unwrap();
        let len_before = std::fs::metadata(&path).unwrap().len();

        let mut session = PatchSession::open(&path, 7, 3).unwrap();
        let marker = Pixel::new(235, 220, 220);
        session.write_pixel(6, 1, marker).unwrap();
        assert_eq!(session.read_pixel(6, 1).unwrap(), marker);
        assert_eq!(session.read_pixel(5, 1).unwrap(), buffer.get(5, 1).unwrap());
        assert_eq!(session.read_pixel(0, 2).unwrap(), buffer.get(0, 2).unwrap());
        session.close().unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), len_before);
    }

    #[test]
    fn test_out_of_bounds_seek() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("oob.bmp");
        export_bitmap(&checkered(4, 4), &path, &BitmapOptions::default()).unwrap();

        let mut session = PatchSession::open(&path, 4, 4).unwrap();
        assert!(matches!(
            session.seek_to_pixel(4, 0),
            Err(BitmapError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dims.bmp");
        export_bitmap(&checkered(8, 8), &path, &BitmapOptions::default()).unwrap();

        assert!(matches!(
            PatchSession::open(&path, 9, 8),
            Err(BitmapError::Format(_))
        ));
    }

    #[test]
    fn test_truncated_file_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trunc.bmp");
        export_bitmap(&checkered(8, 8), &path, &BitmapOptions::default()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();

        assert!(matches!(
            PatchSession::open(&path, 8, 8),
            Err(BitmapError::Format(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            PatchSession::open(&dir.path().join("nope.bmp"), 4, 4),
            Err(BitmapError::Io(_))
        ));
    }

    #[test]
    fn test_non_bitmap_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("text.bmp");
        std::fs::write(&path, vec![b'x'; 200]).unwrap();
        assert!(matches!(
            PatchSession::open(&path, 4, 4),
            Err(BitmapError::Format(_))
        ));
    }
}
