//! Uncompressed 24-bit bitmap encoding.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::terrain::PixelBuffer;

/// `"BM"` read as a little-endian u16.
pub const BITMAP_MAGIC: u16 = 0x4D42;
pub const FILE_HEADER_LEN: u32 = 14;
pub const INFO_HEADER_LEN: u32 = 40;
/// Offset of the first pixel byte; both headers, no palette.
pub const PIXEL_DATA_OFFSET: u32 = FILE_HEADER_LEN + INFO_HEADER_LEN;
pub const BYTES_PER_PIXEL: u32 = 3;
/// Pixels per meter written for each DPI unit.
const PPM_PER_DPI: f32 = 39.0;

/// Errors that can occur while writing or reading bitmaps.
#[derive(Error, Debug)]
pub enum BitmapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed bitmap: {0}")]
    Format(String),
    #[error("Invalid bitmap dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Pixel ({x}, {y}) is outside the {width}x{height} image")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
}

/// Padding bytes after each row of `width` pixels.
///
/// Equal to the usual `(4 - 3 * width % 4) % 4` since `3 * width` and
/// `-width` agree modulo 4.
pub fn row_padding(width: u32) -> u32 {
    width % 4
}

/// Bytes per row including padding.
pub fn row_stride(width: u32) -> u64 {
    width as u64 * BYTES_PER_PIXEL as u64 + row_padding(width) as u64
}

/// How the header's size fields are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeFields {
    /// File size `54 + 3*w*h + 2*h` and image size `3*w*h`.
    ///
    /// The file size only matches the real length when `width % 4 == 2`.
    #[default]
    Legacy,
    /// Both fields describe the bytes actually written.
    Exact,
}

impl SizeFields {
    /// Value written to the file header's size field.
    fn file_size(self, width: u32, height: u32) -> u64 {
        let (w, h) = (width as u64, height as u64);
        match self {
            SizeFields::Legacy => PIXEL_DATA_OFFSET as u64 + BYTES_PER_PIXEL as u64 * w * h + h * 2,
            SizeFields::Exact => expected_file_size(width, height),
        }
    }

    /// Value written to the info header's image size field.
    fn image_size(self, width: u32, height: u32) -> u64 {
        match self {
            SizeFields::Legacy => BYTES_PER_PIXEL as u64 * width as u64 * height as u64,
            SizeFields::Exact => row_stride(width) * height as u64,
        }
    }
}

/// Options for bitmap export.
#[derive(Debug, Clone, Default)]
pub struct BitmapOptions {
    /// Dots per inch recorded in the header; 0 leaves the resolution unset.
    pub dpi: f32,
    /// Header size field policy.
    pub size_fields: SizeFields,
}

/// Combined file and info header of a 24-bit bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapHeader {
    pub magic: u16,
    pub file_size: u32,
    pub reserved1: u16,
    pub reserved2: u16,
    pub pixel_offset: u32,
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_ppm: i32,
    pub y_ppm: i32,
    pub colors_used: u32,
    pub important_colors: u32,
}

impl BitmapHeader {
    /// Builds the header for a `width x height` image.
    pub fn new(width: u32, height: u32, options: &BitmapOptions) -> Result<Self, BitmapError> {
        let too_large = || BitmapError::InvalidDimensions { width, height };
        if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(too_large());
        }

        let file_size = u32::try_from(options.size_fields.file_size(width, height)).map_err(|_| too_large())?;
        let image_size = u32::try_from(options.size_fields.image_size(width, height)).map_err(|_| too_large())?;
        let ppm = (options.dpi * PPM_PER_DPI) as i32;

        Ok(Self {
            magic: BITMAP_MAGIC,
            file_size,
            reserved1: 0,
            reserved2: 0,
            pixel_offset: PIXEL_DATA_OFFSET,
            header_size: INFO_HEADER_LEN,
            width: width as i32,
            height: height as i32,
            planes: 1,
            bit_count: (BYTES_PER_PIXEL * 8) as u16,
            compression: 0,
            image_size,
            x_ppm: ppm,
            y_ppm: ppm,
            colors_used: 0,
            important_colors: 0,
        })
    }

    /// Serializes both headers in little-endian order.
    pub fn to_bytes(&self) -> [u8; PIXEL_DATA_OFFSET as usize] {
        let mut out = [0u8; PIXEL_DATA_OFFSET as usize];
        let mut o = 0;
        let mut put = |bytes: &[u8]| {
            out[o..o + bytes.len()].copy_from_slice(bytes);
            o += bytes.len();
        };

        put(&self.magic.to_le_bytes());
        put(&self.file_size.to_le_bytes());
        put(&self.reserved1.to_le_bytes());
        put(&self.reserved2.to_le_bytes());
        put(&self.pixel_offset.to_le_bytes());

        put(&self.header_size.to_le_bytes());
        put(&self.width.to_le_bytes());
        put(&self.height.to_le_bytes());
        put(&self.planes.to_le_bytes());
        put(&self.bit_count.to_le_bytes());
        put(&self.compression.to_le_bytes());
        put(&self.image_size.to_le_bytes());
        put(&self.x_ppm.to_le_bytes());
        put(&self.y_ppm.to_le_bytes());
        put(&self.colors_used.to_le_bytes());
        put(&self.important_colors.to_le_bytes());

        out
    }

    /// Decodes and validates a header produced by [`BitmapHeader::to_bytes`].
    ///
    /// Rejects anything other than an uncompressed, palette-free, 24-bit,
    /// bottom-up image.
    pub fn parse(bytes: &[u8; PIXEL_DATA_OFFSET as usize]) -> Result<Self, BitmapError> {
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        let u32_at = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        let i32_at = |i: usize| i32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);

        let header = Self {
            magic: u16_at(0),
            file_size: u32_at(2),
            reserved1: u16_at(6),
            reserved2: u16_at(8),
            pixel_offset: u32_at(10),
            header_size: u32_at(14),
            width: i32_at(18),
            height: i32_at(22),
            planes: u16_at(26),
            bit_count: u16_at(28),
            compression: u32_at(30),
            image_size: u32_at(34),
            x_ppm: i32_at(38),
            y_ppm: i32_at(42),
            colors_used: u32_at(46),
            important_colors: u32_at(50),
        };

        if header.magic != BITMAP_MAGIC {
            return Err(BitmapError::Format(format!("bad magic {:#06x}", header.magic)));
        }
        if header.pixel_offset != PIXEL_DATA_OFFSET || header.header_size != INFO_HEADER_LEN {
            return Err(BitmapError::Format(format!(
                "unsupported layout: pixel offset {}, info header size {}",
                header.pixel_offset, header.header_size
            )));
        }
        if header.bit_count != 24 || header.compression != 0 || header.planes != 1 {
            return Err(BitmapError::Format(format!(
                "expected uncompressed 24-bit data, got {} bpp with compression {}",
                header.bit_count, header.compression
            )));
        }
        if header.width <= 0 || header.height <= 0 {
            return Err(BitmapError::Format(format!(
                "unsupported dimensions {}x{}",
                header.width, header.height
            )));
        }

        Ok(header)
    }

    /// Image dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width.max(0) as u32, self.height.max(0) as u32)
    }
}

/// Length in bytes of an encoded `width x height` image.
pub fn expected_file_size(width: u32, height: u32) -> u64 {
    PIXEL_DATA_OFFSET as u64 + row_stride(width) * height as u64
}

/// Encodes `buffer` as a bitmap into `writer`.
///
/// Rows are written in buffer order starting at `y = 0`, each followed by
/// [`row_padding`] zero bytes.
pub fn encode_bitmap<W: Write>(
    buffer: &PixelBuffer,
    writer: &mut W,
    options: &BitmapOptions,
) -> Result<(), BitmapError> {
    let header = BitmapHeader::new(buffer.width(), buffer.height(), options)?;
    write_bitmap(&header, buffer, writer)
}

fn write_bitmap<W: Write>(
    header: &BitmapHeader,
    buffer: &PixelBuffer,
    writer: &mut W,
) -> Result<(), BitmapError> {
    writer.write_all(&header.to_bytes())?;

    let padding = vec![0u8; row_padding(buffer.width()) as usize];
    let mut row_bytes = Vec::with_capacity(buffer.width() as usize * BYTES_PER_PIXEL as usize);
    for row in buffer.rows() {
        row_bytes.clear();
        for pixel in row {
            row_bytes.extend_from_slice(&pixel.to_bytes());
        }
        writer.write_all(&row_bytes)?;
        writer.write_all(&padding)?;
    }

    Ok(())
}

/// Writes `buffer` to a new bitmap file at `path`.
///
/// The header is built before the file is opened, so an image that cannot
/// be encoded leaves any existing file at `path` untouched.
///
/// # Arguments
/// * `buffer` - Classified pixels to encode
/// * `path` - Output file path; an existing file is truncated
/// * `options` - Resolution and header settings
///
/// # Returns
/// `Ok(())` on success, or an error if export fails
pub fn export_bitmap(buffer: &PixelBuffer, path: &Path, options: &BitmapOptions) -> Result<(), BitmapError> {
    let header = BitmapHeader::new(buffer.width(), buffer.height(), options)?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_bitmap(&header, buffer, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Reads and validates the header of the bitmap at `path`.
pub fn read_header(path: &Path) -> Result<BitmapHeader, BitmapError> {
    let mut file = File::open(path)?;
    read_header_from(&mut file)
}

/// Reads the header of the bitmap at `path` along with the file's length.
pub fn read_header_with_len(path: &Path) -> Result<(BitmapHeader, u64), BitmapError> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let header = read_header_from(&mut file)?;
    Ok((header, len))
}

pub(crate) fn read_header_from<R: Read>(reader: &mut R) -> Result<BitmapHeader, BitmapError> {
    let mut bytes = [0u8; PIXEL_DATA_OFFSET as usize];
    reader.read_exact(&mut bytes).map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => {
            BitmapError::Format("file is shorter than the bitmap header".to_string())
        }
        _ => BitmapError::Io(e),
    })?;
    BitmapHeader::parse(&bytes)
}
