//! Export module for saving planet images as bitmaps.
//!
//! Writes uncompressed 24-bit bitmaps and patches individual pixels of an
//! existing file in place.

mod bmp;
mod patch;

pub use bmp::{
    encode_bitmap, expected_file_size, export_bitmap, read_header, read_header_with_len,
    row_padding, row_stride, BitmapError, BitmapHeader, BitmapOptions, SizeFields, BITMAP_MAGIC, BYTES_PER_PIXEL,
    PIXEL_DATA_OFFSET,
};
pub use patch::PatchSession;
