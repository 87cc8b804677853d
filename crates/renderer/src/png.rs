//! PNG encoding for grayscale image data.
//!
//! Two encoding modes, matching the channel layouts the assembler
//! produces:
//! - **Grayscale (color type 0)**: 8-bit single-channel planes.
//! - **Grayscale+alpha (color type 4)**: 16-bit planes packed across
//!   two 8-bit channels.

use std::io::Write;

use tile_common::{TileError, TileResult};

use crate::assemble::{ChannelLayout, ImageBuffer};

/// Encode an assembled image buffer as PNG.
///
/// `compression_level` is the zlib level (0-9).
pub fn encode_png(buffer: &ImageBuffer, compression_level: u32) -> TileResult<Vec<u8>> {
    let bytes_per_pixel = buffer.layout.bytes_per_pixel();
    let expected = buffer.width * buffer.height * bytes_per_pixel;
    if buffer.pixels.len() != expected {
        return Err(TileError::Render(format!(
            "pixel buffer length {} does not match {}x{} {:?}",
            buffer.pixels.len(),
            buffer.width,
            buffer.height,
            buffer.layout
        )));
    }

    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    // IHDR chunk
    let color_type = match buffer.layout {
        ChannelLayout::Gray => 0,
        ChannelLayout::GrayAlpha => 4,
    };
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(buffer.width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(buffer.height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(color_type);
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    // IDAT chunk (image data)
    let idat_data = deflate_idat(
        &buffer.pixels,
        buffer.width * bytes_per_pixel,
        buffer.height,
        compression_level,
    )
    .map_err(|e| TileError::Render(format!("IDAT compression failed: {}", e)))?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    // IEND chunk
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    // Write length
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());

    // Write chunk type
    png.extend_from_slice(chunk_type);

    // Write data
    png.extend_from_slice(data);

    // Write CRC
    let crc_data = [chunk_type.as_slice(), data].concat();
    let crc = crc32fast::hash(&crc_data);
    png.extend_from_slice(&crc.to_be_bytes());
}

/// Deflate image data for the IDAT chunk.
fn deflate_idat(
    pixels: &[u8],
    row_bytes: usize,
    height: usize,
    compression_level: u32,
) -> Result<Vec<u8>, std::io::Error> {
    // Add filter byte (0 = no filter) to each scanline
    let mut uncompressed = Vec::with_capacity(height * (1 + row_bytes));
    for y in 0..height {
        uncompressed.push(0); // filter type: none
        let row_start = y * row_bytes;
        uncompressed.extend_from_slice(&pixels[row_start..row_start + row_bytes]);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(
        Vec::new(),
        flate2::Compression::new(compression_level.min(9)),
    );
    encoder.write_all(&uncompressed)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(pixels: Vec<u8>, width: usize, height: usize) -> ImageBuffer {
        ImageBuffer {
            layout: ChannelLayout::Gray,
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn test_grayscale_header() {
        let png = encode_png(&gray(vec![0, 128, 255, 64], 2, 2), 6).unwrap();

        // Signature
        assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        // IHDR: width 2, height 2, bit depth 8, color type 0
        assert_eq!(&png[16..20], &2u32.to_be_bytes());
        assert_eq!(&png[20..24], &2u32.to_be_bytes());
        assert_eq!(png[24], 8);
        assert_eq!(png[25], 0);
    }

    #[test]
    fn test_gray_alpha_header() {
        let buffer = ImageBuffer {
            layout: ChannelLayout::GrayAlpha,
            width: 2,
            height: 1,
            pixels: vec![0x12, 0x34, 0xFF, 0xFF],
        };
        let png = encode_png(&buffer, 6).unwrap();
        assert_eq!(png[25], 4); // color type 4 = gray + alpha
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let buffer = gray((0..=255).collect(), 16, 16);
        let a = encode_png(&buffer, 6).unwrap();
        let b = encode_png(&buffer, 6).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = encode_png(&gray(vec![1, 2, 3], 2, 2), 6);
        assert!(matches!(result, Err(TileError::Render(_))));
    }

    #[test]
    fn test_iend_terminates_stream() {
        let png = encode_png(&gray(vec![9], 1, 1), 0).unwrap();
        let tail = &png[png.len() - 12..];
        assert_eq!(&tail[4..8], b"IEND");
    }
}
