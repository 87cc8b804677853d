//! Quantized plane to image buffer assembly.
//!
//! Maps output depth to channel layout: 8-bit planes become single-channel
//! grayscale; 16-bit planes are split across grayscale+alpha with the high
//! byte in the gray channel and the low byte in alpha.

use compositor::{OutputDepth, QuantizedPlane};

/// Channel layout of an assembled image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// One byte per pixel.
    Gray,
    /// Two bytes per pixel: gray then alpha.
    GrayAlpha,
}

impl ChannelLayout {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::GrayAlpha => 2,
        }
    }
}

/// A raw image buffer ready for the PNG encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub layout: ChannelLayout,
    pub width: usize,
    pub height: usize,
    /// Interleaved channel bytes, row-major.
    pub pixels: Vec<u8>,
}

/// Assemble a quantized plane into its transport channel layout.
pub fn assemble_plane(plane: &QuantizedPlane) -> ImageBuffer {
    match plane.depth {
        OutputDepth::U8 => ImageBuffer {
            layout: ChannelLayout::Gray,
            width: plane.width,
            height: plane.height,
            pixels: plane.samples.iter().map(|&s| s as u8).collect(),
        },
        OutputDepth::U16 => {
            let mut pixels = Vec::with_capacity(plane.samples.len() * 2);
            for &sample in &plane.samples {
                pixels.push((sample >> 8) as u8);
                pixels.push(sample as u8);
            }
            ImageBuffer {
                layout: ChannelLayout::GrayAlpha,
                width: plane.width,
                height: plane.height,
                pixels,
            }
        }
    }
}
