//! Image assembly and PNG encoding for quantized measurement planes.

pub mod assemble;
pub mod png;

pub use assemble::{assemble_plane, ChannelLayout, ImageBuffer};
pub use png::encode_png;

use compositor::QuantizedPlane;
use tile_common::TileResult;

/// Assemble a quantized plane and encode it as PNG in one step.
pub fn plane_to_png(plane: &QuantizedPlane, compression_level: u32) -> TileResult<Vec<u8>> {
    let buffer = assemble_plane(plane);
    encode_png(&buffer, compression_level)
}
