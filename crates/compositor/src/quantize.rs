//! Lossy quantization of physical units into 8- or 16-bit planes.
//!
//! Each data-kind declares one [`QuantizationRule`]: a monotonically
//! non-decreasing transform from raw units to output codes plus the
//! output depth. The depth's maximum value is reserved as the nodata
//! sentinel, written for masked pixels after the transform; rule
//! validation rejects any transform that could reach the sentinel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use tile_common::{MaskedGrid, TileError, TileResult};

/// Output sample depth of a quantized plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputDepth {
    U8,
    U16,
}

impl OutputDepth {
    /// The reserved nodata sentinel: the maximum value of the dtype.
    pub fn sentinel(&self) -> u16 {
        match self {
            OutputDepth::U8 => u8::MAX as u16,
            OutputDepth::U16 => u16::MAX,
        }
    }

    /// Bytes per sample in the assembled image buffer.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            OutputDepth::U8 => 1,
            OutputDepth::U16 => 2,
        }
    }
}

/// One linear piece of a piecewise transform:
/// `code = floor((raw - lo) * scale) + offset` for `lo <= raw < hi`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub lo: f32,
    pub hi: f32,
    pub scale: f32,
    pub offset: u16,
}

impl Segment {
    /// Largest code this segment can emit (at raw values just below `hi`).
    fn max_code(&self) -> u16 {
        let span = ((self.hi - self.lo) * self.scale).floor() as u32;
        (self.offset as u32 + span).min(u16::MAX as u32) as u16
    }
}

/// The transform of a quantization rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transform {
    /// Ordered contiguous segments; raw values below the first segment
    /// clamp to code 0, values at or above the table end saturate to
    /// `saturate` (never wrap).
    Piecewise {
        segments: Vec<Segment>,
        saturate: u16,
    },
    /// `clamp(floor(raw + bias), 0, max_code)` for signed fields shifted
    /// into unsigned range.
    BiasClamp { bias: f32, max_code: u16 },
    /// `clamp(floor(raw), 0, max_code)`.
    Passthrough { max_code: u16 },
}

/// A per-data-kind quantization rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizationRule {
    pub depth: OutputDepth,
    pub transform: Transform,
    /// Source-library nodata code; raw values equal to it encode as 0.
    pub input_nodata: Option<f32>,
}

impl QuantizationRule {
    /// Encode one raw value into an output code. Pure; masked pixels are
    /// handled by [`quantize`], not here.
    pub fn encode(&self, raw: f32) -> u16 {
        if let Some(nodata) = self.input_nodata {
            if raw == nodata {
                return 0;
            }
        }

        match &self.transform {
            Transform::Piecewise { segments, saturate } => {
                if let Some(first) = segments.first() {
                    if raw < first.lo {
                        return 0;
                    }
                }
                for segment in segments {
                    if raw < segment.hi {
                        let code = ((raw - segment.lo) * segment.scale).floor() as u32
                            + segment.offset as u32;
                        return code.min(u16::MAX as u32) as u16;
                    }
                }
                *saturate
            }
            Transform::BiasClamp { bias, max_code } => {
                let shifted = (raw + bias).floor();
                if shifted <= 0.0 {
                    0
                } else {
                    (shifted as u32).min(*max_code as u32) as u16
                }
            }
            Transform::Passthrough { max_code } => {
                let floored = raw.floor();
                if floored <= 0.0 {
                    0
                } else {
                    (floored as u32).min(*max_code as u32) as u16
                }
            }
        }
    }

    /// Rewrite raw values equal to the input nodata code to 0 in place.
    ///
    /// Must run on each section grid before compositing: the nodata code
    /// is the largest raw value, so under Maximum merge it would outrank
    /// a genuine reading from an overlapping section.
    pub fn apply_input_nodata(&self, grid: &mut MaskedGrid) {
        let Some(nodata) = self.input_nodata else {
            return;
        };
        for (value, masked) in grid.data.iter_mut().zip(&grid.mask) {
            if !masked && *value == nodata {
                *value = 0.0;
            }
        }
    }

    /// Largest code this rule can emit for any input.
    pub fn max_output_code(&self) -> u16 {
        match &self.transform {
            Transform::Piecewise { segments, saturate } => segments
                .iter()
                .map(Segment::max_code)
                .chain(std::iter::once(*saturate))
                .max()
                .unwrap_or(0),
            Transform::BiasClamp { max_code, .. } => *max_code,
            Transform::Passthrough { max_code } => *max_code,
        }
    }

    /// Validate the rule at registration time.
    ///
    /// Rejects sentinel collisions (any reachable code at or above the
    /// sentinel) and malformed piecewise tables.
    pub fn validate(&self) -> TileResult<()> {
        if self.max_output_code() >= self.depth.sentinel() {
            return Err(TileError::Consistency(format!(
                "transform output range reaches the nodata sentinel {}",
                self.depth.sentinel()
            )));
        }

        if let Transform::Piecewise { segments, .. } = &self.transform {
            if segments.is_empty() {
                return Err(TileError::Consistency(
                    "piecewise transform has no segments".to_string(),
                ));
            }
            for pair in segments.windows(2) {
                if pair[0].hi != pair[1].lo {
                    return Err(TileError::Consistency(format!(
                        "piecewise segments not contiguous at {}",
                        pair[0].hi
                    )));
                }
            }
            for segment in segments {
                if segment.hi <= segment.lo || segment.scale <= 0.0 {
                    return Err(TileError::Consistency(format!(
                        "malformed piecewise segment [{}, {})",
                        segment.lo, segment.hi
                    )));
                }
            }
        }

        Ok(())
    }
}

/// A quantized output plane.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedPlane {
    pub depth: OutputDepth,
    pub width: usize,
    pub height: usize,
    /// Output codes; for U8 planes every sample fits in the low byte.
    pub samples: Vec<u16>,
}

/// Quantize a composited canvas under a rule.
///
/// Masked pixels are written as the depth's sentinel after the transform.
pub fn quantize(canvas: &MaskedGrid, rule: &QuantizationRule) -> QuantizedPlane {
    let sentinel = rule.depth.sentinel();
    let width = canvas.width;

    let mut samples = vec![0u16; canvas.len()];
    samples
        .par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(row, out_row)| {
            let start = row * width;
            for (col, out) in out_row.iter_mut().enumerate() {
                let idx = start + col;
                *out = if canvas.mask[idx] {
                    sentinel
                } else {
                    rule.encode(canvas.data[idx])
                };
            }
        });

    QuantizedPlane {
        depth: rule.depth,
        width,
        height: canvas.height,
        samples,
    }
}
