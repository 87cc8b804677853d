//! Multi-source tile compositing and value quantization.
//!
//! The pipeline for one tile request:
//! 1. Expand compound key fields into concrete dataset keys
//!    ([`enumerate`]).
//! 2. Fetch each intersecting section's masked grid concurrently
//!    ([`compose`]).
//! 3. Upsample coarser grids onto the finest resolution ([`reconcile`]).
//! 4. Merge partial grids into one canvas ([`merge`]).
//! 5. Encode physical units into an 8- or 16-bit plane ([`quantize`]).

pub mod compose;
pub mod config;
pub mod enumerate;
pub mod kinds;
pub mod merge;
pub mod quantize;
pub mod reconcile;

pub use compose::TileCompositor;
pub use config::CompositorConfig;
pub use enumerate::{expand_key, ConcreteKey, KeyEnumeration};
pub use kinds::{DataKind, DataKindRegistry};
pub use merge::MergePolicy;
pub use quantize::{OutputDepth, QuantizationRule, QuantizedPlane, Transform};
