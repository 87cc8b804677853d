//! Registry of data-kinds: quantization rule plus merge policy per kind.
//!
//! Kinds are registered and validated at startup; an unknown kind at
//! request time is a validation error, never a reflective lookup.

use std::collections::HashMap;

use tile_common::{TileError, TileResult};

use crate::merge::MergePolicy;
use crate::quantize::{OutputDepth, QuantizationRule, Segment, Transform};

/// One registered data-kind.
#[derive(Debug, Clone)]
pub struct DataKind {
    pub name: String,
    pub rule: QuantizationRule,
    pub merge: MergePolicy,
}

/// Registry mapping data-kind name to its rule and merge policy.
#[derive(Debug, Clone, Default)]
pub struct DataKindRegistry {
    kinds: HashMap<String, DataKind>,
}

impl DataKindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The kind set served by the production endpoints.
    pub fn with_builtin_kinds() -> TileResult<Self> {
        let mut registry = Self::new();

        registry.register(DataKind {
            name: "pri60lv".to_string(),
            rule: precipitation_rate_rule(),
            merge: MergePolicy::Maximum,
        })?;

        for name in ["pphw10", "plts10", "cwm_height", "cwm_period", "cwm_direction"] {
            registry.register(DataKind {
                name: name.to_string(),
                rule: passthrough_u8_rule(),
                merge: MergePolicy::Overwrite,
            })?;
        }

        for name in ["wind_u", "wind_v"] {
            registry.register(DataKind {
                name: name.to_string(),
                rule: wind_component_rule(),
                merge: MergePolicy::Overwrite,
            })?;
        }

        Ok(registry)
    }

    /// Register a kind, validating its rule first.
    pub fn register(&mut self, kind: DataKind) -> TileResult<()> {
        kind.rule.validate()?;
        if self.kinds.contains_key(&kind.name) {
            return Err(TileError::Consistency(format!(
                "data kind {:?} registered twice",
                kind.name
            )));
        }
        self.kinds.insert(kind.name.clone(), kind);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DataKind> {
        self.kinds.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Precipitation rate (mm/h scaled by 100 in the source rasters):
///
/// ```text
/// uint8    :  raw (uint16)   (precipitation mm/h)
///  0 -   9 :    0 -     9    (< 0.10 mm/h, unit 0.01)
/// 10 -  58 :   10 -   499    (0.10 - 4.99 mm/h, unit 0.1)
/// 59 - 253 :  500 - 19900    (5.00 - 199.00 mm/h, unit 1)
/// 253      :      >= 19901   (saturated)
/// 255      :  no data
/// ```
pub fn precipitation_rate_rule() -> QuantizationRule {
    QuantizationRule {
        depth: OutputDepth::U8,
        transform: Transform::Piecewise {
            segments: vec![
                Segment {
                    lo: 0.0,
                    hi: 10.0,
                    scale: 1.0,
                    offset: 0,
                },
                Segment {
                    lo: 10.0,
                    hi: 500.0,
                    scale: 0.1,
                    offset: 10,
                },
                Segment {
                    lo: 500.0,
                    hi: 19901.0,
                    scale: 0.01,
                    offset: 59,
                },
            ],
            saturate: 253,
        },
        input_nodata: Some(u16::MAX as f32),
    }
}

/// Value-preserving 8-bit rule for categorical and pre-scaled products.
pub fn passthrough_u8_rule() -> QuantizationRule {
    QuantizationRule {
        depth: OutputDepth::U8,
        transform: Transform::Passthrough { max_code: 254 },
        input_nodata: None,
    }
}

/// Signed wind component in centi-m/s, shifted into unsigned 16-bit range.
pub fn wind_component_rule() -> QuantizationRule {
    QuantizationRule {
        depth: OutputDepth::U16,
        transform: Transform::BiasClamp {
            bias: 32768.0,
            max_code: 65534,
        },
        input_nodata: None,
    }
}
