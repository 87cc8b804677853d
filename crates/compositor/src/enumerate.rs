//! Section enumeration: expanding compound key fields.
//!
//! A request key may carry comma-separated lists in its `section_x`,
//! `section_y` and `resolution` fields. Enumeration emits the cross-product
//! of concrete keys in the lexical order of the input lists, which fixes
//! the merge order downstream.

use tile_common::{DatasetKey, TileError, TileResult};

/// Key fields that accept comma-separated lists.
const SECTION_X: &str = "section_x";
const SECTION_Y: &str = "section_y";
const RESOLUTION: &str = "resolution";

/// One concrete dataset key produced by enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcreteKey {
    pub key: DatasetKey,
    /// Source resolution of this key. 1 when the key schema has no
    /// resolution field.
    pub resolution: u32,
}

/// The ordered set of concrete keys for one request.
#[derive(Debug, Clone)]
pub struct KeyEnumeration {
    pub keys: Vec<ConcreteKey>,
    /// The finest requested resolution; coarser grids are upsampled onto it.
    pub max_resolution: u32,
}

/// Expand a key template into the ordered cross-product of concrete keys.
///
/// Resolution filtering: with `max_res` the maximum of the requested list,
/// a resolution `r` is kept only if `r == max_res` or `max_res % r == 0`.
/// Others cannot be reconciled onto the finest grid and are silently
/// dropped.
pub fn expand_key(template: &DatasetKey) -> TileResult<KeyEnumeration> {
    let sections_x = split_field(template, SECTION_X);
    let sections_y = split_field(template, SECTION_Y);
    let resolutions = parse_resolutions(template)?;

    let max_resolution = resolutions.iter().copied().max().unwrap_or(1);
    let kept: Vec<u32> = resolutions
        .iter()
        .copied()
        .filter(|r| *r == max_resolution || max_resolution % *r == 0)
        .collect();

    let mut keys = Vec::new();
    for x in &sections_x {
        for y in &sections_y {
            for r in &kept {
                let mut key = template.clone();
                if let Some(x) = x {
                    key.set(SECTION_X, x.clone());
                }
                if let Some(y) = y {
                    key.set(SECTION_Y, y.clone());
                }
                if template.get(RESOLUTION).is_some() {
                    key.set(RESOLUTION, r.to_string());
                }
                keys.push(ConcreteKey {
                    key,
                    resolution: *r,
                });
            }
        }
    }

    Ok(KeyEnumeration {
        keys,
        max_resolution,
    })
}

/// Split a comma-list field, or yield one pass-through entry when the
/// field is absent from the key schema.
fn split_field(template: &DatasetKey, name: &str) -> Vec<Option<String>> {
    match template.get(name) {
        Some(value) => value.split(',').map(|s| Some(s.to_string())).collect(),
        None => vec![None],
    }
}

fn parse_resolutions(template: &DatasetKey) -> TileResult<Vec<u32>> {
    let Some(value) = template.get(RESOLUTION) else {
        return Ok(vec![1]);
    };

    let mut resolutions = Vec::new();
    for part in value.split(',') {
        let r: u32 = part.parse().map_err(|_| {
            TileError::Validation(format!("invalid resolution value: {:?}", part))
        })?;
        if r == 0 {
            return Err(TileError::Validation(
                "resolution must be > 0".to_string(),
            ));
        }
        resolutions.push(r);
    }
    Ok(resolutions)
}
