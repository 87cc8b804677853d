//! Dataset keys: ordered field lists identifying one dataset.

use serde::{Deserialize, Serialize};

use crate::error::{TileError, TileResult};

/// An ordered mapping from key-name to string value identifying a dataset.
///
/// Field order is significant: it follows the driver's declared key names
/// and fixes the enumeration order when compound fields are expanded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetKey {
    fields: Vec<(String, String)>,
}

impl DatasetKey {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Build a key by zipping declared key names with path values.
    /// The two lists must have equal length.
    pub fn from_names_and_values(names: &[&str], values: &[String]) -> TileResult<Self> {
        if names.len() != values.len() {
            return Err(TileError::Validation(format!(
                "expected {} key values, got {}",
                names.len(),
                values.len()
            )));
        }
        Ok(Self {
            fields: names
                .iter()
                .map(|n| n.to_string())
                .zip(values.iter().cloned())
                .collect(),
        })
    }

    /// Look up a field value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replace a field value, returning whether the field existed.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        for (n, v) in &mut self.fields {
            if n == name {
                *v = value.into();
                return true;
            }
        }
        false
    }

    /// Iterate fields in declared order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl std::fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (_, v) in &self.fields {
            if !first {
                write!(f, "/")?;
            }
            write!(f, "{}", v)?;
            first = false;
        }
        Ok(())
    }
}
