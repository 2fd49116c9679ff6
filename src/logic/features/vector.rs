//! Feature Vector - Core data structure for ML input
//!
//! Named, ordered values plus the layout hash of the name list. Serializes as
//! a JSON object whose keys keep the vector order.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::layout::{compute_layout_hash, FeatureSchema};

/// Ordered mapping from feature name to value
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Arc<[String]>,
    layout_hash: u32,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Vector laid out by `schema`; `values` must follow the schema order
    pub(crate) fn with_schema(schema: &FeatureSchema, values: Vec<f64>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self {
            names: schema.shared_names(),
            layout_hash: schema.hash(),
            values,
        }
    }

    /// Build from arbitrary (name, value) pairs, in the given order
    #[cfg(test)]
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<f64>) = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .unzip();
        let layout_hash = compute_layout_hash(&names);

        Self {
            names: names.into(),
            layout_hash,
            values,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn layout_hash(&self) -> u32 {
        self.layout_hash
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Compact JSON form for debug logs
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "layout_hash": format!("{:08x}", self.layout_hash),
            "features": self,
        })
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
