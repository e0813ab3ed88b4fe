//! Key-value configuration sets.
//!
//! A [`Properties`] set is what every component reads at initialization:
//! the stream engine, the vertex provider and the collaborator models. Values
//! are loosely typed (integer, real, text, boolean or list) and fetched with
//! typed accessors that report which key was wrong. Dimensioned values are
//! written as text with an explicit unit and fetched with
//! [`Properties::fetch_quantity`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PropertyError, UnitError};
use crate::units::{parse_in, Dimension};

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    List(Vec<PropertyValue>),
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u32> for PropertyValue {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// Ordered set of named configuration values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    entries: BTreeMap<String, PropertyValue>,
}

impl Properties {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Remove a value, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.entries.remove(key)
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn require(&self, key: &str) -> Result<&PropertyValue, PropertyError> {
        self.entries
            .get(key)
            .ok_or_else(|| PropertyError::Missing(key.to_string()))
    }

    fn wrong_type(key: &str, expected: &'static str) -> PropertyError {
        PropertyError::WrongType {
            key: key.to_string(),
            expected,
        }
    }

    pub fn fetch_integer(&self, key: &str) -> Result<i64, PropertyError> {
        match self.require(key)? {
            PropertyValue::Integer(v) => Ok(*v),
            _ => Err(Self::wrong_type(key, "integer")),
        }
    }

    /// Fetch a real number. Integers are widened.
    pub fn fetch_real(&self, key: &str) -> Result<f64, PropertyError> {
        match self.require(key)? {
            PropertyValue::Real(v) => Ok(*v),
            PropertyValue::Integer(v) => Ok(*v as f64),
            _ => Err(Self::wrong_type(key, "real")),
        }
    }

    pub fn fetch_string(&self, key: &str) -> Result<String, PropertyError> {
        match self.require(key)? {
            PropertyValue::Text(v) => Ok(v.clone()),
            _ => Err(Self::wrong_type(key, "string")),
        }
    }

    pub fn fetch_bool(&self, key: &str) -> Result<bool, PropertyError> {
        match self.require(key)? {
            PropertyValue::Boolean(v) => Ok(*v),
            _ => Err(Self::wrong_type(key, "boolean")),
        }
    }

    /// Fetch a dimensioned value converted to base units.
    ///
    /// The value must be text carrying an explicit unit of the `expected`
    /// dimension; a bare number is reported as a missing unit.
    pub fn fetch_quantity(&self, key: &str, expected: Dimension) -> Result<f64, PropertyError> {
        quantity_of(key, self.require(key)?, expected)
    }

    pub fn fetch_real_list(&self, key: &str) -> Result<Vec<f64>, PropertyError> {
        self.fetch_list(key)?
            .iter()
            .map(|v| match v {
                PropertyValue::Real(x) => Ok(*x),
                PropertyValue::Integer(x) => Ok(*x as f64),
                _ => Err(Self::wrong_type(key, "list of reals")),
            })
            .collect()
    }

    pub fn fetch_string_list(&self, key: &str) -> Result<Vec<String>, PropertyError> {
        self.fetch_list(key)?
            .iter()
            .map(|v| match v {
                PropertyValue::Text(s) => Ok(s.clone()),
                _ => Err(Self::wrong_type(key, "list of strings")),
            })
            .collect()
    }

    pub fn fetch_quantity_list(
        &self,
        key: &str,
        expected: Dimension,
    ) -> Result<Vec<f64>, PropertyError> {
        self.fetch_list(key)?
            .iter()
            .map(|v| quantity_of(key, v, expected))
            .collect()
    }

    fn fetch_list(&self, key: &str) -> Result<&[PropertyValue], PropertyError> {
        match self.require(key)? {
            PropertyValue::List(items) => Ok(items),
            _ => Err(Self::wrong_type(key, "list")),
        }
    }
}

fn quantity_of(
    key: &str,
    value: &PropertyValue,
    expected: Dimension,
) -> Result<f64, PropertyError> {
    let unit_err = |source| PropertyError::Unit {
        key: key.to_string(),
        source,
    };
    match value {
        PropertyValue::Text(text) => parse_in(text, expected).map_err(unit_err),
        PropertyValue::Real(v) => Err(unit_err(UnitError::MissingUnit(v.to_string()))),
        PropertyValue::Integer(v) => Err(unit_err(UnitError::MissingUnit(v.to_string()))),
        _ => Err(Properties::wrong_type(key, "dimensioned quantity")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Properties {
        Properties::new()
            .with("activity", "10 Bq")
            .with("duration", "1 s")
            .with("seed", 314_159)
            .with("event_generator_name", "bipo214")
            .with("warmup_factor", 50.0)
            .with("strict", true)
            .with("position", vec![1.0, 2.0, 3.0])
            .with("line_kinds", vec!["e-", "alpha"])
    }

    #[test]
    fn typed_fetches() {
        let p = sample();
        assert_eq!(p.fetch_integer("seed").unwrap(), 314_159);
        assert_eq!(p.fetch_real("warmup_factor").unwrap(), 50.0);
        assert_eq!(p.fetch_real("seed").unwrap(), 314_159.0);
        assert_eq!(p.fetch_string("event_generator_name").unwrap(), "bipo214");
        assert!(p.fetch_bool("strict").unwrap());
        assert_eq!(p.fetch_real_list("position").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(
            p.fetch_string_list("line_kinds").unwrap(),
            vec!["e-".to_string(), "alpha".to_string()]
        );
    }

    #[test]
    fn missing_key_reported_by_name() {
        let p = sample();
        assert_eq!(
            p.fetch_integer("nope"),
            Err(PropertyError::Missing("nope".into()))
        );
    }

    #[test]
    fn wrong_type_reported() {
        let p = sample();
        assert!(matches!(
            p.fetch_integer("event_generator_name"),
            Err(PropertyError::WrongType { .. })
        ));
        assert!(matches!(
            p.fetch_string("seed"),
            Err(PropertyError::WrongType { .. })
        ));
    }

    #[test]
    fn quantity_requires_explicit_unit() {
        let p = Properties::new().with("activity", 10.0);
        assert_eq!(
            p.fetch_quantity("activity", Dimension::Activity),
            Err(PropertyError::Unit {
                key: "activity".into(),
                source: UnitError::MissingUnit("10".into()),
            })
        );
    }

    #[test]
    fn quantity_dimension_checked() {
        let p = sample();
        assert_eq!(p.fetch_quantity("activity", Dimension::Activity).unwrap(), 10.0);
        assert!(matches!(
            p.fetch_quantity("duration", Dimension::Activity),
            Err(PropertyError::Unit {
                source: UnitError::WrongDimension { .. },
                ..
            })
        ));
    }

    #[test]
    fn quantity_list() {
        let p = Properties::new().with("delays", vec!["0 s", "164 us"]);
        let v = p.fetch_quantity_list("delays", Dimension::Time).unwrap();
        assert_eq!(v[0], 0.0);
        assert!((v[1] - 164e-6).abs() < 1e-15);
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{"activity":"5 kBq","seed":7,"ratio":0.5,"names":["a","b"],"on":false}"#;
        let p: Properties = serde_json::from_str(json).unwrap();
        assert_eq!(p.len(), 5);
        assert_eq!(p.fetch_integer("seed").unwrap(), 7);
        assert_eq!(p.fetch_real("ratio").unwrap(), 0.5);
        assert!(!p.fetch_bool("on").unwrap());
        assert_eq!(p.fetch_quantity("activity", Dimension::Activity).unwrap(), 5000.0);
    }

    #[test]
    fn set_replaces_and_remove() {
        let mut p = sample();
        p.set("seed", 1);
        assert_eq!(p.fetch_integer("seed").unwrap(), 1);
        assert!(p.remove("seed").is_some());
        assert!(!p.has_key("seed"));
    }
}
