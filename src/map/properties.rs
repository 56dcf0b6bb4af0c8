use derive_more::*;
use crate::HashMap;
use crate::map::Color;

/// Value of a custom property.
#[derive(Clone, PartialEq, Debug)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Color(Color),
    /// Path resolved against the declaring document.
    File(String),
    /// Id of an object in the same map. 0 means none.
    Object(u32),
    /// Named custom class, with the members that were set.
    Class { property_type: String, members: Properties },
}

impl PropertyValue {

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) | Self::File(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Object(value) => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

/// Custom properties of a map, layer, tileset, tile or object, keyed by name.
#[derive(Clone, PartialEq, Default, Debug, Deref, DerefMut)]
pub struct Properties(HashMap<String, PropertyValue>);

impl Properties {

    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of these properties with `overrides` applied on top.
    pub fn merged(&self, overrides: &Properties) -> Properties {
        let mut result = self.clone();
        for (name, value) in overrides.iter() {
            result.0.insert(name.clone(), value.clone());
        }
        result
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(PropertyValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(PropertyValue::as_int)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(PropertyValue::as_float)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(PropertyValue::as_bool)
    }
}

impl FromIterator<(String, PropertyValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
