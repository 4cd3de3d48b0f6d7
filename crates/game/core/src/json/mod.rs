//! Ordered value tree used as the interchange format for every persisted or
//! transmitted entity.
//!
//! [`Json`] is a typed tree (object/array/string/number/bool/null) whose
//! objects keep their attributes in insertion order. Rendering is compact and
//! deterministic: two structurally equal trees always produce byte-identical
//! canonical strings, which is what makes [`ContentHash`] comparisons in the
//! envelope layer meaningful.
//!
//! Parsing and rendering delegate to `serde_json` (built with
//! `preserve_order`); the tree itself adds typed accessors that fail with
//! [`JsonError::TypeMismatch`] instead of silently coercing.

mod hash;
mod serializable;

pub use hash::ContentHash;
pub use serializable::Serializable;

use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::error::{ErrorSeverity, GameError};

/// Tag of a value tree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum JsonTag {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

/// Errors raised while building, reading or decoding a value tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum JsonError {
    /// Input string is not a well-formed tree.
    #[error("malformed value tree: {0}")]
    Parse(String),

    /// A typed accessor disagreed with the stored tag.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: JsonTag, found: JsonTag },

    /// Number does not fit the requested integer type.
    #[error("number {0} is not representable as the requested integer")]
    NumberOutOfRange(String),

    /// Object has no attribute with this name.
    #[error("missing attribute `{0}`")]
    MissingAttribute(String),

    /// Tree is well-formed but does not describe the requested entity.
    #[error("cannot decode entity: {0}")]
    Decode(String),
}

impl GameError for JsonError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            JsonError::Parse(_) => "JSON_PARSE",
            JsonError::TypeMismatch { .. } => "JSON_TYPE_MISMATCH",
            JsonError::NumberOutOfRange(_) => "JSON_NUMBER_OUT_OF_RANGE",
            JsonError::MissingAttribute(_) => "JSON_MISSING_ATTRIBUTE",
            JsonError::Decode(_) => "JSON_DECODE",
        }
    }
}

/// A node of the value tree.
///
/// Object attributes are stored as an ordered list; `set` replaces an existing
/// attribute in place so re-assignment never reorders the rendering.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Json {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Json>),
    Object(Vec<(String, Json)>),
}

impl Json {
    /// Creates an empty object node.
    pub fn object() -> Self {
        Json::Object(Vec::new())
    }

    /// Creates an empty array node.
    pub fn array() -> Self {
        Json::Array(Vec::new())
    }

    /// Builds an object from attribute pairs, keeping their order.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Json>,
    {
        let mut attributes: Vec<(String, Json)> = Vec::new();
        for (key, value) in pairs {
            insert_attribute(&mut attributes, key.into(), value.into());
        }
        Json::Object(attributes)
    }

    /// Parses a string into a tree.
    pub fn parse(input: &str) -> Result<Self, JsonError> {
        serde_json::from_str::<Json>(input).map_err(|error| JsonError::Parse(error.to_string()))
    }

    /// Renders the canonical string form (compact, insertion-ordered).
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Hash of the canonical string form.
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of(&self.render())
    }

    pub fn tag(&self) -> JsonTag {
        match self {
            Json::Null => JsonTag::Null,
            Json::Bool(_) => JsonTag::Bool,
            Json::Number(_) => JsonTag::Number,
            Json::String(_) => JsonTag::String,
            Json::Array(_) => JsonTag::Array,
            Json::Object(_) => JsonTag::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Json::Null)
    }

    /// Sets a named attribute on an object node.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Json>) -> Result<(), JsonError> {
        match self {
            Json::Object(attributes) => {
                insert_attribute(attributes, key.into(), value.into());
                Ok(())
            }
            other => Err(mismatch(JsonTag::Object, other)),
        }
    }

    /// Appends an element to an array node.
    pub fn push(&mut self, value: impl Into<Json>) -> Result<(), JsonError> {
        match self {
            Json::Array(items) => {
                items.push(value.into());
                Ok(())
            }
            other => Err(mismatch(JsonTag::Array, other)),
        }
    }

    /// Returns the named attribute of an object node.
    pub fn get(&self, key: &str) -> Result<&Json, JsonError> {
        self.attribute(key)?
            .ok_or_else(|| JsonError::MissingAttribute(key.to_string()))
    }

    /// Returns the named attribute if present; fails only when `self` is not an object.
    pub fn attribute(&self, key: &str) -> Result<Option<&Json>, JsonError> {
        let attributes = self.as_object()?;
        Ok(attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value))
    }

    pub fn as_str(&self) -> Result<&str, JsonError> {
        match self {
            Json::String(value) => Ok(value),
            other => Err(mismatch(JsonTag::String, other)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, JsonError> {
        match self {
            Json::Bool(value) => Ok(*value),
            other => Err(mismatch(JsonTag::Bool, other)),
        }
    }

    pub fn as_i64(&self) -> Result<i64, JsonError> {
        let number = self.as_number()?;
        number
            .as_i64()
            .ok_or_else(|| JsonError::NumberOutOfRange(number.to_string()))
    }

    pub fn as_u64(&self) -> Result<u64, JsonError> {
        let number = self.as_number()?;
        number
            .as_u64()
            .ok_or_else(|| JsonError::NumberOutOfRange(number.to_string()))
    }

    pub fn as_f64(&self) -> Result<f64, JsonError> {
        let number = self.as_number()?;
        number
            .as_f64()
            .ok_or_else(|| JsonError::NumberOutOfRange(number.to_string()))
    }

    pub fn as_number(&self) -> Result<&Number, JsonError> {
        match self {
            Json::Number(value) => Ok(value),
            other => Err(mismatch(JsonTag::Number, other)),
        }
    }

    pub fn as_array(&self) -> Result<&[Json], JsonError> {
        match self {
            Json::Array(items) => Ok(items),
            other => Err(mismatch(JsonTag::Array, other)),
        }
    }

    pub fn as_object(&self) -> Result<&[(String, Json)], JsonError> {
        match self {
            Json::Object(attributes) => Ok(attributes),
            other => Err(mismatch(JsonTag::Object, other)),
        }
    }

    /// Reads an array node as a list of `T`, converting each element with `read`.
    pub fn as_list<T>(
        &self,
        read: impl Fn(&Json) -> Result<T, JsonError>,
    ) -> Result<Vec<T>, JsonError> {
        self.as_array()?.iter().map(read).collect()
    }

    pub fn get_str(&self, key: &str) -> Result<&str, JsonError> {
        self.get(key)?.as_str()
    }

    pub fn get_i64(&self, key: &str) -> Result<i64, JsonError> {
        self.get(key)?.as_i64()
    }

    pub fn get_u64(&self, key: &str) -> Result<u64, JsonError> {
        self.get(key)?.as_u64()
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, JsonError> {
        self.get(key)?.as_bool()
    }

    pub fn get_list<T>(
        &self,
        key: &str,
        read: impl Fn(&Json) -> Result<T, JsonError>,
    ) -> Result<Vec<T>, JsonError> {
        self.get(key)?.as_list(read)
    }
}

fn mismatch(expected: JsonTag, found: &Json) -> JsonError {
    JsonError::TypeMismatch {
        expected,
        found: found.tag(),
    }
}

fn insert_attribute(attributes: &mut Vec<(String, Json)>, key: String, value: Json) {
    match attributes.iter_mut().find(|(name, _)| *name == key) {
        Some((_, slot)) => *slot = value,
        None => attributes.push((key, value)),
    }
}

impl fmt::Display for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl Serialize for Json {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Json::Null => serializer.serialize_unit(),
            Json::Bool(value) => serializer.serialize_bool(*value),
            Json::Number(value) => value.serialize(serializer),
            Json::String(value) => serializer.serialize_str(value),
            Json::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Json::Object(attributes) => {
                let mut map = serializer.serialize_map(Some(attributes.len()))?;
                for (key, value) in attributes {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Json {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Json::from)
    }
}

impl From<Value> for Json {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Json::Null,
            Value::Bool(value) => Json::Bool(value),
            Value::Number(value) => Json::Number(value),
            Value::String(value) => Json::String(value),
            Value::Array(items) => Json::Array(items.into_iter().map(Json::from).collect()),
            Value::Object(map) => Json::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Json::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(value) => Value::Bool(value),
            Json::Number(value) => Value::Number(value),
            Json::String(value) => Value::String(value),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(attributes) => Value::Object(
                attributes
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Json {
    fn from(value: &str) -> Self {
        Json::String(value.to_string())
    }
}

impl From<String> for Json {
    fn from(value: String) -> Self {
        Json::String(value)
    }
}

impl From<bool> for Json {
    fn from(value: bool) -> Self {
        Json::Bool(value)
    }
}

impl From<i64> for Json {
    fn from(value: i64) -> Self {
        Json::Number(value.into())
    }
}

impl From<u64> for Json {
    fn from(value: u64) -> Self {
        Json::Number(value.into())
    }
}

impl From<u32> for Json {
    fn from(value: u32) -> Self {
        Json::Number(value.into())
    }
}

impl From<i32> for Json {
    fn from(value: i32) -> Self {
        Json::Number(value.into())
    }
}

/// Non-finite floats have no tree representation and become `null`.
impl From<f64> for Json {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Json::Null, Json::Number)
    }
}

impl From<Vec<Json>> for Json {
    fn from(items: Vec<Json>) -> Self {
        Json::Array(items)
    }
}

impl<T: Into<Json>> From<Option<T>> for Json {
    fn from(value: Option<T>) -> Self {
        value.map_or(Json::Null, Into::into)
    }
}
