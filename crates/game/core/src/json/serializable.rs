//! Conversion contract between entities and the value tree.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{Json, JsonError};

/// Any entity convertible to and from a [`Json`] tree.
///
/// Both directions default to the type's serde implementation, so an entity
/// opts in with an empty `impl Serializable for T {}`. Entities must only use
/// ordered, string-keyable maps (`BTreeMap`) so their canonical rendering is
/// stable.
pub trait Serializable: Serialize + DeserializeOwned {
    /// Builds the value tree for this entity.
    fn to_json(&self) -> Json {
        let value = serde_json::to_value(self)
            .expect("Serializable entities only contain string-keyable maps");
        Json::from(value)
    }

    /// Reconstructs the entity from a value tree.
    fn from_json(json: &Json) -> Result<Self, JsonError> {
        serde_json::from_value(json.clone().into())
            .map_err(|error| JsonError::Decode(error.to_string()))
    }

    /// Parses a canonical string straight into the entity.
    fn from_canonical(input: &str) -> Result<Self, JsonError> {
        Self::from_json(&Json::parse(input)?)
    }
}
