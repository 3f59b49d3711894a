use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::ids::DbSymbol;

/// One record of a collection.
///
/// Entities are values: every edit produces a new record, a stored record is
/// never changed in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entity(Map<String, Value>);

impl Entity {
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CoreError::InvalidData(format!(
                "entity must be a JSON object, got {other}"
            ))),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn klass(&self) -> Option<&str> {
        self.0.get("klass").and_then(Value::as_str)
    }

    pub fn db_symbol(&self) -> Option<&str> {
        self.0.get("dbSymbol").and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    pub fn text_id(&self) -> Option<i64> {
        self.0.get("textId").and_then(Value::as_i64)
    }

    /// Copy of this entity with `field` set to `value`.
    pub fn with_field(&self, field: &str, value: impl Into<Value>) -> Self {
        let mut map = self.0.clone();
        map.insert(field.to_string(), value.into());
        Self(map)
    }

    /// Copy of this entity with every field of `patch` laid over it.
    pub fn merged(&self, patch: &Entity) -> Self {
        let mut map = self.0.clone();
        for (key, value) in &patch.0 {
            map.insert(key.clone(), value.clone());
        }
        Self(map)
    }

    /// Serialized form used to decide whether an edit changed anything.
    /// Keys are sorted, so field order never counts as a change.
    pub fn canonical_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    /// The `dbSymbol` field parsed as a symbol.
    pub fn symbol(&self) -> Result<DbSymbol, CoreError> {
        let raw = self
            .db_symbol()
            .ok_or_else(|| CoreError::InvalidData("entity has no dbSymbol".into()))?;
        DbSymbol::new(raw)
    }
}

impl TryFrom<Value> for Entity {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
