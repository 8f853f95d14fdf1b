//! Resource items as returned by the ledger

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A single account, asset, ... keyed by its server-assigned id.
///
/// Attributes the console does not interpret are kept in `attributes` so an
/// item round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Map<String, Value>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResourceItem {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            alias: None,
            tags: Map::new(),
            attributes: Map::new(),
        }
    }

    /// Alias if set, otherwise the id
    pub fn display_name(&self) -> &str {
        self.alias
            .as_deref()
            .filter(|alias| !alias.is_empty())
            .unwrap_or(&self.id)
    }

    /// Look up any field by name
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.clone())),
            "alias" => self.alias.clone().map(Value::String),
            "tags" => Some(Value::Object(self.tags.clone())),
            other => self.attributes.get(other).cloned(),
        }
    }

    /// Overwrite fields with encoded form values. The id never changes.
    pub fn apply_fields(&mut self, fields: &Map<String, Value>) {
        for (name, value) in fields {
            match (name.as_str(), value) {
                ("id", _) => {}
                ("alias", Value::String(alias)) => self.alias = Some(alias.clone()),
                ("alias", Value::Null) => self.alias = None,
                ("tags", Value::Object(tags)) => self.tags = tags.clone(),
                ("tags", Value::Null) => self.tags.clear(),
                _ => {
                    self.attributes.insert(name.clone(), value.clone());
                }
            }
        }
    }

    /// Value used when sorting lists by `key`
    pub fn sort_value(&self, key: &str) -> Option<String> {
        match self.field(key)? {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}
