//! Resource Registry - Load resource definitions from JSON
//!
//! Resource kinds are a closed set. Each kind's definition (form fields,
//! remote method names, redirect policy) is loaded from an embedded JSON file
//! the first time it is needed and then served from a static table.

use super::codec::FieldDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Embedded resource JSON (compiled into the binary)
const RESOURCE_FILE: &str = include_str!("../resources/ledger.json");

/// The kinds of ledger resource the console manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Account,
    Asset,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Account, ResourceKind::Asset];

    /// Singular name, e.g. "account"
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Asset => "asset",
        }
    }

    /// Collection name used in paths, e.g. "accounts"
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Account => "accounts",
            Self::Asset => "assets",
        }
    }

    /// Upper-case tag used in state transition labels, e.g. "ACCOUNT"
    pub fn label(&self) -> &'static str {
        match self {
            Self::Account => "ACCOUNT",
            Self::Asset => "ASSET",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Account => 0,
            Self::Asset => 1,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| needle == kind.as_str() || needle == kind.collection())
            .ok_or_else(|| format!("unknown resource type: {}", s))
    }
}

/// What an update form sends to the remote client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Only `{id, tags}`; other encoded fields are dropped from the payload
    #[default]
    TagsOnly,
    /// Every encoded update field is sent alongside the id
    FullRecord,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub kind: ResourceKind,
    pub display_name: String,
    pub create_method: String,
    pub update_method: String,
    pub list_method: String,
    /// Overrides the `/<collection>` list path
    #[serde(default)]
    pub list_path: Option<String>,
    #[serde(default = "default_sort_key")]
    pub default_sort_key: String,
    /// Redirect to the item's detail path after create/update
    #[serde(default)]
    pub redirect_to_show: bool,
    #[serde(default)]
    pub update_policy: UpdatePolicy,
    pub create_fields: Vec<FieldDescriptor>,
    pub update_fields: Vec<FieldDescriptor>,
}

fn default_sort_key() -> String {
    "alias".to_string()
}

impl ResourceDef {
    /// Path of the list view, e.g. "/accounts"
    pub fn list_path(&self) -> String {
        self.list_path
            .clone()
            .unwrap_or_else(|| format!("/{}", self.kind.collection()))
    }

    /// Path of an item's detail view, e.g. "/accounts/acc1"
    pub fn show_path(&self, id: &str) -> String {
        format!("{}/{}", self.list_path(), id)
    }
}

/// Root structure of resources/ledger.json
#[derive(Debug, Clone, Deserialize)]
struct ResourceFile {
    resources: Vec<ResourceDef>,
}

/// Static table of definitions, indexed by kind
#[derive(Debug)]
pub struct ResourceRegistry {
    defs: Vec<ResourceDef>,
}

impl ResourceRegistry {
    fn from_json(content: &str) -> Result<Self, String> {
        let file: ResourceFile = serde_json::from_str(content).map_err(|e| e.to_string())?;

        let mut defs = Vec::with_capacity(ResourceKind::ALL.len());
        for kind in ResourceKind::ALL {
            let mut matching = file.resources.iter().filter(|def| def.kind == kind);
            let def = matching
                .next()
                .ok_or_else(|| format!("missing definition for {}", kind))?;
            if matching.next().is_some() {
                return Err(format!("duplicate definition for {}", kind));
            }
            defs.push(def.clone());
        }

        Ok(Self { defs })
    }

    pub fn resource(&self, kind: ResourceKind) -> &ResourceDef {
        &self.defs[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDef> {
        self.defs.iter()
    }
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceRegistry> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceRegistry {
    REGISTRY.get_or_init(|| {
        ResourceRegistry::from_json(RESOURCE_FILE)
            .unwrap_or_else(|e| panic!("Failed to load embedded resource JSON: {}", e))
    })
}

/// Get a resource definition by kind
pub fn get_resource(kind: ResourceKind) -> &'static ResourceDef {
    get_registry().resource(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::codec::FieldKind;

    #[test]
    fn test_registry_loads_every_kind() {
        let registry = get_registry();
        for kind in ResourceKind::ALL {
            assert_eq!(registry.resource(kind).kind, kind);
        }
        assert_eq!(registry.iter().count(), ResourceKind::ALL.len());
    }

    #[test]
    fn test_account_definition() {
        let account = get_resource(ResourceKind::Account);
        assert_eq!(account.display_name, "Accounts");
        assert_eq!(account.list_path(), "/accounts");
        assert_eq!(account.show_path("acc1"), "/accounts/acc1");
        assert_eq!(account.update_policy, UpdatePolicy::FullRecord);

        let quorum = account
            .create_fields
            .iter()
            .find(|f| f.name == "quorum")
            .unwrap();
        assert_eq!(quorum.kind, FieldKind::Integer);
    }

    #[test]
    fn test_asset_updates_tags_only() {
        let asset = get_resource(ResourceKind::Asset);
        assert_eq!(asset.update_policy, UpdatePolicy::TagsOnly);
        assert_eq!(asset.update_fields.len(), 1);
        assert_eq!(asset.update_fields[0].name, "tags");
        assert!(asset.create_fields.iter().any(|f| f.name == "definition"));
    }

    #[test]
    fn test_kind_parses_singular_and_plural() {
        assert_eq!("account".parse::<ResourceKind>(), Ok(ResourceKind::Account));
        assert_eq!("Assets".parse::<ResourceKind>(), Ok(ResourceKind::Asset));
        assert!("transaction".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_missing_kind_is_rejected() {
        let err = ResourceRegistry::from_json(r#"{"resources": []}"#).unwrap_err();
        assert!(err.contains("missing definition for account"));
    }

    #[test]
    fn test_list_path_override() {
        let mut def = get_resource(ResourceKind::Asset).clone();
        def.list_path = Some("/issued".to_string());
        assert_eq!(def.list_path(), "/issued");
        assert_eq!(def.show_path("a1"), "/issued/a1");
    }
}
