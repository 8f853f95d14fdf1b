//! Action Factory
//!
//! Builds the list/create/update operations for a resource kind from its
//! registry definition. Every kind gets the same three operation groups; the
//! [`ActionTable`] resolves them once at startup so callers never build
//! operation names at call time.

use super::codec::{self, FieldErrors, RawForm};
use super::item::ResourceItem;
use super::registry::{get_resource, ResourceDef, ResourceKind, UpdatePolicy};
use super::store::{FormStateStore, Transition};
use crate::client::{format_remote_error, ListPage, ListQuery, ResourceClient};
use crate::router::Navigation;
use anyhow::Result;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Why a create/update did not go through
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// One or more fields failed to encode; nothing was sent
    #[error("{0}")]
    Invalid(FieldErrors),
    /// The remote client failed
    #[error("{0:#}")]
    Remote(anyhow::Error),
}

impl ActionError {
    /// Message suitable for a form-level error banner
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(errors) => errors.to_string(),
            Self::Remote(error) => format_remote_error(error),
        }
    }
}

/// A successful create/update
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub item: ResourceItem,
    pub navigation: Navigation,
}

/// Where to go after a successful create/update of `id`
fn redirect_after(def: &ResourceDef, id: &str) -> Navigation {
    let path = if def.redirect_to_show {
        def.show_path(id)
    } else {
        def.list_path()
    };
    Navigation {
        path,
        preserve_flash: true,
    }
}

/// Stable sort by `key`; items without a value go last
fn sort_items(items: &mut [ResourceItem], key: &str) {
    items.sort_by(|a, b| match (a.sort_value(key), b.sort_value(key)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// List operations for one kind
#[derive(Clone)]
pub struct ListActions {
    kind: ResourceKind,
    def: &'static ResourceDef,
    client: Arc<dyn ResourceClient>,
}

impl ListActions {
    /// Fetch one page, sorted by the query's key or the kind's default key
    pub async fn fetch_page(&self, query: &ListQuery) -> Result<ListPage> {
        let sort_key = query
            .sort_by
            .clone()
            .unwrap_or_else(|| self.def.default_sort_key.clone());

        let mut page = self.client.list(self.kind, query).await?;
        sort_items(&mut page.items, &sort_key);

        tracing::debug!(
            "Fetched {} {} (last_page={})",
            page.items.len(),
            self.kind.collection(),
            page.last_page
        );
        Ok(page)
    }

    /// Fetch a single item through the id filter
    pub async fn fetch_item(&self, id: &str) -> Result<Option<ResourceItem>> {
        let page = self.client.list(self.kind, &ListQuery::by_id(id)).await?;
        Ok(page.items.into_iter().find(|item| item.id == id))
    }

    /// Fetch every page (auto-paginate)
    pub async fn fetch_all(&self, query: &ListQuery) -> Result<Vec<ResourceItem>> {
        let mut all_items = Vec::new();
        let mut query = query.clone();

        loop {
            let page = self.client.list(self.kind, &query).await?;
            all_items.extend(page.items);

            if page.last_page || page.cursor.is_none() {
                break;
            }
            query.after = page.cursor;
        }

        let sort_key = query
            .sort_by
            .clone()
            .unwrap_or_else(|| self.def.default_sort_key.clone());
        sort_items(&mut all_items, &sort_key);
        Ok(all_items)
    }
}

/// Create operations for one kind
#[derive(Clone)]
pub struct CreateActions {
    kind: ResourceKind,
    def: &'static ResourceDef,
    client: Arc<dyn ResourceClient>,
    store: Arc<FormStateStore>,
}

impl CreateActions {
    /// Encode the form, create the item, dispatch `Created`, compute the redirect
    pub async fn submit(&self, raw: &RawForm) -> Result<ActionOutcome, ActionError> {
        let fields =
            codec::encode_fields(&self.def.create_fields, raw).map_err(ActionError::Invalid)?;

        tracing::info!(
            "Creating {} with fields {:?}",
            self.kind,
            fields.keys().collect::<Vec<_>>()
        );

        let item = match self.client.create(self.kind, &fields).await {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!("Failed to create {}: {:#}", self.kind, e);
                self.store.dispatch(Transition::SubmissionFailed {
                    kind: self.kind,
                    message: format_remote_error(&e),
                });
                return Err(ActionError::Remote(e));
            }
        };

        let navigation = redirect_after(self.def, &item.id);
        self.store.dispatch(Transition::Created {
            kind: self.kind,
            item: item.clone(),
        });

        Ok(ActionOutcome { item, navigation })
    }
}

/// Update operations for one kind
#[derive(Clone)]
pub struct UpdateActions {
    kind: ResourceKind,
    def: &'static ResourceDef,
    client: Arc<dyn ResourceClient>,
    store: Arc<FormStateStore>,
}

impl UpdateActions {
    /// The fields actually sent for this kind's update policy
    fn payload(&self, encoded: Map<String, Value>) -> Map<String, Value> {
        match self.def.update_policy {
            UpdatePolicy::FullRecord => encoded,
            UpdatePolicy::TagsOnly => encoded
                .into_iter()
                .filter(|(name, _)| name == "tags")
                .collect(),
        }
    }

    /// Encode the form, update `original`, dispatch `Updated`, compute the redirect
    pub async fn submit(
        &self,
        raw: &RawForm,
        original: &ResourceItem,
    ) -> Result<ActionOutcome, ActionError> {
        let id = original.id.as_str();
        let encoded =
            codec::encode_fields(&self.def.update_fields, raw).map_err(ActionError::Invalid)?;
        let payload = self.payload(encoded);

        tracing::info!(
            "Updating {} {} with fields {:?}",
            self.kind,
            id,
            payload.keys().collect::<Vec<_>>()
        );

        let response = match self.client.update(self.kind, id, &payload).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to update {} {}: {:#}", self.kind, id, e);
                self.store.dispatch(Transition::SubmissionFailed {
                    kind: self.kind,
                    message: format_remote_error(&e),
                });
                return Err(ActionError::Remote(e));
            }
        };

        let item = updated_item(original, &payload, &response);
        let navigation = redirect_after(self.def, &item.id);
        self.store.dispatch(Transition::Updated {
            kind: self.kind,
            item: item.clone(),
        });

        Ok(ActionOutcome { item, navigation })
    }
}

/// `original` with the submitted fields applied. A response object carrying a
/// non-empty `id` is merged on top and its id replaces the original one; any
/// other response (`{"status": "success"}`, an empty batch element) is ignored.
fn updated_item(
    original: &ResourceItem,
    payload: &Map<String, Value>,
    response: &Value,
) -> ResourceItem {
    let mut item = original.clone();
    item.apply_fields(payload);

    if let Value::Object(fields) = response {
        if let Some(fresh) = fields
            .get("id")
            .and_then(Value::as_str)
            .filter(|fresh| !fresh.is_empty())
        {
            if fresh != original.id {
                tracing::debug!("{} now has id {}", original.id, fresh);
            }
            item.id = fresh.to_string();
            item.apply_fields(fields);
        }
    }
    item
}

/// Account-only receiver creation
#[derive(Clone)]
pub struct ReceiverActions {
    client: Arc<dyn ResourceClient>,
}

impl ReceiverActions {
    /// Create a receiver for `account_id`, optionally expiring at an RFC 3339 time
    pub async fn create(&self, account_id: &str, expires_at: Option<&str>) -> Result<Value> {
        tracing::info!("Creating receiver for account {}", account_id);
        self.client.create_receiver(account_id, expires_at).await
    }
}

/// The three operation groups for one resource kind
#[derive(Clone)]
pub struct ResourceActions {
    pub kind: ResourceKind,
    pub def: &'static ResourceDef,
    pub list: ListActions,
    pub create: CreateActions,
    pub update: UpdateActions,
}

/// Build the operations for `kind`
pub fn build_actions(
    kind: ResourceKind,
    client: Arc<dyn ResourceClient>,
    store: Arc<FormStateStore>,
) -> ResourceActions {
    let def = get_resource(kind);
    ResourceActions {
        kind,
        def,
        list: ListActions {
            kind,
            def,
            client: client.clone(),
        },
        create: CreateActions {
            kind,
            def,
            client: client.clone(),
            store: store.clone(),
        },
        update: UpdateActions {
            kind,
            def,
            client,
            store,
        },
    }
}

/// Operations for every resource kind, resolved once
#[derive(Clone)]
pub struct ActionTable {
    account: ResourceActions,
    asset: ResourceActions,
    receivers: ReceiverActions,
    store: Arc<FormStateStore>,
}

impl ActionTable {
    pub fn new(client: Arc<dyn ResourceClient>, store: Arc<FormStateStore>) -> Self {
        Self {
            account: build_actions(ResourceKind::Account, client.clone(), store.clone()),
            asset: build_actions(ResourceKind::Asset, client.clone(), store.clone()),
            receivers: ReceiverActions { client },
            store,
        }
    }

    /// Route one kind's operations through a different client
    pub fn with_client_override(
        mut self,
        kind: ResourceKind,
        client: Arc<dyn ResourceClient>,
    ) -> Self {
        let actions = build_actions(kind, client.clone(), self.store.clone());
        match kind {
            ResourceKind::Account => {
                self.account = actions;
                self.receivers = ReceiverActions { client };
            }
            ResourceKind::Asset => self.asset = actions,
        }
        self
    }

    pub fn get(&self, kind: ResourceKind) -> &ResourceActions {
        match kind {
            ResourceKind::Account => &self.account,
            ResourceKind::Asset => &self.asset,
        }
    }

    pub fn receivers(&self) -> &ReceiverActions {
        &self.receivers
    }

    pub fn store(&self) -> &Arc<FormStateStore> {
        &self.store
    }
}
