//! Ledger Client
//!
//! [`ResourceClient`] over the ledger's JSON-over-HTTP API. Every call is a
//! POST to `<base>/<method>`; method names come from the resource registry.

use super::http::{ApiError, LedgerHttpClient};
use super::{ListPage, ListQuery, ResourceClient};
use crate::resource::{get_resource, ResourceItem, ResourceKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use url::Url;
use uuid::Uuid;

/// Main ledger client
#[derive(Clone)]
pub struct LedgerClient {
    pub http: LedgerHttpClient,
    base_url: Url,
}

impl LedgerClient {
    /// Create a client for the ledger at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url =
            Url::parse(&normalized).with_context(|| format!("Invalid ledger URL: {}", base_url))?;

        Ok(Self {
            http: LedgerHttpClient::new()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, method: &str) -> Result<Url> {
        self.base_url
            .join(method)
            .with_context(|| format!("Invalid API method: {}", method))
    }

    async fn call(&self, method: &str, body: &Value) -> Result<Value> {
        let url = self.endpoint(method)?;
        self.http.post(url.as_str(), body).await
    }
}

/// Unwrap a single-element batch response, surfacing per-element errors
fn first_batch_item(response: Value) -> Result<Value> {
    let item = match response {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty batch response"))?,
        other => other,
    };

    if let Some(error) = ApiError::from_value(&item, None) {
        return Err(error.into());
    }
    Ok(item)
}

/// The update endpoint names the new alias `new_alias`
fn update_body(id: &str, fields: &Map<String, Value>) -> Value {
    let mut body = Map::new();
    body.insert("id".to_string(), Value::String(id.to_string()));
    for (name, value) in fields {
        let key = if name == "alias" { "new_alias" } else { name.as_str() };
        body.insert(key.to_string(), value.clone());
    }
    Value::Array(vec![Value::Object(body)])
}

#[async_trait]
impl ResourceClient for LedgerClient {
    async fn create(
        &self,
        kind: ResourceKind,
        fields: &Map<String, Value>,
    ) -> Result<ResourceItem> {
        let def = get_resource(kind);
        let mut request = fields.clone();
        request.insert(
            "client_token".to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );

        let response = self
            .call(&def.create_method, &Value::Array(vec![Value::Object(request)]))
            .await?;
        let item = first_batch_item(response)?;

        serde_json::from_value(item).with_context(|| format!("Malformed {} in response", kind))
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<Value> {
        let def = get_resource(kind);
        let response = self.call(&def.update_method, &update_body(id, fields)).await?;
        first_batch_item(response)
    }

    async fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<ListPage> {
        let def = get_resource(kind);
        let body = serde_json::to_value(query)?;
        let response = self.call(&def.list_method, &body).await?;

        let items = match response.get("items") {
            Some(items) if !items.is_null() => serde_json::from_value(items.clone())
                .with_context(|| format!("Malformed {} list", kind))?,
            _ => Vec::new(),
        };
        let last_page = response
            .get("last_page")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let cursor = if last_page {
            None
        } else {
            response
                .get("next")
                .and_then(|next| next.get("after"))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Ok(ListPage {
            items,
            cursor,
            last_page,
        })
    }

    async fn create_receiver(&self, account_id: &str, expires_at: Option<&str>) -> Result<Value> {
        let mut request = Map::new();
        request.insert(
            "account_id".to_string(),
            Value::String(account_id.to_string()),
        );
        if let Some(expires_at) = expires_at {
            request.insert(
                "expires_at".to_string(),
                Value::String(expires_at.to_string()),
            );
        }

        let response = self
            .call(
                "create-account-receiver",
                &Value::Array(vec![Value::Object(request)]),
            )
            .await?;
        first_batch_item(response)
    }
}
