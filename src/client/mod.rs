//! Remote resource client
//!
//! The console only talks to the ledger through [`ResourceClient`], so forms
//! and actions work the same against the HTTP client and the in-memory mock.
//!
//! # Module Structure
//!
//! - [`http`] - HTTP utilities for the ledger's JSON API
//! - [`ledger`] - [`LedgerClient`], the production client
//! - [`mock`] - [`MockClient`], an in-memory client for tests

pub mod http;
pub mod ledger;
pub mod mock;

use crate::resource::{ResourceItem, ResourceKind};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

pub use http::format_remote_error;
pub use ledger::LedgerClient;
pub use mock::{MockClient, RecordedCall};

/// Query options for a list call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter_params: Vec<Value>,
    /// Applied by the console after the page arrives
    #[serde(skip)]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl ListQuery {
    /// Query matching a single id
    pub fn by_id(id: &str) -> Self {
        Self {
            filter: Some("id=$1".to_string()),
            filter_params: vec![Value::String(id.to_string())],
            ..Self::default()
        }
    }

    pub fn after(mut self, cursor: Option<String>) -> Self {
        self.after = cursor;
        self
    }
}

/// One page of list results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub items: Vec<ResourceItem>,
    /// Cursor for the next page, `None` on the last page
    pub cursor: Option<String>,
    pub last_page: bool,
}

/// Uniform remote interface over every resource kind
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Create an item from encoded fields
    async fn create(&self, kind: ResourceKind, fields: &Map<String, Value>)
        -> Result<ResourceItem>;

    /// Update an item. The response may or may not carry a fresh `id`.
    async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<Value>;

    /// Fetch one page of items
    async fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<ListPage>;

    /// Create a receiver (control program) for an account
    async fn create_receiver(&self, account_id: &str, expires_at: Option<&str>) -> Result<Value>;
}
