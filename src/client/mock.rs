//! # Mock Client
//!
//! `MockClient` implements [`ResourceClient`] entirely in memory. It records
//! every call, answers from queued results, and falls back to echoing the
//! request when nothing is queued. A [`Notify`] gate can hold create/update
//! calls open so tests can observe a submission while it is in flight.
//!
//! ```rust
//! use ledger_console::client::{MockClient, ResourceClient};
//! use ledger_console::resource::{ResourceItem, ResourceKind};
//! use serde_json::Map;
//!
//! # tokio_test::block_on(async {
//! let mock = MockClient::new().return_created(ResourceItem::new("acc1"));
//! let item = mock.create(ResourceKind::Account, &Map::new()).await.unwrap();
//! assert_eq!(item.id, "acc1");
//! assert_eq!(mock.call_count(), 1);
//! # });
//! ```

use super::{ListPage, ListQuery, ResourceClient};
use crate::resource::{ResourceItem, ResourceKind};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// A call the mock received
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Create {
        kind: ResourceKind,
        fields: Map<String, Value>,
    },
    Update {
        kind: ResourceKind,
        id: String,
        fields: Map<String, Value>,
    },
    List {
        kind: ResourceKind,
        query: ListQuery,
    },
    CreateReceiver {
        account_id: String,
        expires_at: Option<String>,
    },
}

#[derive(Default)]
struct MockState {
    calls: Vec<RecordedCall>,
    created: VecDeque<Result<ResourceItem, String>>,
    updated: VecDeque<Result<Value, String>>,
    pages: VecDeque<Result<ListPage, String>>,
    next_id: usize,
}

/// In-memory [`ResourceClient`]
#[derive(Default)]
pub struct MockClient {
    state: Mutex<MockState>,
    gate: Option<Arc<Notify>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Hold create/update calls until the gate is notified
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn return_created(self, item: ResourceItem) -> Self {
        self.lock().created.push_back(Ok(item));
        self
    }

    pub fn return_updated(self, response: Value) -> Self {
        self.lock().updated.push_back(Ok(response));
        self
    }

    pub fn return_page(self, page: ListPage) -> Self {
        self.lock().pages.push_back(Ok(page));
        self
    }

    pub fn fail_create(self, message: &str) -> Self {
        self.lock().created.push_back(Err(message.to_string()));
        self
    }

    pub fn fail_update(self, message: &str) -> Self {
        self.lock().updated.push_back(Err(message.to_string()));
        self
    }

    pub fn fail_list(self, message: &str) -> Self {
        self.lock().pages.push_back(Err(message.to_string()));
        self
    }

    /// Every call received so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ResourceClient for MockClient {
    async fn create(
        &self,
        kind: ResourceKind,
        fields: &Map<String, Value>,
    ) -> Result<ResourceItem> {
        let queued = {
            let mut state = self.lock();
            state.calls.push(RecordedCall::Create {
                kind,
                fields: fields.clone(),
            });
            state.next_id += 1;
            let next_id = state.next_id;
            state.created.pop_front().unwrap_or_else(|| {
                let mut item = ResourceItem::new(&format!("{}{}", kind, next_id));
                item.apply_fields(fields);
                Ok(item)
            })
        };

        self.wait_for_gate().await;
        queued.map_err(|message| anyhow::anyhow!(message))
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Result<Value> {
        let queued = {
            let mut state = self.lock();
            state.calls.push(RecordedCall::Update {
                kind,
                id: id.to_string(),
                fields: fields.clone(),
            });
            state.updated.pop_front().unwrap_or_else(|| {
                let mut echo = fields.clone();
                echo.insert("id".to_string(), Value::String(id.to_string()));
                Ok(Value::Object(echo))
            })
        };

        self.wait_for_gate().await;
        queued.map_err(|message| anyhow::anyhow!(message))
    }

    async fn list(&self, kind: ResourceKind, query: &ListQuery) -> Result<ListPage> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::List {
            kind,
            query: query.clone(),
        });
        state
            .pages
            .pop_front()
            .unwrap_or_else(|| {
                Ok(ListPage {
                    last_page: true,
                    ..ListPage::default()
                })
            })
            .map_err(|message| anyhow::anyhow!(message))
    }

    async fn create_receiver(&self, account_id: &str, expires_at: Option<&str>) -> Result<Value> {
        self.lock().calls.push(RecordedCall::CreateReceiver {
            account_id: account_id.to_string(),
            expires_at: expires_at.map(str::to_string),
        });
        Ok(serde_json::json!({
            "control_program": format!("mock-program-{}", account_id),
            "expires_at": expires_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_echoes_fields_when_nothing_queued() {
        let mock = MockClient::new();
        let fields = json!({"alias": "alice", "tags": {"k": "v"}});
        let item = mock
            .create(ResourceKind::Account, fields.as_object().unwrap())
            .await
            .unwrap();

        assert_eq!(item.id, "account1");
        assert_eq!(item.alias.as_deref(), Some("alice"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_queued_failures_are_returned_in_order() {
        let mock = MockClient::new()
            .fail_update("server exploded")
            .return_updated(json!({"id": "a1"}));

        let first = mock.update(ResourceKind::Asset, "a1", &Map::new()).await;
        let second = mock.update(ResourceKind::Asset, "a1", &Map::new()).await;

        assert_eq!(first.unwrap_err().to_string(), "server exploded");
        assert_eq!(second.unwrap(), json!({"id": "a1"}));
    }

    #[tokio::test]
    async fn test_list_records_query() {
        let mock = MockClient::new();
        let page = mock
            .list(ResourceKind::Asset, &ListQuery::by_id("a1"))
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(
            mock.calls(),
            vec![RecordedCall::List {
                kind: ResourceKind::Asset,
                query: ListQuery::by_id("a1"),
            }]
        );
    }
}
