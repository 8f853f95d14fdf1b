//! Update page
//!
//! An update form is only built once its item has been fetched. Until then
//! the page renders `Loading`; an empty fetch result is `NotFound` and stays
//! that way.

use super::controller::FormController;
use crate::resource::{ActionTable, ResourceItem, ResourceKind};
use crate::router::Navigator;
use anyhow::Result;
use std::sync::Arc;

/// What the update page shows
#[derive(Debug, Clone, PartialEq)]
pub enum RenderState {
    Loading,
    NotFound,
    Ready(ResourceItem),
}

/// Fetch-before-render wrapper around an update form
#[derive(Debug)]
pub struct UpdatePage {
    kind: ResourceKind,
    id: String,
    state: RenderState,
}

impl UpdatePage {
    pub fn new(kind: ResourceKind, id: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            state: RenderState::Loading,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Fetch the item by id. A fetch error leaves the page `Loading`.
    pub async fn load(&mut self, table: &ActionTable) -> Result<&RenderState> {
        if self.state == RenderState::NotFound {
            return Ok(&self.state);
        }

        let item = table.get(self.kind).list.fetch_item(&self.id).await?;

        self.state = match item {
            Some(item) => RenderState::Ready(item),
            None => {
                tracing::warn!("No {} with id {}", self.kind, self.id);
                RenderState::NotFound
            }
        };
        Ok(&self.state)
    }

    /// The update form, once the item is loaded
    pub fn form(
        &self,
        table: &ActionTable,
        navigator: Arc<dyn Navigator>,
    ) -> Option<FormController> {
        match &self.state {
            RenderState::Ready(item) => Some(FormController::for_update(
                table.get(self.kind),
                item,
                navigator,
            )),
            RenderState::Loading | RenderState::NotFound => None,
        }
    }
}
