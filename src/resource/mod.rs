//! Resource abstraction layer
//!
//! Ledger resources (accounts, assets) are described by data rather than
//! code. Definitions are embedded from `src/resources/ledger.json`; every
//! operation on a kind is resolved from its definition.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`codec`] - Converts between raw form text and typed field values
//! - [`item`] - The resource item shape shared by every kind
//! - [`store`] - Shared per-kind state driven by submission transitions
//! - [`actions`] - List/create/update operations built per kind
//!
//! # Example
//!
//! ```ignore
//! use ledger_console::client::LedgerClient;
//! use ledger_console::resource::{ActionTable, FormStateStore, ResourceKind};
//!
//! let client = Arc::new(LedgerClient::new(base_url)?);
//! let table = ActionTable::new(client, Arc::new(FormStateStore::new()));
//! let page = table.get(ResourceKind::Asset).list.fetch_page(&query).await?;
//! ```

pub mod actions;
pub mod codec;
pub mod item;
pub mod registry;
pub mod store;

pub use actions::{
    build_actions, ActionError, ActionOutcome, ActionTable, ListActions, ReceiverActions,
    ResourceActions,
};
pub use codec::{CodecError, FieldDescriptor, FieldErrors, FieldKind, RawForm};
pub use item::ResourceItem;
pub use registry::{get_registry, get_resource, ResourceDef, ResourceKind, UpdatePolicy};
pub use store::{FormStateStore, ResourceSlice, SubmissionStatus, Transition};
