//! Submission Lifecycle Controller
//!
//! Drives one form instance through
//! `Editing → Validating → Submitting → Succeeded | Failed`.
//! A failed submission returns to `Editing` with the user's raw values intact;
//! only one submission may be in flight at a time.

use crate::client::format_remote_error;
use crate::flash::FlashLevel;
use crate::resource::codec::{self, CodecError, FieldDescriptor, FieldErrors, FieldKind, RawForm};
use crate::resource::{ActionError, ResourceActions, ResourceItem, ResourceKind};
use crate::router::{Navigation, Navigator};
use std::sync::{Arc, Mutex, MutexGuard};

/// Whether the form creates a new item or edits an existing one
#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    /// Editing the item the form was loaded from
    Update { item: ResourceItem },
}

/// Submission state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Editing,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// Why `submit` did not succeed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Field-level errors; nothing was sent
    #[error("{0}")]
    Invalid(FieldErrors),
    /// Another submission from this form is still running
    #[error("a submission is already in flight")]
    InFlight,
    #[error("form was already submitted")]
    AlreadySubmitted,
    /// Form-level error from the remote client
    #[error("{0}")]
    Remote(String),
}

impl From<ActionError> for SubmitError {
    fn from(error: ActionError) -> Self {
        match error {
            ActionError::Invalid(errors) => Self::Invalid(errors),
            ActionError::Remote(e) => Self::Remote(format_remote_error(&e)),
        }
    }
}

#[derive(Debug)]
struct FormState {
    phase: Phase,
    values: RawForm,
    field_errors: FieldErrors,
    form_error: Option<String>,
    mounted: bool,
}

fn transition(state: &mut FormState, to: Phase) {
    tracing::debug!("Form phase {:?} -> {:?}", state.phase, to);
    state.phase = to;
}

/// A single resource form. Clones share the same form instance.
#[derive(Clone)]
pub struct FormController {
    mode: FormMode,
    actions: ResourceActions,
    navigator: Arc<dyn Navigator>,
    state: Arc<Mutex<FormState>>,
}

impl FormController {
    fn new(
        mode: FormMode,
        values: RawForm,
        actions: &ResourceActions,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            mode,
            actions: actions.clone(),
            navigator,
            state: Arc::new(Mutex::new(FormState {
                phase: Phase::Editing,
                values,
                field_errors: FieldErrors::new(),
                form_error: None,
                mounted: true,
            })),
        }
    }

    /// An empty create form
    pub fn for_create(actions: &ResourceActions, navigator: Arc<dyn Navigator>) -> Self {
        Self::new(FormMode::Create, RawForm::new(), actions, navigator)
    }

    /// An update form pre-filled from `item`
    pub fn for_update(
        actions: &ResourceActions,
        item: &ResourceItem,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let values = actions
            .def
            .update_fields
            .iter()
            .map(|field| (field.name.clone(), codec::decode(item, &field.name)))
            .collect();

        Self::new(
            FormMode::Update { item: item.clone() },
            values,
            actions,
            navigator,
        )
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn kind(&self) -> ResourceKind {
        self.actions.kind
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    /// Declared fields of this form
    pub fn fields(&self) -> &'static [FieldDescriptor] {
        match self.mode {
            FormMode::Create => &self.actions.def.create_fields,
            FormMode::Update { .. } => &self.actions.def.update_fields,
        }
    }

    fn field_kind(&self, name: &str) -> FieldKind {
        self.fields()
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.kind)
            .unwrap_or_default()
    }

    pub fn title(&self) -> String {
        match &self.mode {
            FormMode::Update { item } => {
                format!("Edit {} tags {}", self.kind(), item.display_name())
            }
            FormMode::Create => format!("New {}", self.kind()),
        }
    }

    /// Set a raw value and validate it immediately. Edits are kept even when
    /// invalid; a submitted form no longer accepts them.
    pub fn set_value(&self, field: &str, raw: &str) -> Option<CodecError> {
        let error = codec::validate(field, raw, self.field_kind(field));

        let mut state = self.lock();
        if state.phase == Phase::Succeeded {
            return error;
        }
        state.values.insert(field.to_string(), raw.to_string());
        match &error {
            Some(e) => state.field_errors.insert(e.clone()),
            None => state.field_errors.remove(field),
        }
        error
    }

    pub fn value(&self, field: &str) -> Option<String> {
        self.lock().values.get(field).cloned()
    }

    pub fn values(&self) -> RawForm {
        self.lock().values.clone()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn field_errors(&self) -> FieldErrors {
        self.lock().field_errors.clone()
    }

    /// Form-level error banner, if any
    pub fn form_error(&self) -> Option<String> {
        self.lock().form_error.clone()
    }

    /// Height of the JSON editor for `field`
    pub fn editor_height(&self, field: &str) -> u16 {
        codec::editor_height(&self.value(field).unwrap_or_default())
    }

    /// Detach the form from its view. A submission still in flight completes
    /// without touching the form or navigating.
    pub fn teardown(&self) {
        self.lock().mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    /// Validate, encode, send, dispatch and navigate, in that order
    pub async fn submit(&self) -> Result<Navigation, SubmitError> {
        let values = {
            let mut state = self.lock();
            match state.phase {
                Phase::Validating | Phase::Submitting => return Err(SubmitError::InFlight),
                Phase::Succeeded => return Err(SubmitError::AlreadySubmitted),
                Phase::Editing | Phase::Failed => {}
            }

            transition(&mut state, Phase::Validating);
            let errors = codec::validate_fields(self.fields(), &state.values);
            if !errors.is_empty() {
                state.field_errors = errors.clone();
                transition(&mut state, Phase::Editing);
                return Err(SubmitError::Invalid(errors));
            }

            state.field_errors = FieldErrors::new();
            state.form_error = None;
            transition(&mut state, Phase::Submitting);
            state.values.clone()
        };

        let result = match &self.mode {
            FormMode::Create => self.actions.create.submit(&values).await,
            FormMode::Update { item } => self.actions.update.submit(&values, item).await,
        };

        let mut state = self.lock();
        if !state.mounted {
            tracing::debug!("{} form torn down before its submission finished", self.kind());
            return result
                .map(|outcome| outcome.navigation)
                .map_err(SubmitError::from);
        }

        match result {
            Ok(outcome) => {
                transition(&mut state, Phase::Succeeded);
                drop(state);

                let verb = match self.mode {
                    FormMode::Create => "Created",
                    FormMode::Update { .. } => "Updated",
                };
                self.navigator.flash(
                    FlashLevel::Success,
                    format!("{} {} {}", verb, self.kind(), outcome.item.display_name()),
                );
                self.navigator.navigate(outcome.navigation.clone());
                Ok(outcome.navigation)
            }
            Err(ActionError::Invalid(errors)) => {
                state.field_errors = errors.clone();
                transition(&mut state, Phase::Editing);
                Err(SubmitError::Invalid(errors))
            }
            Err(ActionError::Remote(e)) => {
                let message = format_remote_error(&e);
                transition(&mut state, Phase::Failed);
                state.form_error = Some(message.clone());
                transition(&mut state, Phase::Editing);
                Err(SubmitError::Remote(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockClient;
    use crate::resource::{ActionTable, FormStateStore};
    use crate::router::Router;
    use serde_json::json;

    fn setup(mock: MockClient) -> (ActionTable, Arc<MockClient>, Arc<Router>) {
        let mock = Arc::new(mock);
        let table = ActionTable::new(mock.clone(), Arc::new(FormStateStore::new()));
        (table, mock, Arc::new(Router::new()))
    }

    #[test]
    fn test_set_value_validates_per_keystroke() {
        let (table, _, router) = setup(MockClient::new());
        let form = FormController::for_create(table.get(ResourceKind::Account), router);

        assert!(form.set_value("quorum", "2x").is_some());
        assert!(form.field_errors().get("quorum").is_some());
        assert_eq!(form.value("quorum").as_deref(), Some("2x"));

        assert!(form.set_value("quorum", "2").is_none());
        assert!(form.field_errors().is_empty());
        assert_eq!(form.phase(), Phase::Editing);
    }

    #[tokio::test]
    async fn test_invalid_submit_returns_to_editing() {
        let (table, mock, router) = setup(MockClient::new());
        let form = FormController::for_create(table.get(ResourceKind::Asset), router.clone());
        form.set_value("definition", "{oops");

        let err = form.submit().await.unwrap_err();

        assert!(matches!(err, SubmitError::Invalid(ref e) if e.get("definition").is_some()));
        assert_eq!(form.phase(), Phase::Editing);
        assert_eq!(mock.call_count(), 0);
        assert!(router.history().is_empty());
    }

    #[tokio::test]
    async fn test_successful_create_flashes_and_navigates() {
        let mut created = ResourceItem::new("acc1");
        created.alias = Some("treasury".to_string());
        let (table, _, router) = setup(MockClient::new().return_created(created));
        let form = FormController::for_create(table.get(ResourceKind::Account), router.clone());
        form.set_value("alias", "treasury");

        let navigation = form.submit().await.unwrap();

        assert_eq!(navigation.path, "/accounts/acc1");
        assert_eq!(form.phase(), Phase::Succeeded);
        assert_eq!(router.current_path().as_deref(), Some("/accounts/acc1"));
        assert_eq!(
            router.current_flash().as_deref(),
            Some("✓ Created account treasury")
        );
        assert_eq!(form.submit().await, Err(SubmitError::AlreadySubmitted));
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_values() {
        let (table, mock, router) = setup(MockClient::new().fail_create("ledger offline"));
        let form = FormController::for_create(table.get(ResourceKind::Account), router.clone());
        form.set_value("alias", " alice ");
        form.set_value("tags", r#"{"team":"ops"}"#);
        let before = form.values();

        let err = form.submit().await.unwrap_err();

        assert_eq!(err, SubmitError::Remote("ledger offline".to_string()));
        assert_eq!(form.phase(), Phase::Editing);
        assert_eq!(form.form_error().as_deref(), Some("ledger offline"));
        assert_eq!(form.values(), before);
        assert!(router.history().is_empty());

        // A retry goes out again
        let navigation = form.submit().await.unwrap();
        assert_eq!(mock.call_count(), 2);
        assert!(navigation.path.starts_with("/accounts/"));
        assert!(form.form_error().is_none());
    }

    #[test]
    fn test_update_form_prefills_decoded_values() {
        let (table, _, router) = setup(MockClient::new());
        let item: ResourceItem = serde_json::from_value(json!({
            "id": "a1",
            "alias": "gold",
            "tags": {}
        }))
        .unwrap();

        let form = FormController::for_update(table.get(ResourceKind::Asset), &item, router);

        assert_eq!(form.value("tags").as_deref(), Some("{\n\t\n}"));
        assert_eq!(form.title(), "Edit asset tags gold");
        assert_eq!(form.editor_height("tags"), 51);
        assert_eq!(form.mode(), &FormMode::Update { item });
    }

    #[tokio::test]
    async fn test_teardown_skips_navigation() {
        let (table, _, router) = setup(MockClient::new());
        let form = FormController::for_create(table.get(ResourceKind::Asset), router.clone());
        form.teardown();

        let navigation = form.submit().await.unwrap();

        assert_eq!(navigation.path, "/assets/asset1");
        assert!(router.history().is_empty());
        assert!(!form.is_mounted());
        assert_eq!(table.store().history(), vec!["CREATED_ASSET"]);
    }
}
