//! Arcadia admin console controller.
//!
//! One generalized list/selection/form engine for every resource kind. The hosting
//! shell drives it with operator actions and reads its state back; network calls run
//! as Tokio tasks whose results are applied by `pump()` or `settle()`.

#![forbid(unsafe_code)]

use std::sync::Arc;

use arcadia_api::AdminApi;
use arcadia_codec::{empty_form, to_form_state, to_payload, validate, FormState, ValidationGap};
use arcadia_core::config::ConsoleConfig;
use arcadia_core::media::{MediaResolver, PendingImage};
use arcadia_core::registry::{columns_for, describe, project_row, ColumnSpec, RowView};
use arcadia_core::{Record, RecordId, ResourceKind};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub mod auth;
mod model;
mod notices;
pub mod selection;
mod tasks;
mod updates;

pub use auth::{AuthContext, Principal};
use model::ListState;
pub use model::{Busy, ConsoleUpdate, Notice, NoticeLevel, PendingDeletion, SubmitMode, View};
pub use selection::SelectionSet;

/// Operator actions the console refuses, with nothing sent to the backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsoleError {
    #[error("admin access required")]
    Unauthorized,
    #[error("another change is still in progress")]
    Busy,
    #[error("{0} records cannot be created or edited here")]
    NotEditable(ResourceKind),
    #[error("no form is open")]
    NoActiveForm,
    #[error("no deletion is awaiting confirmation")]
    NotConfirming,
    #[error("no record with id {0}")]
    UnknownRecord(RecordId),
    #[error("no records selected")]
    NothingSelected,
    #[error("finish or cancel the {view} view first")]
    NotListing { view: &'static str },
    #[error("record {0} is being deleted")]
    DeletionPending(RecordId),
    #[error("{kind} has no editable field {field}")]
    UnknownField { kind: ResourceKind, field: String },
    #[error(transparent)]
    Validation(#[from] ValidationGap),
}

pub struct AdminConsole {
    api: Arc<dyn AdminApi>,
    media: MediaResolver,
    kind: ResourceKind,
    list: ListState,
    view: View,
    selection: SelectionSet,
    busy: Option<Busy>,
    notices: Vec<Notice>,
    /// Token of the most recently opened form; each `add_new`/`edit` takes a fresh one.
    draft: u64,
    updates_tx: mpsc::UnboundedSender<ConsoleUpdate>,
    updates_rx: mpsc::UnboundedReceiver<ConsoleUpdate>,
    in_flight: usize,
}

impl AdminConsole {
    /// Check the operator's capability once and start loading the first kind.
    /// Must be called from within a Tokio runtime.
    pub fn open(api: Arc<dyn AdminApi>, auth: AuthContext, config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        Self::open_at(api, auth, config, ResourceKind::ALL[0])
    }

    pub fn open_at(
        api: Arc<dyn AdminApi>,
        auth: AuthContext,
        config: &ConsoleConfig,
        kind: ResourceKind,
    ) -> Result<Self, ConsoleError> {
        if !auth.is_admin(&config.admin_emails) {
            let email = auth.principal.as_ref().map(|p| p.email.as_str()).unwrap_or("(anonymous)");
            warn!(email = %email, "console: access denied");
            return Err(ConsoleError::Unauthorized);
        }
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let mut console = Self {
            api,
            media: config.media(),
            kind,
            list: ListState::default(),
            view: View::Listing,
            selection: SelectionSet::default(),
            busy: None,
            notices: Vec::new(),
            draft: 0,
            updates_tx,
            updates_rx,
            in_flight: 0,
        };
        info!(kind = %kind, media_base = %console.media.base(), "console: opened");
        console.start_fetch_task();
        Ok(console)
    }

    // ----------------- State -----------------

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn form(&self) -> Option<&FormState> {
        match &self.view {
            View::Editing(f) => Some(f),
            _ => None,
        }
    }

    pub fn pending_deletion(&self) -> Option<&PendingDeletion> {
        match &self.view {
            View::Confirming(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.list.loading
    }

    pub fn busy(&self) -> Option<&Busy> {
        self.busy.as_ref()
    }

    /// Error of the last accepted fetch, if it failed.
    pub fn list_error(&self) -> Option<&str> {
        self.list.last_error.as_deref()
    }

    pub fn records(&self) -> &[Record] {
        &self.list.records
    }

    pub fn rows(&self) -> Vec<RowView> {
        self.list.records.iter().map(|r| project_row(r, self.kind, &self.media)).collect()
    }

    pub fn columns(&self) -> Vec<ColumnSpec> {
        columns_for(self.kind)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Header checkbox of the list table.
    pub fn header_checked(&self) -> bool {
        self.selection.all_selected(self.list.records.len())
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.view, View::Editing(_)) && self.busy.is_none()
    }

    pub fn can_delete(&self) -> bool {
        self.busy.is_none()
    }

    /// Image shown in the open form's upload area.
    pub fn preview_url(&self) -> Option<String> {
        self.form().map(|f| f.preview_url(&self.media))
    }

    pub fn media(&self) -> &MediaResolver {
        &self.media
    }

    // ----------------- Navigation -----------------

    /// Switch to `kind` (or reload it): back to the list, selection and drafts dropped.
    pub fn activate(&mut self, kind: ResourceKind) {
        info!(from = %self.kind, to = %kind, view = self.view.name(), "console: activate");
        self.kind = kind;
        self.view = View::Listing;
        self.selection.clear();
        self.list.records.clear();
        self.list.last_error = None;
        self.start_fetch_task();
    }

    /// Refetch the active kind without leaving the current view.
    pub fn refresh(&mut self) {
        self.start_fetch_task();
    }

    /// Open an empty create form. Only from the list view.
    pub fn add_new(&mut self) -> Result<(), ConsoleError> {
        self.ensure_listing()?;
        self.ensure_editable()?;
        self.open_form(empty_form(self.kind));
        Ok(())
    }

    /// Open the edit form of a listed record. Only from the list view, and never for
    /// a record whose deletion is in flight.
    pub fn edit(&mut self, id: &RecordId) -> Result<(), ConsoleError> {
        self.ensure_listing()?;
        self.ensure_editable()?;
        self.ensure_not_deleting(id)?;
        let record = self.list.find(id).ok_or_else(|| ConsoleError::UnknownRecord(id.clone()))?;
        let form = to_form_state(record, self.kind);
        self.open_form(form);
        Ok(())
    }

    fn open_form(&mut self, form: FormState) {
        self.draft += 1;
        info!(kind = %self.kind, id = ?form.id, draft = self.draft, "console: form opened");
        self.view = View::Editing(form);
    }

    /// Leave the form or the confirmation without any network call.
    pub fn cancel(&mut self) {
        if !matches!(self.view, View::Listing) {
            info!(kind = %self.kind, view = self.view.name(), "console: cancel");
            self.view = View::Listing;
        }
    }

    fn ensure_listing(&self) -> Result<(), ConsoleError> {
        match self.view {
            View::Listing => Ok(()),
            _ => Err(ConsoleError::NotListing { view: self.view.name() }),
        }
    }

    fn ensure_not_deleting(&self, id: &RecordId) -> Result<(), ConsoleError> {
        match &self.busy {
            Some(b) if b.is_deleting(self.kind, id) => Err(ConsoleError::DeletionPending(id.clone())),
            _ => Ok(()),
        }
    }

    fn ensure_editable(&self) -> Result<(), ConsoleError> {
        if describe(self.kind).editable {
            Ok(())
        } else {
            Err(ConsoleError::NotEditable(self.kind))
        }
    }

    // ----------------- Form -----------------

    fn form_mut(&mut self) -> Result<&mut FormState, ConsoleError> {
        match &mut self.view {
            View::Editing(f) => Ok(f),
            _ => Err(ConsoleError::NoActiveForm),
        }
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), ConsoleError> {
        let kind = self.kind;
        let form = self.form_mut()?;
        if form.set(name, value) {
            Ok(())
        } else {
            Err(ConsoleError::UnknownField { kind, field: name.to_string() })
        }
    }

    /// Hold a picked file for the next submit; nothing is uploaded yet.
    pub fn attach_image(&mut self, img: PendingImage) -> Result<(), ConsoleError> {
        let kind = self.kind;
        let form = self.form_mut()?;
        if describe(kind).image_field().is_none() {
            return Err(ConsoleError::UnknownField { kind, field: "image".into() });
        }
        form.attach_image(img);
        Ok(())
    }

    /// Validate and send the open form: update when it carries an id, create otherwise.
    pub fn submit(&mut self) -> Result<(), ConsoleError> {
        if self.busy.is_some() {
            return Err(ConsoleError::Busy);
        }
        let kind = self.kind;
        let form = self.form_mut()?;
        validate(form)?;
        form.error = None;
        let payload = to_payload(form, kind);
        let id = form.id.clone();
        let draft = self.draft;
        self.start_submit_task(payload, id, draft);
        Ok(())
    }

    // ----------------- Selection -----------------

    /// Flip one row's checkbox; returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &RecordId) -> Result<bool, ConsoleError> {
        if self.list.find(id).is_none() {
            return Err(ConsoleError::UnknownRecord(id.clone()));
        }
        Ok(self.selection.toggle_one(id))
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(self.list.records.iter().map(|r| &r.id));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Header checkbox click: select every row, or clear when all are already selected.
    pub fn toggle_all(&mut self) {
        if self.header_checked() {
            self.clear_selection();
        } else {
            self.select_all();
        }
    }

    // ----------------- Deletion -----------------

    /// Ask to delete one listed record. Only from the list view.
    pub fn request_delete(&mut self, id: &RecordId) -> Result<(), ConsoleError> {
        self.ensure_listing()?;
        self.ensure_not_deleting(id)?;
        if self.list.find(id).is_none() {
            return Err(ConsoleError::UnknownRecord(id.clone()));
        }
        self.view = View::Confirming(PendingDeletion { kind: self.kind, ids: vec![id.clone()] });
        Ok(())
    }

    /// Ask to delete every selected row, in list order.
    pub fn request_bulk_delete(&mut self) -> Result<(), ConsoleError> {
        self.ensure_listing()?;
        self.selection.retain(self.list.records.iter().map(|r| &r.id));
        if self.selection.is_empty() {
            return Err(ConsoleError::NothingSelected);
        }
        let ids: Vec<RecordId> = self
            .list
            .records
            .iter()
            .filter(|r| self.selection.is_selected(&r.id))
            .map(|r| r.id.clone())
            .collect();
        if let Some(id) = ids.iter().find(|id| self.ensure_not_deleting(id).is_err()) {
            return Err(ConsoleError::DeletionPending(id.clone()));
        }
        self.view = View::Confirming(PendingDeletion { kind: self.kind, ids });
        Ok(())
    }

    pub fn confirm_delete(&mut self) -> Result<(), ConsoleError> {
        let View::Confirming(pending) = &self.view else {
            return Err(ConsoleError::NotConfirming);
        };
        if self.busy.is_some() {
            return Err(ConsoleError::Busy);
        }
        let pending = pending.clone();
        self.view = View::Listing;
        self.start_delete_task(pending);
        Ok(())
    }
}
