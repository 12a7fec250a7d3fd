#![forbid(unsafe_code)]

use arcadia_api::ApiError;
use arcadia_codec::FormState;
use arcadia_core::{Record, RecordId, ResourceKind};
use arcadia_ops::DeleteReport;
use serde::Serialize;

/// What the console is showing. Loading is an overlay, not a view.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Listing,
    Editing(FormState),
    Confirming(PendingDeletion),
}

impl View {
    pub fn name(&self) -> &'static str {
        match self {
            View::Listing => "listing",
            View::Editing(_) => "editing",
            View::Confirming(_) => "confirming",
        }
    }
}

/// Ids awaiting the operator's delete confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingDeletion {
    pub kind: ResourceKind,
    pub ids: Vec<RecordId>,
}

impl PendingDeletion {
    pub fn prompt(&self) -> String {
        match self.ids.as_slice() {
            [one] => format!("Are you sure you want to delete {} record {}?", self.kind, one),
            ids => format!("Are you sure you want to delete {} selected {} records?", ids.len(), self.kind),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SubmitMode {
    Create,
    Update,
}

/// The one mutation allowed in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Busy {
    /// `draft` is the token of the form that was submitted.
    Submitting { kind: ResourceKind, mode: SubmitMode, draft: u64 },
    Deleting { kind: ResourceKind, ids: Vec<RecordId> },
}

impl Busy {
    /// Whether `id` of `kind` is part of the deletion in flight.
    pub fn is_deleting(&self, kind: ResourceKind, id: &RecordId) -> bool {
        matches!(self, Busy::Deleting { kind: k, ids } if *k == kind && ids.contains(id))
    }
}

/// Results reported by background tasks.
#[derive(Debug)]
pub enum ConsoleUpdate {
    Listed { kind: ResourceKind, generation: u64, result: Result<Vec<Record>, ApiError> },
    Submitted { kind: ResourceKind, id: Option<RecordId>, draft: u64, result: Result<Option<Record>, ApiError> },
    Deleted { kind: ResourceKind, report: DeleteReport },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warn,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// List table state of the active kind.
#[derive(Debug, Default)]
pub struct ListState {
    pub records: Vec<Record>,
    /// Tag of the latest fetch issued; older responses are discarded.
    pub generation: u64,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl ListState {
    pub fn find(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|r| &r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_prompt_counts_ids() {
        let one = PendingDeletion { kind: ResourceKind::Account, ids: vec!["7".into()] };
        assert_eq!(one.prompt(), "Are you sure you want to delete users record 7?");
        let many = PendingDeletion { kind: ResourceKind::Catalog, ids: vec!["1".into(), "2".into()] };
        assert_eq!(many.prompt(), "Are you sure you want to delete 2 selected games records?");
    }

    #[test]
    fn deleting_slot_matches_kind_and_id() {
        let busy = Busy::Deleting { kind: ResourceKind::Catalog, ids: vec!["1".into(), "4".into()] };
        assert!(busy.is_deleting(ResourceKind::Catalog, &"4".into()));
        assert!(!busy.is_deleting(ResourceKind::Catalog, &"2".into()));
        assert!(!busy.is_deleting(ResourceKind::Article, &"1".into()));
        let submitting = Busy::Submitting { kind: ResourceKind::Catalog, mode: SubmitMode::Create, draft: 1 };
        assert!(!submitting.is_deleting(ResourceKind::Catalog, &"1".into()));
    }
}
