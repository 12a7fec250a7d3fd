#![forbid(unsafe_code)]

use arcadia_api::ApiError;
use arcadia_core::{Record, RecordId, ResourceKind};
use arcadia_ops::{DeleteOutcome, DeleteReport};
use metrics::counter;
use tracing::{debug, info};

use crate::model::{ConsoleUpdate, NoticeLevel, View};
use crate::AdminConsole;

impl AdminConsole {
    /// Apply every update already delivered, without waiting. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut processed = 0usize;
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply_update(update);
            processed += 1;
        }
        processed
    }

    /// Wait until no background task is outstanding, applying updates as they arrive.
    /// Includes the refetch a completed mutation triggers.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.updates_rx.recv().await {
                Some(update) => self.apply_update(update),
                None => break,
            }
        }
    }

    /// Background tasks started and not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn apply_update(&mut self, update: ConsoleUpdate) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match update {
            ConsoleUpdate::Listed { kind, generation, result } => self.on_listed(kind, generation, result),
            ConsoleUpdate::Submitted { kind, id, draft, result } => self.on_submitted(kind, id, draft, result),
            ConsoleUpdate::Deleted { kind, report } => self.on_deleted(kind, report),
        }
    }

    fn on_listed(&mut self, kind: ResourceKind, generation: u64, result: Result<Vec<Record>, ApiError>) {
        if kind != self.kind || generation != self.list.generation {
            debug!(kind = %kind, generation, latest = self.list.generation, active = %self.kind, "ui: stale list discarded");
            counter!("arcadia_console_stale_list_total", 1u64);
            return;
        }
        self.list.loading = false;
        self.selection.clear();
        match result {
            Ok(records) => {
                info!(kind = %kind, generation, items = records.len(), "ui: list applied");
                self.list.records = records;
                self.list.last_error = None;
            }
            Err(e) => {
                let msg = e.user_message();
                self.list.records.clear();
                self.list.last_error = Some(msg.clone());
                self.notice(NoticeLevel::Warn, format!("Failed to load {kind}: {msg}"));
            }
        }
    }

    fn on_submitted(
        &mut self,
        kind: ResourceKind,
        id: Option<RecordId>,
        draft: u64,
        result: Result<Option<Record>, ApiError>,
    ) {
        self.busy = None;
        let active = kind == self.kind;
        // Only the form that was submitted; a newer draft stays open.
        let form_open = active && draft == self.draft && matches!(&self.view, View::Editing(f) if f.kind == kind);
        match result {
            Ok(_) => {
                let text = match &id {
                    Some(_) => format!("Updated {kind} successfully"),
                    None => format!("Created new {kind} successfully"),
                };
                self.notice(NoticeLevel::Success, text);
                if active {
                    if form_open {
                        self.view = View::Listing;
                    }
                    self.start_fetch_task();
                }
            }
            Err(e) => {
                let msg = e.user_message();
                if form_open {
                    if let View::Editing(f) = &mut self.view {
                        f.error = Some(msg.clone());
                    }
                }
                self.notice(NoticeLevel::Error, msg);
            }
        }
    }

    fn on_deleted(&mut self, kind: ResourceKind, report: DeleteReport) {
        self.busy = None;
        let summary = report.summary(kind);
        match report.outcome() {
            DeleteOutcome::AllDeleted => self.notice(NoticeLevel::Success, summary),
            DeleteOutcome::Partial { .. } => {
                let details: Vec<String> = report.failed.iter().map(|(id, m)| format!("{id} ({m})")).collect();
                self.notice(NoticeLevel::Warn, format!("{summary}: {}", details.join(", ")));
            }
        }
        let orphaned = match &self.view {
            View::Editing(f) if f.kind == kind => f.id.as_ref().filter(|id| report.succeeded.contains(id)).cloned(),
            _ => None,
        };
        if let Some(id) = orphaned {
            info!(kind = %kind, id = %id, "ui: form closed, record deleted");
            self.view = View::Listing;
            self.notice(NoticeLevel::Warn, format!("Closed the {kind} form: record {id} was deleted"));
        }
        if kind == self.kind {
            self.selection.clear();
            self.start_fetch_task();
        }
    }
}
