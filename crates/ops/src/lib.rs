//! Arcadia Ops: bulk mutations fanned out over the admin API.

#![forbid(unsafe_code)]

use std::time::Instant;

use arcadia_api::AdminApi;
use arcadia_core::{RecordId, ResourceKind};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

/// Per-id result of a bulk delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub succeeded: Vec<RecordId>,
    /// Failed ids with the backend's message.
    pub failed: Vec<(RecordId, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    AllDeleted,
    Partial { failed: usize },
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn outcome(&self) -> DeleteOutcome {
        if self.is_complete() {
            DeleteOutcome::AllDeleted
        } else {
            DeleteOutcome::Partial { failed: self.failed.len() }
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// One-line operator summary.
    pub fn summary(&self, kind: ResourceKind) -> String {
        match self.outcome() {
            DeleteOutcome::AllDeleted => format!("Deleted {} {kind} record(s)", self.succeeded.len()),
            DeleteOutcome::Partial { failed } => format!(
                "Deleted {} of {} {kind} record(s); {failed} failed",
                self.succeeded.len(),
                self.total()
            ),
        }
    }
}

/// Issue one DELETE per id concurrently. Never short-circuits: every id is attempted
/// and reported, and nothing is rolled back.
pub async fn delete_many(api: &dyn AdminApi, kind: ResourceKind, ids: &[RecordId]) -> DeleteReport {
    let t0 = Instant::now();
    info!(kind = %kind, count = ids.len(), "ops: bulk delete start");
    let results = join_all(ids.iter().map(|id| async move { (id, api.delete(kind, id).await) })).await;
    let mut report = DeleteReport::default();
    for (id, res) in results {
        match res {
            Ok(()) => report.succeeded.push(id.clone()),
            Err(e) => {
                warn!(kind = %kind, id = %id, error = %e, "ops: delete failed");
                report.failed.push((id.clone(), e.user_message()));
            }
        }
    }
    if !report.failed.is_empty() {
        metrics::counter!("arcadia_bulk_delete_failed_total", report.failed.len() as u64, "kind" => kind.key());
    }
    info!(
        kind = %kind,
        ok = report.succeeded.len(),
        failed = report.failed.len(),
        took_ms = %t0.elapsed().as_millis(),
        "ops: bulk delete done"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcadia_api::{ApiCall, MockApi};
    use serde_json::json;

    fn three_games() -> MockApi {
        MockApi::new().with_records(
            ResourceKind::Catalog,
            [json!({ "id": 1, "title": "A" }), json!({ "id": 2, "title": "B" }), json!({ "id": 3, "title": "C" })],
        )
    }

    #[tokio::test]
    async fn partial_failure_still_attempts_every_id() {
        let api = three_games().fail_delete("2", "in use");
        let ids: Vec<RecordId> = vec!["1".into(), "2".into()];
        let report = delete_many(&api, ResourceKind::Catalog, &ids).await;
        assert_eq!(report.succeeded, vec![RecordId::from("1")]);
        assert_eq!(report.failed, vec![(RecordId::from("2"), "in use".to_string())]);
        assert_eq!(report.outcome(), DeleteOutcome::Partial { failed: 1 });
        let remaining: Vec<String> = api.records(ResourceKind::Catalog).iter().map(|r| r.id.to_string()).collect();
        assert_eq!(remaining, vec!["2", "3"]);
        let deletes = api.calls().into_iter().filter(|c| matches!(c, ApiCall::Delete(..))).count();
        assert_eq!(deletes, 2);
    }

    #[tokio::test]
    async fn all_deleted_reports_complete() {
        let api = three_games();
        let ids: Vec<RecordId> = vec!["1".into(), "3".into()];
        let report = delete_many(&api, ResourceKind::Catalog, &ids).await;
        assert!(report.is_complete());
        assert_eq!(report.summary(ResourceKind::Catalog), "Deleted 2 games record(s)");
        assert_eq!(api.records(ResourceKind::Catalog).len(), 1);
    }

    #[tokio::test]
    async fn empty_id_list_is_a_no_op() {
        let api = three_games();
        let report = delete_many(&api, ResourceKind::Catalog, &[]).await;
        assert_eq!(report.total(), 0);
        assert!(api.calls().is_empty());
    }

    #[test]
    fn partial_summary_counts() {
        let r = DeleteReport { succeeded: vec!["1".into()], failed: vec![("2".into(), "x".into())] };
        assert_eq!(r.summary(ResourceKind::Article), "Deleted 1 of 2 news record(s); 1 failed");
    }
}
