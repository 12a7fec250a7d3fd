#![forbid(unsafe_code)]

use tracing::info;

use crate::model::{Busy, PendingDeletion};
use crate::{AdminConsole, ConsoleUpdate};

impl AdminConsole {
    pub(crate) fn start_delete_task(&mut self, pending: PendingDeletion) {
        let PendingDeletion { kind, ids } = pending;
        self.busy = Some(Busy::Deleting { kind, ids: ids.clone() });
        let api = self.api.clone();
        let tx = self.updates_tx.clone();
        self.in_flight += 1;
        info!(kind = %kind, count = ids.len(), "delete: start");
        tokio::spawn(async move {
            let report = arcadia_ops::delete_many(api.as_ref(), kind, &ids).await;
            let _ = tx.send(ConsoleUpdate::Deleted { kind, report });
        });
    }
}
