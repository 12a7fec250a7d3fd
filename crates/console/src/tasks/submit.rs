#![forbid(unsafe_code)]

use std::time::Instant;

use arcadia_codec::Payload;
use arcadia_core::RecordId;
use tracing::info;

use crate::model::{Busy, SubmitMode};
use crate::{AdminConsole, ConsoleUpdate};

impl AdminConsole {
    /// Occupies the mutation slot until the matching `Submitted` update is applied.
    pub(crate) fn start_submit_task(&mut self, payload: Payload, id: Option<RecordId>, draft: u64) {
        let kind = self.kind;
        let mode = if id.is_some() { SubmitMode::Update } else { SubmitMode::Create };
        self.busy = Some(Busy::Submitting { kind, mode, draft });
        let api = self.api.clone();
        let tx = self.updates_tx.clone();
        self.in_flight += 1;
        info!(kind = %kind, mode = ?mode, draft, parts = payload.parts.len(), upload = payload.has_file(), "submit: start");
        tokio::spawn(async move {
            let t0 = Instant::now();
            let result = match &id {
                Some(id) => api.update(kind, id, payload).await,
                None => api.create(kind, payload).await,
            };
            info!(kind = %kind, mode = ?mode, ok = result.is_ok(), took_ms = %t0.elapsed().as_millis(), "submit: task ended");
            let _ = tx.send(ConsoleUpdate::Submitted { kind, id, draft, result });
        });
    }
}
