#![forbid(unsafe_code)]

use std::time::Instant;

use tracing::{info, warn};

use crate::{AdminConsole, ConsoleUpdate};

impl AdminConsole {
    /// Fetch the active kind under a fresh generation tag. Earlier fetches keep
    /// running; their results are dropped when they arrive.
    pub(crate) fn start_fetch_task(&mut self) {
        self.list.generation += 1;
        self.list.loading = true;
        let generation = self.list.generation;
        let kind = self.kind;
        let api = self.api.clone();
        let tx = self.updates_tx.clone();
        self.in_flight += 1;
        info!(kind = %kind, generation, "fetch: start");
        tokio::spawn(async move {
            let t0 = Instant::now();
            let result = api.list(kind).await;
            match &result {
                Ok(items) => info!(kind = %kind, generation, items = items.len(), took_ms = %t0.elapsed().as_millis(), "fetch: ok"),
                Err(e) => warn!(kind = %kind, generation, error = %e, took_ms = %t0.elapsed().as_millis(), "fetch: failed"),
            }
            let _ = tx.send(ConsoleUpdate::Listed { kind, generation, result });
        });
    }
}
