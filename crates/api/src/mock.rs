#![forbid(unsafe_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use arcadia_codec::{Payload, PayloadPart};
use arcadia_core::{Record, RecordId, ResourceKind};
use serde_json::{Map, Value};

use crate::{AdminApi, ApiError, ApiResult};

/// One call observed by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    List(ResourceKind),
    Create(ResourceKind),
    Update(ResourceKind, RecordId),
    Delete(ResourceKind, RecordId),
}

#[derive(Default)]
struct MockState {
    records: BTreeMap<ResourceKind, Vec<Record>>,
    failing_deletes: HashMap<RecordId, String>,
    list_delays: HashMap<ResourceKind, Duration>,
    list_failure: Option<String>,
    write_rejection: Option<String>,
    calls: Vec<ApiCall>,
    payloads: Vec<Payload>,
    next_id: u64,
}

/// Simple in-memory backend for tests.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed `kind` with raw JSON objects; entries without an id are ignored.
    pub fn with_records(self, kind: ResourceKind, items: impl IntoIterator<Item = Value>) -> Self {
        {
            let mut st = self.state();
            st.records.entry(kind).or_default().extend(items.into_iter().filter_map(Record::from_value));
        }
        self
    }

    /// Make `delete` of `id` fail with a 500 carrying `message`.
    pub fn fail_delete(self, id: impl Into<RecordId>, message: impl Into<String>) -> Self {
        self.state().failing_deletes.insert(id.into(), message.into());
        self
    }

    /// Hold every `list(kind)` response for `delay`.
    pub fn delay_list(self, kind: ResourceKind, delay: Duration) -> Self {
        self.state().list_delays.insert(kind, delay);
        self
    }

    /// Fail every `list` with a 500 carrying `message` until cleared.
    pub fn set_list_failure(&self, message: Option<&str>) {
        self.state().list_failure = message.map(|m| m.to_string());
    }

    /// Reject every create/update with a 400 carrying `message` until cleared.
    pub fn set_write_rejection(&self, message: Option<&str>) {
        self.state().write_rejection = message.map(|m| m.to_string());
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    /// Payloads received by create/update, in order.
    pub fn payloads(&self) -> Vec<Payload> {
        self.state().payloads.clone()
    }

    pub fn records(&self, kind: ResourceKind) -> Vec<Record> {
        self.state().records.get(&kind).cloned().unwrap_or_default()
    }

    fn apply_payload(fields: &mut Map<String, Value>, payload: &Payload) {
        for (name, part) in &payload.parts {
            let v = match part {
                PayloadPart::Text(s) => Value::String(s.clone()),
                PayloadPart::File(img) => Value::String(format!("uploads/images/{}", img.file_name)),
            };
            fields.insert(name.clone(), v);
        }
    }

    fn check_write(st: &MockState) -> ApiResult<()> {
        match &st.write_rejection {
            Some(m) => Err(ApiError::Rejected { status: 400, message: m.clone() }),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl AdminApi for MockApi {
    async fn list(&self, kind: ResourceKind) -> ApiResult<Vec<Record>> {
        let delay = {
            let mut st = self.state();
            st.calls.push(ApiCall::List(kind));
            st.list_delays.get(&kind).copied()
        };
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        let st = self.state();
        if let Some(m) = &st.list_failure {
            return Err(ApiError::Rejected { status: 500, message: m.clone() });
        }
        Ok(st.records.get(&kind).cloned().unwrap_or_default())
    }

    async fn create(&self, kind: ResourceKind, payload: Payload) -> ApiResult<Option<Record>> {
        let mut st = self.state();
        st.calls.push(ApiCall::Create(kind));
        st.payloads.push(payload.clone());
        Self::check_write(&st)?;
        st.next_id += 1;
        let id = RecordId::from(1000 + st.next_id);
        let mut fields = Map::new();
        fields.insert("id".into(), Value::String(id.to_string()));
        Self::apply_payload(&mut fields, &payload);
        let rec = Record { id, fields };
        st.records.entry(kind).or_default().push(rec.clone());
        Ok(Some(rec))
    }

    async fn update(&self, kind: ResourceKind, id: &RecordId, payload: Payload) -> ApiResult<Option<Record>> {
        let mut st = self.state();
        st.calls.push(ApiCall::Update(kind, id.clone()));
        st.payloads.push(payload.clone());
        Self::check_write(&st)?;
        let rec = st
            .records
            .get_mut(&kind)
            .and_then(|rs| rs.iter_mut().find(|r| &r.id == id))
            .ok_or_else(|| ApiError::NotFound(format!("no {kind} record {id}")))?;
        Self::apply_payload(&mut rec.fields, &payload);
        Ok(Some(rec.clone()))
    }

    async fn delete(&self, kind: ResourceKind, id: &RecordId) -> ApiResult<()> {
        let mut st = self.state();
        st.calls.push(ApiCall::Delete(kind, id.clone()));
        if let Some(m) = st.failing_deletes.get(id) {
            return Err(ApiError::Rejected { status: 500, message: m.clone() });
        }
        let rs = st.records.entry(kind).or_default();
        let before = rs.len();
        rs.retain(|r| &r.id != id);
        if rs.len() == before {
            return Err(ApiError::NotFound(format!("no {kind} record {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seeded() -> MockApi {
        MockApi::new().with_records(
            ResourceKind::Article,
            [json!({ "id": 1, "headline": "One" }), json!({ "id": 2, "headline": "Two" }), json!({ "headline": "no id" })],
        )
    }

    #[tokio::test]
    async fn list_returns_seeded_records_and_logs_calls() {
        let api = seeded();
        let items = api.list(ResourceKind::Article).await.expect("list");
        assert_eq!(items.len(), 2);
        assert!(api.list(ResourceKind::Catalog).await.expect("list").is_empty());
        assert_eq!(api.calls(), vec![ApiCall::List(ResourceKind::Article), ApiCall::List(ResourceKind::Catalog)]);
    }

    #[tokio::test]
    async fn create_then_update_merges_fields() {
        let api = seeded();
        let mut p = Payload::default();
        p.parts.push(("headline".into(), PayloadPart::Text("Three".into())));
        let rec = api.create(ResourceKind::Article, p).await.expect("create").expect("record");
        assert_eq!(rec.get_str("headline"), Some("Three"));

        let mut p = Payload::default();
        p.parts.push(("content".into(), PayloadPart::Text("Body".into())));
        let upd = api.update(ResourceKind::Article, &rec.id, p).await.expect("update").expect("record");
        assert_eq!(upd.get_str("headline"), Some("Three"));
        assert_eq!(upd.get_str("content"), Some("Body"));
        assert_eq!(api.records(ResourceKind::Article).len(), 3);
    }

    #[tokio::test]
    async fn scripted_failures_surface_as_errors() {
        let api = seeded().fail_delete("2", "locked");
        assert!(api.delete(ResourceKind::Article, &"1".into()).await.is_ok());
        let err = api.delete(ResourceKind::Article, &"2".into()).await.unwrap_err();
        assert_eq!(err.user_message(), "locked");
        assert!(matches!(api.delete(ResourceKind::Article, &"9".into()).await, Err(ApiError::NotFound(_))));

        api.set_write_rejection(Some("Headline too long"));
        let err = api.update(ResourceKind::Article, &"2".into(), Payload::default()).await.unwrap_err();
        assert_eq!(err, ApiError::Rejected { status: 400, message: "Headline too long".into() });
    }
}
