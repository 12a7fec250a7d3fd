#![forbid(unsafe_code)]

use std::time::Instant;

use arcadia_codec::{decode_list, decode_one, Payload, PayloadPart};
use arcadia_core::config::ConsoleConfig;
use arcadia_core::registry::describe;
use arcadia_core::{Record, RecordId, ResourceKind};
use metrics::{counter, histogram};
use reqwest::{multipart, Client, RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{info, warn};

use crate::{AdminApi, ApiError, ApiResult};

/// REST transport. Writes always go out as `multipart/form-data` so one code path
/// covers records with and without an image.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(cfg: &ConsoleConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(cfg.http_timeout())
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { client, base: cfg.api_url.trim_end_matches('/').to_string(), token: cfg.api_token.clone() })
    }

    fn collection_url(&self, kind: ResourceKind) -> String {
        format!("{}{}", self.base, describe(kind).endpoint)
    }

    fn record_url(&self, kind: ResourceKind, id: &RecordId) -> String {
        format!("{}/{}", self.collection_url(kind), id)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    fn build_form(payload: Payload) -> ApiResult<multipart::Form> {
        let mut form = multipart::Form::new();
        for (name, part) in payload.parts {
            form = match part {
                PayloadPart::Text(v) => form.text(name, v),
                PayloadPart::File(img) => {
                    let part = multipart::Part::bytes(img.bytes.to_vec())
                        .file_name(img.file_name)
                        .mime_str(&img.content_type)
                        .map_err(|e| ApiError::Transport(format!("invalid content type: {e}")))?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }

    /// Send and decode; the JSON body is `Null` when the backend answers with no content.
    async fn send(&self, op: &'static str, kind: ResourceKind, req: RequestBuilder) -> ApiResult<Value> {
        let t0 = Instant::now();
        let res = self.exchange(req).await;
        let took = t0.elapsed();
        histogram!("arcadia_api_request_ms", took.as_secs_f64() * 1000.0, "op" => op);
        let outcome = if res.is_ok() { "ok" } else { "err" };
        counter!("arcadia_api_requests_total", 1u64, "op" => op, "kind" => kind.key(), "outcome" => outcome);
        match &res {
            Ok(_) => info!(op, kind = %kind, took_ms = %took.as_millis(), "api: request ok"),
            Err(e) => warn!(op, kind = %kind, error = %e, took_ms = %took.as_millis(), "api: request failed"),
        }
        res
    }

    async fn exchange(&self, req: RequestBuilder) -> ApiResult<Value> {
        let resp = self.authorize(req).send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(rejection(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Map a non-2xx response. The JSON `message` field wins over the raw body.
fn rejection(status: StatusCode, body: &str) -> ApiError {
    let from_json = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(|s| s.to_string()));
    let message = from_json
        .or_else(|| Some(body.trim().to_string()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    if status == StatusCode::NOT_FOUND {
        ApiError::NotFound(message)
    } else {
        ApiError::Rejected { status: status.as_u16(), message }
    }
}

#[async_trait::async_trait]
impl AdminApi for HttpApi {
    async fn list(&self, kind: ResourceKind) -> ApiResult<Vec<Record>> {
        let body = self.send("list", kind, self.client.get(self.collection_url(kind))).await?;
        Ok(decode_list(body))
    }

    async fn create(&self, kind: ResourceKind, payload: Payload) -> ApiResult<Option<Record>> {
        let form = Self::build_form(payload)?;
        let req = self.client.post(self.collection_url(kind)).multipart(form);
        Ok(decode_one(self.send("create", kind, req).await?))
    }

    async fn update(&self, kind: ResourceKind, id: &RecordId, payload: Payload) -> ApiResult<Option<Record>> {
        let form = Self::build_form(payload)?;
        let req = self.client.put(self.record_url(kind, id)).multipart(form);
        Ok(decode_one(self.send("update", kind, req).await?))
    }

    async fn delete(&self, kind: ResourceKind, id: &RecordId) -> ApiResult<()> {
        self.send("delete", kind, self.client.delete(self.record_url(kind, id))).await?;
        Ok(())
    }
}
