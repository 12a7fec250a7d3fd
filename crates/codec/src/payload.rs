#![forbid(unsafe_code)]

use arcadia_core::media::PendingImage;
use arcadia_core::registry::{describe, FieldType};
use arcadia_core::ResourceKind;
use chrono::{NaiveDate, SecondsFormat, TimeZone, Utc};
use smallvec::SmallVec;

use crate::{enum_default, FormState};

/// Blank tag lists are sent as an empty encoded list.
pub const EMPTY_TAG_LIST: &str = "[]";

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadPart {
    Text(String),
    File(PendingImage),
}

/// Ordered multipart body for a create or update call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    pub parts: SmallVec<[(String, PayloadPart); 10]>,
}

impl Payload {
    fn push_text(&mut self, name: &str, value: impl Into<String>) {
        self.parts.push((name.to_string(), PayloadPart::Text(value.into())));
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|(n, p)| match p {
            PayloadPart::Text(s) if n == name => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn file(&self, name: &str) -> Option<&PendingImage> {
        self.parts.iter().find_map(|(n, p)| match p {
            PayloadPart::File(f) if n == name => Some(f),
            _ => None,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.parts.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn has_file(&self) -> bool {
        self.parts.iter().any(|(_, p)| matches!(p, PayloadPart::File(_)))
    }
}

/// Build the transport payload for `kind`. Never fails: invalid values degrade to
/// defaults or are omitted so the backend keeps what it has.
pub fn to_payload(form: &FormState, kind: ResourceKind) -> Payload {
    let mut out = Payload::default();
    for f in describe(kind).fields {
        match f.ty {
            FieldType::ShortText | FieldType::LongText | FieldType::Email => {
                out.push_text(f.name, form.value(f.name));
            }
            FieldType::Enum(options) => {
                let v = form.value(f.name).trim();
                let v = if options.contains(&v) { v.to_string() } else { enum_default(f, options) };
                out.push_text(f.name, v);
            }
            FieldType::Number { .. } => {
                let v = form.value(f.name).trim();
                if v.parse::<f64>().map(|n| n.is_finite()).unwrap_or(false) {
                    out.push_text(f.name, v);
                }
            }
            FieldType::Date => {
                if let Some(ts) = parse_date(form.value(f.name)).and_then(iso_timestamp) {
                    out.push_text(f.name, ts);
                }
            }
            FieldType::TagList => {
                let v = form.value(f.name);
                out.push_text(f.name, if v.trim().is_empty() { EMPTY_TAG_LIST } else { v });
            }
            FieldType::Secret => {
                let v = form.value(f.name);
                if !v.is_empty() {
                    out.push_text(f.name, v);
                }
            }
            FieldType::Image { .. } => {
                if let Some(img) = &form.pending_image {
                    out.parts.push((f.name.to_string(), PayloadPart::File(img.clone())));
                }
            }
        }
    }
    out
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// UTC midnight of `d`, millisecond precision.
fn iso_timestamp(d: NaiveDate) -> Option<String> {
    let midnight = d.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).to_rfc3339_opts(SecondsFormat::Millis, true))
}
