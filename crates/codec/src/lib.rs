//! Arcadia transfer codec.
//!
//! Maps backend records into editable form state and form state back into the
//! multipart payload the backend expects. Everything is driven by the registry's
//! field descriptors; no call site names a resource-specific field.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use arcadia_core::media::{MediaResolver, PendingImage, FORM_PLACEHOLDER};
use arcadia_core::registry::{describe, scalar_text, FieldSpec, FieldType, Required};
use arcadia_core::{Record, RecordId, ResourceKind};
use serde::Serialize;

mod envelope;
mod payload;

pub use envelope::{decode_list, decode_one};
pub use payload::{to_payload, Payload, PayloadPart};

/// Editable draft of one record. `id == None` means create mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormState {
    pub kind: ResourceKind,
    pub id: Option<RecordId>,
    /// Text value per descriptor field (the upload slot is held separately).
    pub values: BTreeMap<String, String>,
    /// Stored image reference of the record being edited.
    pub existing_image: Option<String>,
    #[serde(skip)]
    pub pending_image: Option<PendingImage>,
    /// Last backend rejection, shown verbatim above the form.
    pub error: Option<String>,
}

impl FormState {
    pub fn is_create(&self) -> bool {
        self.id.is_none()
    }

    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(|s| s.as_str()).unwrap_or("")
    }

    /// Set a text field. Returns false for names the kind's descriptor does not edit as text.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let Some(spec) = describe(self.kind).field(name) else { return false; };
        if matches!(spec.ty, FieldType::Image { .. }) {
            return false;
        }
        self.values.insert(spec.name.to_string(), value.into());
        true
    }

    /// Keep a picked file for the next submit; the preview switches to it immediately.
    pub fn attach_image(&mut self, img: PendingImage) {
        self.pending_image = Some(img);
    }

    /// URL the form's upload area shows: pending file, else stored image, else placeholder.
    pub fn preview_url(&self, media: &MediaResolver) -> String {
        if let Some(img) = &self.pending_image {
            return img.preview_url.clone();
        }
        match self.existing_image.as_deref() {
            Some(raw) if !raw.trim().is_empty() => media.resolve_display_url(raw),
            _ => FORM_PLACEHOLDER.to_string(),
        }
    }
}

/// Create-mode draft seeded with descriptor defaults.
pub fn empty_form(kind: ResourceKind) -> FormState {
    let values = describe(kind)
        .text_fields()
        .map(|f| (f.name.to_string(), f.default.unwrap_or("").to_string()))
        .collect();
    FormState { kind, id: None, values, existing_image: None, pending_image: None, error: None }
}

/// Edit-mode draft populated from a fetched record.
pub fn to_form_state(record: &Record, kind: ResourceKind) -> FormState {
    let d = describe(kind);
    let values = d
        .text_fields()
        .map(|f| (f.name.to_string(), decode_field(f, record.get(f.name))))
        .collect();
    let existing_image = d.image_field().and_then(|f| match f.ty {
        FieldType::Image { read_keys } => record.first_str(read_keys).map(|s| s.to_string()),
        _ => None,
    });
    FormState { kind, id: Some(record.id.clone()), values, existing_image, pending_image: None, error: None }
}

fn decode_field(spec: &FieldSpec, raw: Option<&serde_json::Value>) -> String {
    let fallback = || spec.default.unwrap_or("").to_string();
    match spec.ty {
        FieldType::Secret => String::new(),
        FieldType::TagList => match raw {
            None => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
        },
        FieldType::Date => raw
            .and_then(|v| v.as_str())
            .and_then(payload::parse_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        FieldType::Enum(options) => {
            let v = raw.map(scalar_text).unwrap_or_default();
            if options.contains(&v.as_str()) { v } else { enum_default(spec, options) }
        }
        _ => match raw.map(scalar_text) {
            Some(v) if !v.is_empty() => v,
            _ => fallback(),
        },
    }
}

pub(crate) fn enum_default(spec: &FieldSpec, options: &[&str]) -> String {
    spec.default.or_else(|| options.first().copied()).unwrap_or("").to_string()
}

/// A required-field or range problem caught before any network call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationGap {
    #[error("{label} is required")]
    MissingField { field: &'static str, label: &'static str },
    #[error("{label} must be a number between {min} and {max}")]
    OutOfRange { field: &'static str, label: &'static str, min: f64, max: f64 },
    #[error("{label} must be a valid email address")]
    InvalidEmail { field: &'static str, label: &'static str },
}

impl ValidationGap {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationGap::MissingField { field, .. }
            | ValidationGap::OutOfRange { field, .. }
            | ValidationGap::InvalidEmail { field, .. } => field,
        }
    }
}

/// Input-layer checks mirroring the form's required markers.
pub fn validate(form: &FormState) -> Result<(), ValidationGap> {
    for f in describe(form.kind).text_fields() {
        let v = form.value(f.name).trim();
        let required = match f.required {
            Required::Always => true,
            Required::OnCreate => form.is_create(),
            Required::Never => false,
        };
        if v.is_empty() {
            if required {
                return Err(ValidationGap::MissingField { field: f.name, label: f.label });
            }
            continue;
        }
        match f.ty {
            FieldType::Number { min, max } => {
                let lo = min.unwrap_or(f64::MIN);
                let hi = max.unwrap_or(f64::MAX);
                match v.parse::<f64>() {
                    Ok(n) if n.is_finite() && n >= lo && n <= hi => {}
                    _ => return Err(ValidationGap::OutOfRange { field: f.name, label: f.label, min: lo, max: hi }),
                }
            }
            FieldType::Email => {
                let ok = v.split_once('@').map(|(user, host)| !user.is_empty() && host.contains('.')).unwrap_or(false);
                if !ok {
                    return Err(ValidationGap::InvalidEmail { field: f.name, label: f.label });
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(v: serde_json::Value) -> Record {
        Record::from_value(v).expect("record")
    }

    #[test]
    fn empty_form_uses_defaults() {
        let f = empty_form(ResourceKind::Account);
        assert!(f.is_create());
        assert_eq!(f.value("role"), "user");
        assert_eq!(f.value("username"), "");
        assert!(!f.values.contains_key("profile"));
    }

    #[test]
    fn account_record_defaults_role_and_hides_password() {
        let r = rec(serde_json::json!({ "id": 9, "username": "kim", "email": "kim@x.io", "password": "hash", "profile": "images/kim.png" }));
        let f = to_form_state(&r, ResourceKind::Account);
        assert_eq!(f.id, Some(RecordId::from("9")));
        assert_eq!(f.value("role"), "user");
        assert_eq!(f.value("password"), "");
        assert_eq!(f.existing_image.as_deref(), Some("images/kim.png"));
        assert!(f.pending_image.is_none());
    }

    #[test]
    fn catalog_record_normalizes_dates_and_tag_lists() {
        let r = rec(serde_json::json!({
            "id": 1, "title": "Celeste", "rating": 9, "releaseDate": "2018-01-25T00:00:00.000Z",
            "genre": ["Platformer", "Indie"], "platform": "[\"PC\"]", "image": "covers/images/celeste.jpg"
        }));
        let f = to_form_state(&r, ResourceKind::Catalog);
        assert_eq!(f.value("releaseDate"), "2018-01-25");
        assert_eq!(f.value("genre"), "[\"Platformer\",\"Indie\"]");
        assert_eq!(f.value("platform"), "[\"PC\"]");
        assert_eq!(f.value("rating"), "9");
        assert_eq!(f.existing_image.as_deref(), Some("covers/images/celeste.jpg"));
    }

    #[test]
    fn preview_prefers_pending_then_existing_then_placeholder() {
        let media = MediaResolver::new("http://m.test");
        let mut f = empty_form(ResourceKind::Article);
        assert_eq!(f.preview_url(&media), FORM_PLACEHOLDER);
        f.existing_image = Some("x/images/a.png".into());
        assert_eq!(f.preview_url(&media), "http://m.test/images/a.png");
        let img = PendingImage::from_bytes("b.png", vec![0u8]);
        let preview = img.preview_url.clone();
        f.attach_image(img);
        assert_eq!(f.preview_url(&media), preview);
    }

    #[test]
    fn set_rejects_unknown_and_image_fields() {
        let mut f = empty_form(ResourceKind::Article);
        assert!(f.set("headline", "Hi"));
        assert!(!f.set("title", "nope"));
        assert!(!f.set("picture", "nope"));
        assert_eq!(f.value("headline"), "Hi");
    }

    #[test]
    fn validate_required_markers() {
        let mut f = empty_form(ResourceKind::Account);
        let gap = validate(&f).unwrap_err();
        assert_eq!(gap.field(), "username");
        f.set("username", "neo");
        f.set("email", "neo@zion.io");
        assert_eq!(validate(&f).unwrap_err().field(), "password");
        f.set("password", "s3cret");
        assert!(validate(&f).is_ok());
        // Editing an existing account may leave the password blank.
        f.id = Some(RecordId::from("1"));
        f.set("password", "");
        assert!(validate(&f).is_ok());
    }

    #[test]
    fn validate_ranges_and_email() {
        let mut f = empty_form(ResourceKind::Catalog);
        f.set("title", "Doom");
        f.set("rating", "11");
        assert!(matches!(validate(&f), Err(ValidationGap::OutOfRange { field: "rating", .. })));
        f.set("rating", "8.5");
        assert!(validate(&f).is_ok());

        let mut a = empty_form(ResourceKind::Account);
        a.set("username", "x");
        a.set("email", "not-an-email");
        a.set("password", "p");
        assert!(matches!(validate(&a), Err(ValidationGap::InvalidEmail { .. })));
    }
}
