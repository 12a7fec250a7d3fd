//! Static resource registry.
//!
//! This module provides:
//! - One descriptor per resource kind (endpoint, form fields, list columns)
//! - Column specs for the list table
//! - A row projector that renders a record into the list table's cells

#![forbid(unsafe_code)]

use serde::Serialize;

use crate::media::MediaResolver;
use crate::{Record, RecordId, ResourceKind};

/// Semantic type of a form field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldType {
    ShortText,
    LongText,
    Email,
    /// Write-only credential; never pre-filled, omitted from payloads when blank.
    Secret,
    Enum(&'static [&'static str]),
    Number { min: Option<f64>, max: Option<f64> },
    Date,
    /// String-encoded list, e.g. `["Action","RPG"]`.
    TagList,
    /// Upload slot. `read_keys` are the record keys an existing image may be stored under.
    Image { read_keys: &'static [&'static str] },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Required {
    Always,
    /// Required when creating, optional when updating (blank keeps the current value).
    OnCreate,
    Never,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub ty: FieldType,
    pub required: Required,
    pub default: Option<&'static str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Select,
    Thumbnail,
    Title,
    Detail,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub label: &'static str,
    pub width: f32,
}

/// What the list table's detail column shows for a kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetailSource {
    /// Raw field value, `-` when absent.
    Field(&'static str),
    /// `createdAt` rendered as a calendar date.
    CreatedDate,
}

#[derive(Debug, PartialEq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub endpoint: &'static str,
    pub label: &'static str,
    /// Whether the console offers create/edit forms (false: list and delete only).
    pub editable: bool,
    pub fields: &'static [FieldSpec],
    pub title_label: &'static str,
    pub detail_label: &'static str,
    pub detail: DetailSource,
}

impl ResourceDescriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    /// The single upload slot of this kind, if any.
    pub fn image_field(&self) -> Option<&'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().find(|f| matches!(f.ty, FieldType::Image { .. }))
    }

    /// Fields edited as text (everything except the upload slot).
    pub fn text_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().filter(|f| !matches!(f.ty, FieldType::Image { .. }))
    }
}

const fn field(name: &'static str, label: &'static str, ty: FieldType, required: Required) -> FieldSpec {
    FieldSpec { name, label, ty, required, default: None }
}

const ROLES: &[&str] = &["user", "admin"];
const PICTURE_KEYS: &[&str] = &["picture", "image"];
const PROFILE_KEYS: &[&str] = &["profile"];

static CATALOG_FIELDS: [FieldSpec; 9] = [
    field("title", "Title", FieldType::ShortText, Required::Always),
    field("developer", "Developer", FieldType::ShortText, Required::Never),
    field("publisher", "Publisher", FieldType::ShortText, Required::Never),
    field("rating", "Rating (0-10)", FieldType::Number { min: Some(0.0), max: Some(10.0) }, Required::Never),
    field("releaseDate", "Release Date", FieldType::Date, Required::Never),
    field("detail", "Description", FieldType::LongText, Required::Never),
    field("genre", "Genre (e.g. [\"Action\"])", FieldType::TagList, Required::Never),
    field("platform", "Platform (e.g. [\"PC\"])", FieldType::TagList, Required::Never),
    field("picture", "Cover", FieldType::Image { read_keys: PICTURE_KEYS }, Required::Never),
];

static ARTICLE_FIELDS: [FieldSpec; 3] = [
    field("headline", "Headline", FieldType::ShortText, Required::Always),
    field("content", "Content", FieldType::LongText, Required::Always),
    field("picture", "Cover", FieldType::Image { read_keys: PICTURE_KEYS }, Required::Never),
];

static ACCOUNT_FIELDS: [FieldSpec; 5] = [
    field("username", "Username", FieldType::ShortText, Required::Always),
    field("email", "Email", FieldType::Email, Required::Always),
    FieldSpec { name: "role", label: "Role", ty: FieldType::Enum(ROLES), required: Required::Always, default: Some("user") },
    field("password", "Password", FieldType::Secret, Required::OnCreate),
    field("profile", "Profile", FieldType::Image { read_keys: PROFILE_KEYS }, Required::Never),
];

static CATALOG: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Catalog,
    endpoint: "/games",
    label: "Games",
    editable: true,
    fields: &CATALOG_FIELDS,
    title_label: "Title / Headline",
    detail_label: "Rating",
    detail: DetailSource::Field("rating"),
};

static ARTICLE: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Article,
    endpoint: "/news",
    label: "News",
    editable: true,
    fields: &ARTICLE_FIELDS,
    title_label: "Title / Headline",
    detail_label: "Detail",
    detail: DetailSource::CreatedDate,
};

static COMMUNITY: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::CommunityPost,
    endpoint: "/community",
    label: "Community",
    editable: false,
    fields: &[],
    title_label: "Title / Headline",
    detail_label: "Detail",
    detail: DetailSource::CreatedDate,
};

static ACCOUNT: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Account,
    endpoint: "/users",
    label: "Users",
    editable: true,
    fields: &ACCOUNT_FIELDS,
    title_label: "Username",
    detail_label: "Role",
    detail: DetailSource::Field("role"),
};

/// Total lookup over the resource kinds.
pub fn describe(kind: ResourceKind) -> &'static ResourceDescriptor {
    match kind {
        ResourceKind::Catalog => &CATALOG,
        ResourceKind::Article => &ARTICLE,
        ResourceKind::CommunityPost => &COMMUNITY,
        ResourceKind::Account => &ACCOUNT,
    }
}

fn col(kind: ColumnKind, label: &'static str, width: f32) -> ColumnSpec {
    ColumnSpec { kind, label, width }
}

/// Full column set of the list table for a kind.
pub fn columns_for(kind: ResourceKind) -> Vec<ColumnSpec> {
    let d = describe(kind);
    vec![
        col(ColumnKind::Select, "", 40.0),
        col(ColumnKind::Thumbnail, "Image/Profile", 64.0),
        col(ColumnKind::Title, d.title_label, 320.0),
        col(ColumnKind::Detail, d.detail_label, 120.0),
    ]
}

/// Keys probed (in order) for a list row's primary text.
pub const TITLE_KEYS: &[&str] = &["title", "headline", "username"];
/// Keys probed (in order) for a list row's thumbnail.
pub const THUMBNAIL_KEYS: &[&str] = &["picture", "image", "profile"];
const SNIPPET_CHARS: usize = 40;

/// One rendered list row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowView {
    pub id: RecordId,
    pub thumbnail_url: String,
    pub title: String,
    pub subtitle: String,
    pub detail: String,
}

/// Render a record into list cells.
pub fn project_row(record: &Record, kind: ResourceKind, media: &MediaResolver) -> RowView {
    let title = record.first_str(TITLE_KEYS).unwrap_or("No Title").to_string();
    let subtitle = match record.get_str("email") {
        Some(email) => email.to_string(),
        None => record
            .get_str("content")
            .map(|c| format!("{}...", c.chars().take(SNIPPET_CHARS).collect::<String>()))
            .unwrap_or_default(),
    };
    let detail = match describe(kind).detail {
        DetailSource::Field(key) => record.get(key).map(scalar_text).filter(|s| !s.is_empty()).unwrap_or_else(|| "-".into()),
        DetailSource::CreatedDate => record
            .get_str("createdAt")
            .and_then(render_date)
            .unwrap_or_else(|| "-".into()),
    };
    let thumbnail_url = media.resolve_display_url(record.first_str(THUMBNAIL_KEYS).unwrap_or(""));
    RowView { id: record.id.clone(), thumbnail_url, title, subtitle, detail }
}

/// Render a JSON scalar as plain text (strings unquoted).
pub fn scalar_text(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_date(s: &str) -> Option<String> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> MediaResolver {
        MediaResolver::new("http://api.test")
    }

    fn rec(v: serde_json::Value) -> Record {
        Record::from_value(v).expect("record")
    }

    #[test]
    fn describe_is_total_and_consistent() {
        for k in ResourceKind::ALL {
            let d = describe(k);
            assert_eq!(d.kind, k);
            assert_eq!(d.endpoint, format!("/{}", k.key()));
        }
    }

    #[test]
    fn image_field_names_match_backend_contract() {
        assert_eq!(describe(ResourceKind::Catalog).image_field().map(|f| f.name), Some("picture"));
        assert_eq!(describe(ResourceKind::Article).image_field().map(|f| f.name), Some("picture"));
        assert_eq!(describe(ResourceKind::Account).image_field().map(|f| f.name), Some("profile"));
        assert!(describe(ResourceKind::CommunityPost).image_field().is_none());
    }

    #[test]
    fn community_posts_are_list_only() {
        let d = describe(ResourceKind::CommunityPost);
        assert!(!d.editable);
        assert!(d.fields.is_empty());
    }

    #[test]
    fn columns_use_kind_labels() {
        let cols = columns_for(ResourceKind::Account);
        assert_eq!(cols.len(), 4);
        assert_eq!(cols[2].label, "Username");
        assert_eq!(cols[3].label, "Role");
        assert_eq!(columns_for(ResourceKind::Catalog)[3].label, "Rating");
    }

    #[test]
    fn project_catalog_row() {
        let r = rec(serde_json::json!({ "id": 1, "title": "Hades", "rating": 9.5, "picture": "uploads\\images\\hades.png" }));
        let row = project_row(&r, ResourceKind::Catalog, &media());
        assert_eq!(row.title, "Hades");
        assert_eq!(row.detail, "9.5");
        assert_eq!(row.subtitle, "");
        assert_eq!(row.thumbnail_url, "http://api.test/images/hades.png");
    }

    #[test]
    fn project_article_row_snippets_content() {
        let content = "a".repeat(60);
        let r = rec(serde_json::json!({ "id": 2, "headline": "Patch", "content": content, "createdAt": "2024-02-03T10:00:00Z" }));
        let row = project_row(&r, ResourceKind::Article, &media());
        assert_eq!(row.subtitle, format!("{}...", "a".repeat(40)));
        assert_eq!(row.detail, "2024-02-03");
    }

    #[test]
    fn project_account_row_and_fallbacks() {
        let r = rec(serde_json::json!({ "id": 3, "username": "neo", "email": "neo@zion.io", "role": "admin" }));
        let row = project_row(&r, ResourceKind::Account, &media());
        assert_eq!((row.title.as_str(), row.subtitle.as_str(), row.detail.as_str()), ("neo", "neo@zion.io", "admin"));
        assert_eq!(row.thumbnail_url, crate::media::PLACEHOLDER);

        let bare = rec(serde_json::json!({ "id": 4 }));
        let row = project_row(&bare, ResourceKind::CommunityPost, &media());
        assert_eq!(row.title, "No Title");
        assert_eq!(row.detail, "-");
    }
}
