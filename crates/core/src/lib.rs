//! Arcadia core types shared by the codec, API and console crates.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub mod config;
pub mod media;
pub mod registry;

/// The four record collections the console manages. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    #[serde(rename = "games")]
    Catalog,
    #[serde(rename = "news")]
    Article,
    #[serde(rename = "community")]
    CommunityPost,
    #[serde(rename = "users")]
    Account,
}

impl ResourceKind {
    /// Tab order of the dashboard.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Catalog,
        ResourceKind::Article,
        ResourceKind::CommunityPost,
        ResourceKind::Account,
    ];

    /// Route key, also the last segment of the endpoint path.
    pub fn key(self) -> &'static str {
        match self {
            ResourceKind::Catalog => "games",
            ResourceKind::Article => "news",
            ResourceKind::CommunityPost => "community",
            ResourceKind::Account => "users",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource kind: {0} (expect games, news, community or users)")]
pub struct UnknownKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "games" | "game" | "catalog" => Ok(ResourceKind::Catalog),
            "news" | "article" | "articles" => Ok(ResourceKind::Article),
            "community" | "posts" | "post" => Ok(ResourceKind::CommunityPost),
            "users" | "user" | "accounts" | "account" => Ok(ResourceKind::Account),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Backend record identifier. The backend may send numbers or strings; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Accept a JSON number or non-empty string.
    pub fn from_json(v: &serde_json::Value) -> Option<Self> {
        match v {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            serde_json::Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

/// One backend record: an opaque field map plus its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    /// Raw fields as returned by the backend (including `id`).
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    /// Build from a backend object; `None` when it is not an object or has no usable `id`.
    pub fn from_value(v: serde_json::Value) -> Option<Self> {
        let serde_json::Value::Object(fields) = v else { return None; };
        let id = fields.get("id").and_then(RecordId::from_json)?;
        Some(Self { id, fields })
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    /// String value of `key`, ignoring blanks.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str()).filter(|s| !s.trim().is_empty())
    }

    /// First non-blank string among `keys`.
    pub fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get_str(k))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = serde_json::Value::deserialize(deserializer)?;
        Record::from_value(v).ok_or_else(|| serde::de::Error::custom("record must be an object with an `id`"))
    }
}

pub mod prelude {
    pub use super::media::{MediaResolver, PendingImage};
    pub use super::registry::{describe, FieldSpec, FieldType, Required, ResourceDescriptor};
    pub use super::{Record, RecordId, ResourceKind};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_route_keys_and_aliases() {
        for k in ResourceKind::ALL {
            assert_eq!(k.key().parse::<ResourceKind>().unwrap(), k);
        }
        assert_eq!("Catalog".parse::<ResourceKind>().unwrap(), ResourceKind::Catalog);
        assert!("widgets".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn record_accepts_numeric_and_string_ids() {
        let a = Record::from_value(serde_json::json!({ "id": 7, "title": "Doom" })).expect("record");
        assert_eq!(a.id.as_str(), "7");
        let b = Record::from_value(serde_json::json!({ "id": "abc" })).expect("record");
        assert_eq!(b.id, RecordId::from("abc"));
        assert!(Record::from_value(serde_json::json!({ "title": "no id" })).is_none());
        assert!(Record::from_value(serde_json::json!({ "id": "  " })).is_none());
        assert!(Record::from_value(serde_json::json!([1, 2])).is_none());
    }

    #[test]
    fn record_string_helpers_skip_blanks() {
        let r = Record::from_value(serde_json::json!({ "id": 1, "title": "", "headline": "Launch", "x": null })).unwrap();
        assert_eq!(r.get_str("title"), None);
        assert_eq!(r.first_str(&["title", "headline"]), Some("Launch"));
        assert!(r.get("x").is_none());
    }
}
