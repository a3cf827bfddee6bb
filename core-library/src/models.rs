//! Domain models for the mirrored catalog
//!
//! Catalog items arrive as loosely-shaped JSON from many providers. This module
//! pins down the handful of fields the core relies on (identity, origin,
//! provider mappings) and keeps everything else verbatim so an item written
//! back to the store loses nothing.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub use bridge_traits::catalog::MediaKind;

/// Provider instance id under which the backend exposes the user's own library.
pub const LIBRARY_PROVIDER: &str = "library";

// =============================================================================
// Provider Mapping
// =============================================================================

/// Where else an item is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMapping {
    #[serde(deserialize_with = "deserialize_id")]
    pub item_id: String,
    #[serde(default)]
    pub provider_domain: String,
    #[serde(default)]
    pub provider_instance: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

impl ProviderMapping {
    fn is_library(&self) -> bool {
        self.provider_instance == LIBRARY_PROVIDER || self.provider_domain == LIBRARY_PROVIDER
    }
}

fn default_available() -> bool {
    true
}

// =============================================================================
// Media Item
// =============================================================================

/// One materialized catalog entity (album, artist, track, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Stable within the provider that returned the item
    #[serde(deserialize_with = "deserialize_id")]
    pub item_id: String,

    /// Provider instance that directly returned the item
    pub provider: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default)]
    pub favorite: bool,

    #[serde(default)]
    pub provider_mappings: Vec<ProviderMapping>,

    /// Fields the core does not interpret (artwork, durations, artists, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MediaItem {
    /// Minimal item, mostly useful for hosts building placeholder rows.
    pub fn new(
        kind: MediaKind,
        item_id: impl Into<String>,
        provider: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            provider: provider.into(),
            name: name.into(),
            media_type: Some(kind.as_str().to_string()),
            uri: None,
            favorite: false,
            provider_mappings: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_mapping(mut self, mapping: ProviderMapping) -> Self {
        self.provider_mappings.push(mapping);
        self
    }

    /// Validate and decode one JSON value as an item of `kind`.
    pub fn decode(kind: MediaKind, value: serde_json::Value) -> Result<Self, DecodeError> {
        if !value.is_object() {
            return Err(DecodeError::NotAnObject);
        }

        let item: MediaItem =
            serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        if item.item_id.trim().is_empty() {
            return Err(DecodeError::MissingField("item_id"));
        }
        if item.provider.trim().is_empty() {
            return Err(DecodeError::MissingField("provider"));
        }
        if let Some(found) = item.media_type.as_deref() {
            if found != kind.as_str() {
                return Err(DecodeError::KindMismatch {
                    expected: kind,
                    found: found.to_string(),
                });
            }
        }

        Ok(item)
    }

    /// Decode a serialized JSON payload as read from the store.
    pub fn decode_str(kind: MediaKind, payload: &str) -> Result<Self, DecodeError> {
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        Self::decode(kind, value)
    }

    /// Serialize for the store.
    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Identifier of this item inside the user's library, if it has one.
    ///
    /// Items served by the library provider are their own library entry;
    /// items from streaming providers point at it through a mapping.
    pub fn library_id(&self) -> Option<&str> {
        if self.provider == LIBRARY_PROVIDER {
            return Some(&self.item_id);
        }
        self.provider_mappings
            .iter()
            .find(|m| m.is_library())
            .map(|m| m.item_id.as_str())
    }
}

/// Accept ids sent either as JSON strings or numbers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        UInt(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::UInt(n) => n.to_string(),
    })
}

// =============================================================================
// Decode Errors
// =============================================================================

/// Why a single catalog item was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("item is not a JSON object")]
    NotAnObject,

    #[error("malformed item: {0}")]
    Malformed(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("expected a {expected} but got media_type `{found}`")]
    KindMismatch { expected: MediaKind, found: String },
}

/// Items that decoded plus how many were dropped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Decoded {
    pub items: Vec<MediaItem>,
    pub skipped: usize,
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} decoded, {} skipped", self.items.len(), self.skipped)
    }
}

/// Decode a batch, keeping the good items and logging the bad ones.
pub fn decode_all<I>(kind: MediaKind, values: I) -> Decoded
where
    I: IntoIterator<Item = serde_json::Value>,
{
    values
        .into_iter()
        .enumerate()
        .fold(Decoded::default(), |mut acc, (index, value)| {
            match MediaItem::decode(kind, value) {
                Ok(item) => acc.items.push(item),
                Err(err) => {
                    tracing::warn!(kind = %kind, index, error = %err, "Skipping undecodable item");
                    acc.skipped += 1;
                }
            }
            acc
        })
}

/// Collapse items sharing an `item_id`.
///
/// The last occurrence supplies the fields, the first occurrence keeps its
/// position.
pub fn dedup_by_id(items: Vec<MediaItem>) -> Vec<MediaItem> {
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut unique: Vec<MediaItem> = Vec::with_capacity(items.len());
    for item in items {
        match positions.get(&item.item_id) {
            Some(&index) => unique[index] = item,
            None => {
                positions.insert(item.item_id.clone(), unique.len());
                unique.push(item);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dedup_by_id_last_wins_first_position() {
        let items = vec![
            MediaItem::new(MediaKind::Album, "1", "p1", "old"),
            MediaItem::new(MediaKind::Album, "2", "p1", "two"),
            MediaItem::new(MediaKind::Album, "1", "p2", "new"),
        ];
        let unique = dedup_by_id(items);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].item_id, "1");
        assert_eq!(unique[0].name, "new");
        assert_eq!(unique[1].item_id, "2");
    }

    #[test]
    fn test_decode_keeps_unknown_fields() {
        let value = json!({
            "item_id": "42",
            "provider": "spotify--a1",
            "name": "Kind of Blue",
            "media_type": "album",
            "year": 1959,
            "metadata": { "images": [] }
        });

        let item = MediaItem::decode(MediaKind::Album, value).unwrap();
        assert_eq!(item.item_id, "42");
        assert_eq!(item.extra.get("year"), Some(&json!(1959)));

        let round = MediaItem::decode_str(MediaKind::Album, &item.to_payload().unwrap()).unwrap();
        assert_eq!(round, item);
    }

    #[test]
    fn test_decode_numeric_ids() {
        let item = MediaItem::decode(
            MediaKind::Track,
            json!({ "item_id": 7, "provider": "library",
                    "provider_mappings": [{ "item_id": 99, "provider_domain": "tidal", "provider_instance": "tidal--x" }] }),
        )
        .unwrap();
        assert_eq!(item.item_id, "7");
        assert_eq!(item.provider_mappings[0].item_id, "99");
        assert!(item.provider_mappings[0].available);
    }

    #[test]
    fn test_decode_rejections() {
        assert_eq!(
            MediaItem::decode(MediaKind::Album, json!([1, 2])),
            Err(DecodeError::NotAnObject)
        );
        assert_eq!(
            MediaItem::decode(MediaKind::Album, json!({ "item_id": "", "provider": "p" })),
            Err(DecodeError::MissingField("item_id"))
        );
        assert!(matches!(
            MediaItem::decode(MediaKind::Album, json!({ "item_id": "1" })),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            MediaItem::decode(
                MediaKind::Album,
                json!({ "item_id": "1", "provider": "p", "media_type": "track" })
            ),
            Err(DecodeError::KindMismatch { expected: MediaKind::Album, .. })
        ));
        assert!(MediaItem::decode_str(MediaKind::Album, "{not json").is_err());
    }

    #[test]
    fn test_decode_all_skips_bad_items() {
        let decoded = decode_all(
            MediaKind::Artist,
            vec![
                json!({ "item_id": "1", "provider": "p" }),
                json!("garbage"),
                json!({ "item_id": "2", "provider": "p" }),
            ],
        );
        assert_eq!(decoded.items.len(), 2);
        assert_eq!(decoded.skipped, 1);
        assert_eq!(decoded.to_string(), "2 decoded, 1 skipped");
    }

    #[test]
    fn test_library_id_resolution() {
        let own = MediaItem::new(MediaKind::Album, "12", LIBRARY_PROVIDER, "A");
        assert_eq!(own.library_id(), Some("12"));

        let mapped = MediaItem::new(MediaKind::Album, "sp:1", "spotify--a1", "A").with_mapping(
            ProviderMapping {
                item_id: "12".to_string(),
                provider_domain: "library".to_string(),
                provider_instance: "library".to_string(),
                available: true,
            },
        );
        assert_eq!(mapped.library_id(), Some("12"));

        let foreign = MediaItem::new(MediaKind::Album, "sp:2", "spotify--a1", "B");
        assert_eq!(foreign.library_id(), None);
    }
}
