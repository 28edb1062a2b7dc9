//! Record-level types shared by every entity.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BackendError, StorageError, StorageResult};
use crate::schema::{self, EntitySchema};

/// A record in its canonical, backend-independent JSON shape.
///
/// Keys are the camelCase field names of the wire contract (`createdAt`,
/// `hoverImage`, ...). Every adapter produces records in this shape no matter
/// how the backend stores them.
pub type Record = Map<String, Value>;

/// The entities persisted through a [`DataSource`](crate::core::DataSource).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Product,
    Category,
    User,
    Order,
    Review,
    Comment,
    Article,
}

impl EntityKind {
    /// All entity kinds, in catalog order.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Product,
        EntityKind::Category,
        EntityKind::User,
        EntityKind::Order,
        EntityKind::Review,
        EntityKind::Comment,
        EntityKind::Article,
    ];

    /// Returns the storage schema describing this entity.
    pub fn schema(self) -> &'static EntitySchema {
        match self {
            EntityKind::Product => &schema::PRODUCT,
            EntityKind::Category => &schema::CATEGORY,
            EntityKind::User => &schema::USER,
            EntityKind::Order => &schema::ORDER,
            EntityKind::Review => &schema::REVIEW,
            EntityKind::Comment => &schema::COMMENT,
            EntityKind::Article => &schema::ARTICLE,
        }
    }

    /// Returns the lowercase name of the entity.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Product => "product",
            EntityKind::Category => "category",
            EntityKind::User => "user",
            EntityKind::Order => "order",
            EntityKind::Review => "review",
            EntityKind::Comment => "comment",
            EntityKind::Article => "article",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let singular = normalized
            .strip_suffix("ies")
            .map(|stem| format!("{stem}y"))
            .or_else(|| normalized.strip_suffix('s').map(str::to_string))
            .unwrap_or_else(|| normalized.clone());

        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized || kind.as_str() == singular)
            .ok_or_else(|| format!("unknown entity: {s}"))
    }
}

/// A typed entity that can be decoded from a canonical [`Record`].
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The kind of this entity.
    const KIND: EntityKind;

    /// Returns the opaque identifier.
    fn id(&self) -> &str;
}

/// Current time as Unix epoch seconds.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Decodes a canonical record into a typed entity.
pub fn from_record<E: Entity>(record: Record) -> StorageResult<E> {
    serde_json::from_value(Value::Object(record)).map_err(|e| {
        StorageError::Backend(BackendError::SerializationError {
            message: format!("failed to decode {}: {}", E::KIND, e),
        })
    })
}

/// Serializes a typed input into a record, dropping absent optional keys.
pub fn to_record<T: Serialize>(value: &T) -> StorageResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::Backend(BackendError::SerializationError {
            message: format!("expected an object, got {other}"),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_from_str() {
        assert_eq!("product".parse::<EntityKind>().unwrap(), EntityKind::Product);
        assert_eq!("Products".parse::<EntityKind>().unwrap(), EntityKind::Product);
        assert_eq!(
            "categories".parse::<EntityKind>().unwrap(),
            EntityKind::Category
        );
        assert!("widgets".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::Article.to_string(), "article");
        assert_eq!(EntityKind::ALL.len(), 7);
    }
}
