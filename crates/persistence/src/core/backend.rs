//! Backend identification and capability discovery.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifies the type of storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite database (file-based or in-memory).
    Sqlite,
    /// MongoDB (document store).
    #[serde(rename = "mongodb")]
    MongoDB,
    /// Spreadsheet exposed through a web-app endpoint.
    Sheets,
}

impl BackendKind {
    /// All backend kinds, compiled in or not.
    pub const ALL: [BackendKind; 3] = [BackendKind::Sqlite, BackendKind::MongoDB, BackendKind::Sheets];

    /// Returns `true` if support for this backend was compiled in.
    pub fn is_enabled(self) -> bool {
        match self {
            BackendKind::Sqlite => cfg!(feature = "sqlite"),
            BackendKind::MongoDB => cfg!(feature = "mongodb"),
            BackendKind::Sheets => cfg!(feature = "sheets"),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::MongoDB => write!(f, "mongodb"),
            BackendKind::Sheets => write!(f, "sheets"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sql" | "relational" => Ok(BackendKind::Sqlite),
            "mongodb" | "mongo" | "document" => Ok(BackendKind::MongoDB),
            "sheets" | "sheet" | "spreadsheet" | "google-sheets" => Ok(BackendKind::Sheets),
            other => Err(format!("unknown data source: {other}")),
        }
    }
}

/// Capabilities that a backend may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCapability {
    /// Create, read and update operations.
    Crud,
    /// Rows are physically removed on delete.
    HardDelete,
    /// Rows are flagged as deleted and kept.
    SoftDelete,
    /// Field equality filters are evaluated by the backend.
    FilterPushdown,
    /// Substring search is evaluated by the backend.
    TextSearch,
    /// Skip and limit are evaluated by the backend.
    Pagination,
    /// Referential integrity is enforced by the backend.
    ForeignKeys,
    /// Unique keys are enforced by the backend.
    UniqueConstraints,
}

impl fmt::Display for BackendCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendCapability::Crud => "crud",
            BackendCapability::HardDelete => "hard-delete",
            BackendCapability::SoftDelete => "soft-delete",
            BackendCapability::FilterPushdown => "filter-pushdown",
            BackendCapability::TextSearch => "text-search",
            BackendCapability::Pagination => "pagination",
            BackendCapability::ForeignKeys => "foreign-keys",
            BackendCapability::UniqueConstraints => "unique-constraints",
        };
        write!(f, "{}", name)
    }
}

impl BackendCapability {
    pub const ALL: [BackendCapability; 8] = [
        BackendCapability::Crud,
        BackendCapability::HardDelete,
        BackendCapability::SoftDelete,
        BackendCapability::FilterPushdown,
        BackendCapability::TextSearch,
        BackendCapability::Pagination,
        BackendCapability::ForeignKeys,
        BackendCapability::UniqueConstraints,
    ];
}

/// What `delete_*` does for an entity on a given backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteSemantics {
    /// The row is removed.
    Hard,
    /// The row is kept with `isDeleted = true` and `deletedAt` set.
    Soft,
    /// Deleting is a no-op that returns `false`.
    Unsupported,
}

impl fmt::Display for DeleteSemantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteSemantics::Hard => write!(f, "hard"),
            DeleteSemantics::Soft => write!(f, "soft"),
            DeleteSemantics::Unsupported => write!(f, "unsupported"),
        }
    }
}
