//! SQLite schema definitions and migrations.
//!
//! One table per entity, generated from the entity schemas. Composite fields
//! are stored as JSON text columns; the shipping address composite has no
//! column and is rebuilt from the flat address columns.

use rusqlite::Connection;

use crate::error::{BackendError, StorageError, StorageResult};
use crate::schema::{BOOKKEEPING, EntitySchema, FieldSpec};
use crate::types::EntityKind;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "sqlite".to_string(),
        message,
        source: None,
    })
}

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(internal_error(format!(
            "database schema version {} is newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    Ok(())
}

/// Get the current schema version.
fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| internal_error(format!("Failed to create schema_version table: {}", e)))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

/// Set the schema version.
fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| internal_error(format!("Failed to clear schema_version: {}", e)))?;

    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
        .map_err(|e| internal_error(format!("Failed to set schema_version: {}", e)))?;

    Ok(())
}

/// Create the initial schema (version 1).
fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    for kind in EntityKind::ALL {
        let schema = kind.schema();
        conn.execute_batch(&create_table_sql(schema))
            .map_err(|e| internal_error(format!("Failed to create {} table: {}", schema.table, e)))?;
        conn.execute_batch(&create_indexes_sql(schema))
            .map_err(|e| {
                internal_error(format!("Failed to create {} indexes: {}", schema.table, e))
            })?;
    }
    Ok(())
}

fn column_definition(field: &FieldSpec) -> String {
    let mut definition = format!("{} {}", field.column, field.ty.sql_type());
    if field.unique {
        definition.push_str(" UNIQUE");
    }
    if let Some(table) = field.references {
        definition.push_str(&format!(" REFERENCES {}(id)", table));
    }
    definition
}

/// Builds the `CREATE TABLE` statement for an entity.
pub(crate) fn create_table_sql(schema: &EntitySchema) -> String {
    let mut columns = vec!["id TEXT PRIMARY KEY NOT NULL".to_string()];
    columns.extend(
        schema
            .fields
            .iter()
            .filter(|field| field.has_column())
            .map(column_definition),
    );
    for field in &BOOKKEEPING {
        let definition = match field.name {
            crate::schema::DELETED_AT => column_definition(field),
            _ => format!("{} NOT NULL DEFAULT 0", column_definition(field)),
        };
        columns.push(definition);
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
        schema.table,
        columns.join(",\n    ")
    )
}

/// Builds the index statements for an entity.
pub(crate) fn create_indexes_sql(schema: &EntitySchema) -> String {
    let mut statements = vec![format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_created ON {table}(is_deleted, created_at);",
        table = schema.table
    )];
    for field in schema.fields.iter().filter(|f| f.references.is_some()) {
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table}({column});",
            table = schema.table,
            column = field.column
        ));
    }
    statements.join("\n")
}
