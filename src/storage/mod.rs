/// Direct sqlite import path
///
/// Writes workflow definitions straight into the service's backing store when
/// identifier preservation is required. Only legal while the service is
/// stopped: an exclusive-transaction probe refuses to run against a live
/// database. Each definition is reconciled inside its own transaction.

use crate::workflow::types::WorkflowDefinition;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use thiserror::Error;

/// Errors from the direct-storage path, distinct from every remote-API error
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backing store '{0}' does not exist; point FLOWVAULT_DB at the service database")]
    MissingDatabase(String),

    #[error("could not take an exclusive lock on '{path}' - the service appears to be running; stop it before importing with preserved ids ({message})")]
    ServiceLive { path: String, message: String },

    #[error("backing store query failed: {0}")]
    Db(#[from] sqlx::Error),

    #[error("failed to encode workflow JSON: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Counters reported by a direct import
#[derive(Debug, Default)]
pub struct DirectImportSummary {
    /// Definitions written into the backing store
    pub imported: usize,
    /// Definitions skipped for lack of an id to preserve
    pub skipped: usize,
}

/// Import definitions into the backing store, preserving their ids
pub async fn import_preserving_ids(
    db_path: &str,
    definitions: &[WorkflowDefinition],
) -> Result<DirectImportSummary, StorageError> {
    if !Path::new(db_path).is_file() {
        return Err(StorageError::MissingDatabase(db_path.to_string()));
    }

    let options = SqliteConnectOptions::new().filename(db_path);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    assert_exclusive_access(&pool, db_path).await?;

    let mut summary = DirectImportSummary::default();
    for definition in definitions {
        let Some(id) = definition.id.as_deref() else {
            tracing::warn!(
                "Skipping '{}': no id to preserve; restore it through the API instead",
                definition.name
            );
            summary.skipped += 1;
            continue;
        };

        write_definition(&pool, id, definition).await?;
        summary.imported += 1;
    }

    pool.close().await;
    Ok(summary)
}

/// Probe for exclusive access; failure implies the service is still live
async fn assert_exclusive_access(
    pool: &sqlx::SqlitePool,
    db_path: &str,
) -> Result<(), StorageError> {
    let mut conn = pool.acquire().await?;
    sqlx::query("BEGIN EXCLUSIVE TRANSACTION")
        .execute(&mut *conn)
        .await
        .map_err(|e| StorageError::ServiceLive {
            path: db_path.to_string(),
            message: e.to_string(),
        })?;
    sqlx::query("ROLLBACK").execute(&mut *conn).await?;
    Ok(())
}

/// Reconcile one definition into the workflows table
///
/// Same id with a different name: delete-then-insert. Same id and name:
/// update in place. No row under the id: insert, after removing any other
/// row that already owns the target name.
async fn write_definition(
    pool: &sqlx::SqlitePool,
    id: &str,
    definition: &WorkflowDefinition,
) -> Result<(), StorageError> {
    let definition_json = serde_json::to_string(definition)?;
    let mut tx = pool.begin().await?;

    let existing = sqlx::query("SELECT name FROM workflows WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    match existing {
        Some(row) => {
            let existing_name: String = row.get("name");
            if existing_name == definition.name {
                tracing::debug!("Updating '{}' ({}) in place", definition.name, id);
                sqlx::query(
                    r#"
                    UPDATE workflows
                    SET definition = ?, updated_at = CURRENT_TIMESTAMP
                    WHERE id = ?
                    "#,
                )
                .bind(&definition_json)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            } else {
                tracing::debug!(
                    "Replacing '{}' ({}) with '{}'",
                    existing_name,
                    id,
                    definition.name
                );
                sqlx::query("DELETE FROM workflows WHERE id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("DELETE FROM workflows WHERE name = ?")
                    .bind(&definition.name)
                    .execute(&mut *tx)
                    .await?;
                insert_row(&mut tx, id, definition, &definition_json).await?;
            }
        }
        None => {
            // Free the name before inserting under the preserved id
            sqlx::query("DELETE FROM workflows WHERE name = ?")
                .bind(&definition.name)
                .execute(&mut *tx)
                .await?;
            insert_row(&mut tx, id, definition, &definition_json).await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

async fn insert_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: &str,
    definition: &WorkflowDefinition,
    definition_json: &str,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        INSERT INTO workflows (id, name, definition, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(id)
    .bind(&definition.name)
    .bind(definition_json)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
