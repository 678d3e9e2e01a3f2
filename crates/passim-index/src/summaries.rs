use std::str::FromStr;

use passim_core::{CollectionId, DocumentId};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::IndexError;

/// SQLite-backed store for per-document summaries.
pub struct SummaryStore {
    pool: SqlitePool,
}

impl std::fmt::Debug for SummaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryStore").finish_non_exhaustive()
    }
}

impl SummaryStore {
    /// Open (or create) the database and initialize the summaries table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the table
    /// cannot be created.
    pub async fn connect(path: &str) -> Result<Self, IndexError> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_owned()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let opts = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS document_summaries (
                document_id INTEGER PRIMARY KEY,
                collection_id INTEGER NOT NULL,
                doc_name TEXT NOT NULL,
                display_name TEXT NOT NULL,
                summary TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Insert or replace the summary for a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn store(
        &self,
        document_id: DocumentId,
        collection_id: CollectionId,
        doc_name: &str,
        display_name: &str,
        summary: &str,
    ) -> Result<(), IndexError> {
        sqlx::query(
            "INSERT INTO document_summaries \
             (document_id, collection_id, doc_name, display_name, summary, updated_at) \
             VALUES (?, ?, ?, ?, ?, datetime('now')) \
             ON CONFLICT(document_id) DO UPDATE SET \
             doc_name = excluded.doc_name, display_name = excluded.display_name, \
             summary = excluded.summary, updated_at = excluded.updated_at",
        )
        .bind(document_id.0)
        .bind(collection_id.0)
        .bind(doc_name)
        .bind(display_name)
        .bind(summary)
        .execute(&self.pool)
        .await?;

        tracing::debug!(document = %document_id, "stored document summary");
        Ok(())
    }

    /// Fetch the summary for a document, if one was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get(&self, document_id: DocumentId) -> Result<Option<String>, IndexError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT summary FROM document_summaries WHERE document_id = ?")
                .bind(document_id.0)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(summary,)| summary))
    }
}
