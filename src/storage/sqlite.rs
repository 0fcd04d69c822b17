use super::TuneStore;
use crate::config::StoreConfig;
use crate::error::{Result, ScraperError};
use crate::types::{ContentGroup, StoredTune, TuneDocument, TuneId, TuneRecord, UpsertOutcome};
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// A SQLite file used as a document store: one table per collection, the
/// full document kept as JSON next to the columns the core queries on.
pub struct SqliteTuneStore {
    conn: Mutex<Connection>,
    /// Collection name as a quoted SQL identifier.
    table: String,
}

/// Upper bound on ids bound into a single `DELETE ... IN (...)`, well under
/// SQLite's host parameter limit.
const DELETE_CHUNK: usize = 500;

impl SqliteTuneStore {
    /// Open (creating if needed) the database described by `config`.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let db_path = config.database_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!("Connecting to tune store at {}", db_path.display());
        Self::open(db_path, &config.collection)
    }

    pub fn open<P: AsRef<Path>>(db_path: P, collection: &str) -> Result<Self> {
        if collection.is_empty() || !collection.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ScraperError::Config(format!("Invalid collection name '{}'", collection)));
        }

        let table = format!("\"{collection}\"");
        let index = format!("\"{collection}_content_idx\"");

        let conn = Connection::open(db_path)?;
        conn.execute_batch(&format!(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS {table} (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                source_url  TEXT UNIQUE,
                content     TEXT,
                document    TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS {index} ON {table} (content);
            "#
        ))?;

        Ok(Self {
            conn: Mutex::new(conn),
            table,
        })
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| ScraperError::Database(e))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TuneStore for SqliteTuneStore {
    async fn upsert(&self, record: &TuneRecord) -> Result<UpsertOutcome> {
        let document = serde_json::to_string(record)?;
        let conn = self.conn();

        let existing: Option<i64> = conn
            .query_row(
                &format!("SELECT id FROM {} WHERE source_url = ?1", self.table),
                params![record.source_url],
                |row| row.get(0),
            )
            .optional()?;

        conn.execute(
            &format!(
                "INSERT INTO {} (source_url, content, document) VALUES (?1, ?2, ?3)
                 ON CONFLICT(source_url) DO UPDATE SET content=excluded.content, document=excluded.document",
                self.table
            ),
            params![record.source_url, record.content, document],
        )?;

        match existing {
            Some(id) => {
                debug!("Replaced tune {} ({})", id, record.source_url);
                Ok(UpsertOutcome::Replaced)
            }
            None => {
                debug!("Inserted tune {} ({})", conn.last_insert_rowid(), record.source_url);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn scan(&self) -> Result<Vec<StoredTune>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT id, document FROM {} ORDER BY id", self.table))?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;

        let mut tunes = Vec::new();
        for row in rows {
            let (id, json) = row?;
            tunes.push(StoredTune {
                id: TuneId(id),
                document: TuneDocument::from_json(&json)?,
            });
        }
        Ok(tunes)
    }

    async fn delete(&self, id: TuneId) -> Result<bool> {
        let removed = self
            .conn()
            .execute(&format!("DELETE FROM {} WHERE id = ?1", self.table), params![id.0])?;
        Ok(removed > 0)
    }

    async fn delete_many(&self, ids: &[TuneId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.conn();
        let mut removed = 0;
        for chunk in ids.chunks(DELETE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            removed += conn.execute(
                &format!("DELETE FROM {} WHERE id IN ({})", self.table, placeholders),
                params_from_iter(chunk.iter().map(|id| id.0)),
            )?;
        }
        Ok(removed)
    }

    async fn group_by_content(&self) -> Result<Vec<ContentGroup>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT content, group_concat(id) FROM {}
             WHERE content IS NOT NULL
             GROUP BY content
             HAVING COUNT(*) > 1
             ORDER BY MIN(id)",
            self.table
        ))?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut groups = Vec::new();
        for row in rows {
            let (content, joined) = row?;
            // group_concat has no defined order; restore ascending identity order.
            let mut ids: Vec<TuneId> = joined
                .split(',')
                .filter_map(|s| s.trim().parse::<i64>().ok())
                .map(TuneId)
                .collect();
            ids.sort();
            groups.push(ContentGroup { content, ids });
        }
        Ok(groups)
    }

    async fn insert_document(&self, document: &TuneDocument) -> Result<TuneId> {
        let normalized = document.clone().normalized();
        let json = serde_json::to_string(document)?;
        let conn = self.conn();

        if let Some(url) = normalized.source_url.as_deref() {
            let existing: Option<i64> = conn
                .query_row(
                    &format!("SELECT id FROM {} WHERE source_url = ?1", self.table),
                    params![url],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(id) = existing {
                conn.execute(
                    &format!("UPDATE {} SET content = ?1, document = ?2 WHERE id = ?3", self.table),
                    params![normalized.content, json, id],
                )?;
                debug!("Replaced imported tune {} ({})", id, url);
                return Ok(TuneId(id));
            }
        }

        conn.execute(
            &format!("INSERT INTO {} (source_url, content, document) VALUES (?1, ?2, ?3)", self.table),
            params![normalized.source_url, normalized.content, json],
        )?;
        Ok(TuneId(conn.last_insert_rowid()))
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
