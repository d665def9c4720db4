//! Collection store operations
//!
//! Search is an exact scan: candidates are restricted to the allowed
//! documents in SQL, scored by normalized dot product in memory, and ranked
//! with ties broken by insertion order. Vectors are L2-normalized once at
//! insert time and stored as little-endian f32 blobs.

use super::database::Database;
use super::{
    CollectionSpec, DeleteReport, DocumentInfo, DocumentRecord, DocumentSet, EntryMetadata,
    EntryRecord, SearchHit, StoreStats, IMAGE_COLLECTION, TEXT_COLLECTION,
};
use crate::error::{NotedexError, Result};
use rusqlite::{params, params_from_iter, OptionalExtension, Transaction};
use std::cmp::Ordering;
use std::path::Path;

pub struct CollectionStore {
    db: Database,
    specs: Vec<CollectionSpec>,
}

impl CollectionStore {
    /// Open the store and declare its collections.
    ///
    /// A collection that already exists on disk must agree with its
    /// declaration; a changed dimension or model is a configuration error,
    /// surfaced here rather than as silently wrong similarity scores.
    pub fn open(db_path: &Path, specs: &[CollectionSpec]) -> Result<Self> {
        let db = Database::new(db_path)?;
        let store = Self {
            db,
            specs: specs.to_vec(),
        };
        store.register_collections()?;
        Ok(store)
    }

    fn register_collections(&self) -> Result<()> {
        let conn = self.db.get_conn()?;
        for spec in &self.specs {
            let existing: Option<(i64, String)> = conn
                .query_row(
                    "SELECT dimension, model FROM collections WHERE name = ?1",
                    params![spec.name],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match existing {
                Some((dimension, model)) => {
                    if dimension as usize != spec.dimension {
                        return Err(NotedexError::DimensionMismatch {
                            collection: spec.name.clone(),
                            expected: spec.dimension,
                            actual: dimension as usize,
                        });
                    }
                    if model != spec.model {
                        return Err(NotedexError::Config(format!(
                            "collection '{}' was built with model '{}' but is configured for '{}'; reingest to switch models",
                            spec.name, model, spec.model
                        )));
                    }
                }
                None => {
                    conn.execute(
                        "INSERT INTO collections (name, dimension, model) VALUES (?1, ?2, ?3)",
                        params![spec.name, spec.dimension as i64, spec.model],
                    )?;
                    tracing::info!(
                        "Declared collection '{}' ({}D, model {})",
                        spec.name,
                        spec.dimension,
                        spec.model
                    );
                }
            }
        }
        Ok(())
    }

    fn spec(&self, collection: &str) -> Result<&CollectionSpec> {
        self.specs
            .iter()
            .find(|s| s.name == collection)
            .ok_or_else(|| NotedexError::UnknownCollection(collection.to_string()))
    }

    /// Register a document without any entries.
    ///
    /// Entry inserts require the owning document row to exist; the pipeline
    /// normally registers it in the same transaction via
    /// [`commit_document`](Self::commit_document).
    pub fn register_document(&self, document: &DocumentRecord) -> Result<()> {
        let conn = self.db.get_conn()?;
        conn.execute(
            "INSERT INTO documents (id, name, origin, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                document.id,
                document.name,
                document.origin,
                document.created_at
            ],
        )
        .map_err(|e| map_insert_error("documents", &document.id, e))?;
        Ok(())
    }

    /// Append entries to a collection in one transaction.
    ///
    /// Ids must be unique within the collection; a duplicate rolls the whole
    /// batch back. Vectors are validated against the declared dimension and
    /// normalized before storage.
    pub fn insert(&self, collection: &str, entries: &[EntryRecord]) -> Result<usize> {
        let spec = self.spec(collection)?;
        if entries.is_empty() {
            return Ok(0);
        }

        let mut conn = self.db.get_conn()?;
        let tx = conn.transaction()?;
        insert_in_tx(&tx, spec, entries)?;
        tx.commit().map_err(map_db_error)?;
        Ok(entries.len())
    }

    /// Atomically commit a document and all of its entries across
    /// collections.
    ///
    /// Either the document and every entry become visible together or
    /// nothing does; readers never observe a half-indexed document.
    pub fn commit_document(
        &self,
        document: &DocumentRecord,
        batches: &[(&str, &[EntryRecord])],
    ) -> Result<()> {
        // Validate every batch before opening the transaction
        for (collection, _) in batches {
            self.spec(collection)?;
        }

        let mut conn = self.db.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO documents (id, name, origin, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                document.id,
                document.name,
                document.origin,
                document.created_at
            ],
        )
        .map_err(|e| map_insert_error("documents", &document.id, e))?;

        for (collection, entries) in batches {
            let spec = self.spec(collection)?;
            insert_in_tx(&tx, spec, entries)?;
        }

        tx.commit().map_err(map_db_error)?;
        Ok(())
    }

    /// Top-k nearest entries among the allowed documents.
    ///
    /// An empty `filter` deterministically yields an empty result: searching
    /// documents the caller did not authorize is never the fallback.
    pub fn search(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
        filter: &DocumentSet,
    ) -> Result<Vec<SearchHit>> {
        let spec = self.spec(collection)?;
        if query.len() != spec.dimension {
            return Err(NotedexError::DimensionMismatch {
                collection: spec.name.clone(),
                expected: spec.dimension,
                actual: query.len(),
            });
        }
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        let query = l2_normalize(query);

        let ids: Vec<&str> = filter.iter().map(String::as_str).collect();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT e.seq, e.id, e.document_id, d.name, e.sequence_index, e.content_type, e.text, e.vector
             FROM entries e JOIN documents d ON d.id = e.document_id
             WHERE e.collection = ? AND e.document_id IN ({})",
            placeholders
        );

        let mut bind: Vec<&str> = Vec::with_capacity(ids.len() + 1);
        bind.push(collection);
        bind.extend(ids);

        let conn = self.db.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(bind), |row| {
                let seq: i64 = row.get(0)?;
                let blob: Vec<u8> = row.get(7)?;
                Ok((
                    seq,
                    SearchHit {
                        id: row.get(1)?,
                        text: row.get(6)?,
                        metadata: EntryMetadata {
                            document_id: row.get(2)?,
                            document_name: row.get(3)?,
                            sequence_index: row.get::<_, i64>(4)? as usize,
                            content_type: row.get(5)?,
                        },
                        score: 0.0,
                    },
                    blob,
                ))
            })
            .map_err(map_db_error)?;

        let mut scored: Vec<(i64, SearchHit)> = Vec::new();
        for row in rows {
            let (seq, mut hit, blob) = row.map_err(map_db_error)?;
            let vector = blob_to_vector(&blob);
            hit.score = dot(&query, &vector);
            scored.push((seq, hit));
        }

        // Descending score; equal scores rank by insertion order
        scored.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, hit)| hit).collect())
    }

    /// Remove documents and, via cascade, every entry derived from them.
    ///
    /// Idempotent: absent ids contribute nothing to the counts.
    pub fn delete(&self, document_ids: &DocumentSet) -> Result<DeleteReport> {
        if document_ids.is_empty() {
            return Ok(DeleteReport::default());
        }

        let ids: Vec<&str> = document_ids.iter().map(String::as_str).collect();
        let placeholders = vec!["?"; ids.len()].join(", ");

        let mut conn = self.db.get_conn()?;
        let tx = conn.transaction()?;

        let mut report = DeleteReport::default();
        {
            // Count per collection before the cascade erases the evidence
            let sql = format!(
                "SELECT collection, COUNT(*) FROM entries WHERE document_id IN ({}) GROUP BY collection",
                placeholders
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })?;
            for row in rows {
                let (collection, count) = row?;
                match collection.as_str() {
                    TEXT_COLLECTION => report.text_entries = count,
                    IMAGE_COLLECTION => report.image_entries = count,
                    _ => {}
                }
            }
        }

        let sql = format!("DELETE FROM documents WHERE id IN ({})", placeholders);
        report.documents = tx
            .execute(&sql, params_from_iter(ids.iter()))
            .map_err(map_db_error)?;

        tx.commit().map_err(map_db_error)?;

        tracing::debug!(
            "Deleted {} documents ({} text entries, {} image entries)",
            report.documents,
            report.text_entries,
            report.image_entries
        );

        Ok(report)
    }

    /// All stored documents in insertion order
    pub fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        let conn = self.db.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM documents ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(DocumentInfo {
                document_id: row.get(0)?,
                document_name: row.get(1)?,
            })
        })?;

        let mut documents = Vec::new();
        for row in rows {
            documents.push(row?);
        }
        Ok(documents)
    }

    /// Number of entries in a collection
    pub fn count(&self, collection: &str) -> Result<usize> {
        self.spec(collection)?;
        let conn = self.db.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Store-wide counts
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.db.get_conn()?;
        let documents: i64 =
            conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;

        Ok(StoreStats {
            documents: documents as usize,
            text_entries: self.count(TEXT_COLLECTION)?,
            image_entries: self.count(IMAGE_COLLECTION)?,
        })
    }
}

fn insert_in_tx(tx: &Transaction, spec: &CollectionSpec, entries: &[EntryRecord]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO entries (id, collection, document_id, sequence_index, content_type, text, vector)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    for entry in entries {
        if entry.vector.len() != spec.dimension {
            return Err(NotedexError::DimensionMismatch {
                collection: spec.name.clone(),
                expected: spec.dimension,
                actual: entry.vector.len(),
            });
        }

        let blob = vector_to_blob(&l2_normalize(&entry.vector));
        stmt.execute(params![
            entry.id,
            spec.name,
            entry.metadata.document_id,
            entry.metadata.sequence_index as i64,
            entry.metadata.content_type,
            entry.text,
            blob,
        ])
        .map_err(|e| map_insert_error(&spec.name, &entry.id, e))?;
    }

    Ok(())
}

fn map_insert_error(collection: &str, id: &str, err: rusqlite::Error) -> NotedexError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            NotedexError::DuplicateId {
                collection: collection.to_string(),
                id: id.to_string(),
            }
        }
        _ => map_db_error(err),
    }
}

fn map_db_error(err: rusqlite::Error) -> NotedexError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::DatabaseBusy
                || e.code == rusqlite::ErrorCode::DatabaseLocked =>
        {
            NotedexError::BackendUnavailable(err.to_string())
        }
        _ => NotedexError::Database(err),
    }
}

fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn blob_to_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Unit-length copy of `vector`; zero vectors pass through unchanged
fn l2_normalize(vector: &[f32]) -> Vec<f32> {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return vector.to_vec();
    }
    vector.iter().map(|x| x / norm).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
