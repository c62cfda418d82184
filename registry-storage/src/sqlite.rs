//! SQLite-backed [`DocumentStore`].

use crate::document_store::{
    DocumentStore, StoredDocument, View, ViewKey, ViewMode, ViewQuery, ViewRow,
};
use crate::error::{StorageError, StorageResult};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Document store backed by a single SQLite file.
pub struct SqliteStore {
    name: String,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path, name: &str) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, name)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory(name: &str) -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, name)
    }

    fn with_connection(conn: Connection, name: &str) -> StorageResult<Self> {
        let store = Self {
            name: name.to_string(),
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Lock)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                doc_type TEXT NOT NULL,
                rev TEXT NOT NULL,
                seq INTEGER NOT NULL,
                date_modified TEXT NOT NULL,
                is_test INTEGER NOT NULL,
                body TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS documents_by_date
                ON documents (doc_type, date_modified, id);

            CREATE INDEX IF NOT EXISTS documents_by_seq
                ON documents (doc_type, seq);
            ",
        )?;
        Ok(())
    }
}

fn parse_body(raw: &str) -> StorageResult<Map<String, Value>> {
    match serde_json::from_str(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(StorageError::InvalidData("document body is not an object".into())),
    }
}

fn next_revision(current: Option<&str>, body: &str) -> String {
    let generation = current
        .and_then(|rev| rev.split_once('-'))
        .and_then(|(n, _)| n.parse::<u64>().ok())
        .unwrap_or(0)
        + 1;
    let digest = hex::encode(Sha256::digest(body.as_bytes()));
    format!("{generation}-{}", &digest[..32])
}

/// Key range for one side of the collation. Mixed-type bounds either admit
/// every row or none.
enum Bound {
    All,
    Nothing,
    From(SqlValue),
}

fn bound(query: &ViewQuery) -> Bound {
    match (query.view, &query.start) {
        (View::Changes, ViewKey::Seq(n)) => Bound::From(SqlValue::Integer(*n as i64)),
        (View::DateModified, ViewKey::Text(s)) => Bound::From(SqlValue::Text(s.clone())),
        (View::Changes, ViewKey::Text(_)) if query.descending => Bound::All,
        (View::DateModified, ViewKey::Seq(_)) if !query.descending => Bound::All,
        _ => Bound::Nothing,
    }
}

impl DocumentStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, id: &str) -> StorageResult<Option<StoredDocument>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT rev, doc_type, body FROM documents WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(rev, doc_type, body)| {
            Ok(StoredDocument {
                id: id.to_string(),
                rev,
                doc_type,
                body: parse_body(&body)?,
            })
        })
        .transpose()
    }

    fn save(
        &self,
        id: &str,
        doc_type: &str,
        body: &Map<String, Value>,
        expected_rev: Option<&str>,
    ) -> StorageResult<String> {
        let serialized = serde_json::to_string(body)?;
        let date_modified = body
            .get("dateModified")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let is_test = body.get("mode").and_then(Value::as_str) == Some("test");

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let current: Option<String> = tx
            .query_row("SELECT rev FROM documents WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        if current.as_deref() != expected_rev {
            tracing::debug!(id, ?expected_rev, ?current, "revision conflict");
            return Err(StorageError::RevisionConflict { id: id.to_string() });
        }

        let rev = next_revision(current.as_deref(), &serialized);
        let seq: i64 =
            tx.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM documents", [], |row| {
                row.get(0)
            })?;
        tx.execute(
            "INSERT INTO documents (id, doc_type, rev, seq, date_modified, is_test, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                doc_type = excluded.doc_type,
                rev = excluded.rev,
                seq = excluded.seq,
                date_modified = excluded.date_modified,
                is_test = excluded.is_test,
                body = excluded.body",
            params![id, doc_type, rev, seq, date_modified, is_test, serialized],
        )?;
        tx.commit()?;
        tracing::trace!(id, rev = %rev, seq, "document saved");
        Ok(rev)
    }

    fn query_view(&self, query: &ViewQuery) -> StorageResult<Vec<ViewRow>> {
        tracing::trace!(
            db = %self.name,
            doc_type = %query.doc_type,
            view = ?query.view,
            stale = ?query.stale,
            "view query"
        );
        let key_column = match query.view {
            View::DateModified => "date_modified",
            View::Changes => "seq",
        };
        let mut sql = format!(
            "SELECT id, {key_column}, body FROM documents WHERE doc_type = ?"
        );
        let mut args = vec![SqlValue::Text(query.doc_type.clone())];

        match query.mode {
            ViewMode::Real => sql.push_str(" AND is_test = 0"),
            ViewMode::Test => sql.push_str(" AND is_test = 1"),
            ViewMode::All => {}
        }
        match bound(query) {
            Bound::All => {}
            Bound::Nothing => return Ok(Vec::new()),
            Bound::From(start) => {
                let op = if query.descending { "<=" } else { ">=" };
                sql.push_str(&format!(" AND {key_column} {op} ?"));
                args.push(start);
            }
        }
        let direction = if query.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(
            " ORDER BY {key_column} {direction}, id {direction} LIMIT ?"
        ));
        args.push(SqlValue::Integer(i64::try_from(query.limit).unwrap_or(i64::MAX)));

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let raw_rows = stmt
            .query_map(params_from_iter(args), |row| {
                let id: String = row.get(0)?;
                let key = match query.view {
                    View::DateModified => ViewKey::Text(row.get(1)?),
                    View::Changes => ViewKey::Seq(row.get::<_, i64>(1)?.max(0) as u64),
                };
                let body: String = row.get(2)?;
                Ok((id, key, body))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw_rows
            .into_iter()
            .map(|(id, key, body)| {
                let body = parse_body(&body)?;
                let value = body
                    .iter()
                    .filter(|(field, _)| {
                        *field == "dateModified" || query.value_fields.iter().any(|f| f == *field)
                    })
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect();
                Ok(ViewRow {
                    id,
                    key,
                    value,
                    doc: query.include_docs.then_some(body),
                })
            })
            .collect()
    }
}
