//! libSQL slot backend (local database file, offline mode).
//!
//! Every slot is one row of the `slots` table, keyed by its namespaced key.
//! A save is a single upsert statement, so SQLite commits it atomically and a
//! slot is never left half-written. The table layout is versioned through
//! `schema_migrations` and brought up to date when the database opens.

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::Utc;
use dealdesk_shared::{DealDeskError, Result};
use libsql::{Connection, Database, params};
use tracing::{debug, info};

use crate::backend::SlotBackend;

/// A database migration with a version and SQL statements.
pub(crate) struct SqlMigration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All table migrations, in ascending version order.
pub(crate) fn sql_migrations() -> Vec<SqlMigration> {
    vec![SqlMigration {
        version: 1,
        description: "Slot table and schema tracking",
        sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS slots (
    key      TEXT PRIMARY KEY,
    contents TEXT NOT NULL,
    saved_at TEXT
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
    }]
}

fn storage_error(e: libsql::Error) -> DealDeskError {
    DealDeskError::Storage(e.to_string())
}

/// Drive a libSQL future to completion from synchronous store code.
///
/// The future runs on a scoped thread with its own current-thread runtime,
/// so this works both inside and outside an existing tokio runtime.
fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send,
    F: Future<Output = Result<T>> + Send,
{
    std::thread::scope(|scope| {
        scope
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| DealDeskError::Storage(format!("database runtime: {e}")))?;
                runtime.block_on(work)
            })
            .join()
            .unwrap_or_else(|_| Err(DealDeskError::Storage("database worker panicked".into())))
    })
}

async fn query_schema_version(conn: &Connection) -> u32 {
    match conn
        .query("SELECT MAX(version) FROM schema_migrations", params![])
        .await
    {
        Ok(mut rows) => match rows.next().await {
            Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
            _ => 0,
        },
        // table does not exist yet
        Err(_) => 0,
    }
}

/// Slot backend over a local libSQL database.
pub struct LibsqlBackend {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    path: PathBuf,
}

impl LibsqlBackend {
    /// Open or create the database at `path` and apply pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DealDeskError::io(parent, e))?;
        }

        let (db, conn) = run_blocking(async {
            let db = libsql::Builder::new_local(path)
                .build()
                .await
                .map_err(storage_error)?;
            let conn = db.connect().map_err(storage_error)?;
            Ok((db, conn))
        })?;

        let backend = Self {
            db,
            conn,
            path: path.to_path_buf(),
        };
        let version = backend.run_migrations()?;
        debug!(path = %path.display(), schema = version, "slot database opened");
        Ok(backend)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest applied table migration, 0 for an empty database.
    pub fn schema_version(&self) -> Result<u32> {
        let conn = &self.conn;
        run_blocking(async move { Ok(query_schema_version(conn).await) })
    }

    fn run_migrations(&self) -> Result<u32> {
        let conn = &self.conn;
        run_blocking(async move {
            let mut version = query_schema_version(conn).await;
            for migration in sql_migrations() {
                if migration.version <= version {
                    continue;
                }
                info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                conn.execute_batch(migration.sql).await.map_err(|e| {
                    DealDeskError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
                version = migration.version;
            }
            Ok(version)
        })
    }
}

impl std::fmt::Debug for LibsqlBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibsqlBackend")
            .field("path", &self.path)
            .finish()
    }
}

impl SlotBackend for LibsqlBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let conn = &self.conn;
        run_blocking(async move {
            let mut rows = conn
                .query("SELECT contents FROM slots WHERE key = ?1", params![key])
                .await
                .map_err(storage_error)?;
            match rows.next().await.map_err(storage_error)? {
                Some(row) => Ok(Some(row.get::<String>(0).map_err(storage_error)?)),
                None => Ok(None),
            }
        })
    }

    fn save(&mut self, key: &str, contents: &str) -> Result<()> {
        let conn = &self.conn;
        let saved_at = Utc::now().to_rfc3339();
        run_blocking(async move {
            conn.execute(
                "INSERT INTO slots (key, contents, saved_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    contents = excluded.contents,
                    saved_at = excluded.saved_at",
                params![key, contents, saved_at.as_str()],
            )
            .await
            .map_err(storage_error)?;
            Ok(())
        })
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        let conn = &self.conn;
        run_blocking(async move {
            let deleted = conn
                .execute("DELETE FROM slots WHERE key = ?1", params![key])
                .await
                .map_err(storage_error)?;
            Ok(deleted > 0)
        })
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = &self.conn;
        run_blocking(async move {
            let mut rows = conn
                .query("SELECT key FROM slots ORDER BY key", params![])
                .await
                .map_err(storage_error)?;
            let mut keys = Vec::new();
            while let Some(row) = rows.next().await.map_err(storage_error)? {
                keys.push(row.get::<String>(0).map_err(storage_error)?);
            }
            Ok(keys)
        })
    }

    fn name(&self) -> &str {
        "libsql"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_db() -> PathBuf {
        std::env::temp_dir().join(format!("dealdesk_test_{}.db", Uuid::now_v7()))
    }

    #[test]
    fn open_and_migrate() {
        let backend = LibsqlBackend::open(&temp_db()).expect("open");
        assert_eq!(backend.schema_version().unwrap(), 1);
    }

    #[test]
    fn idempotent_migration() {
        let path = temp_db();
        let first = LibsqlBackend::open(&path).expect("first open");
        drop(first);
        let second = LibsqlBackend::open(&path).expect("second open");
        assert_eq!(second.schema_version().unwrap(), 1);
    }

    #[test]
    fn slot_crud() {
        let mut backend = LibsqlBackend::open(&temp_db()).expect("open");
        assert!(backend.load("dealdesk.contacts").unwrap().is_none());

        backend.save("dealdesk.contacts", "[]").unwrap();
        backend.save("dealdesk.contacts", "[1]").unwrap();
        assert_eq!(
            backend.load("dealdesk.contacts").unwrap().as_deref(),
            Some("[1]")
        );

        backend.save("dealdesk.campaigns", "[]").unwrap();
        assert_eq!(
            backend.keys().unwrap(),
            vec!["dealdesk.campaigns".to_string(), "dealdesk.contacts".to_string()]
        );

        assert!(backend.remove("dealdesk.contacts").unwrap());
        assert!(!backend.remove("dealdesk.contacts").unwrap());
    }

    #[test]
    fn slots_persist_across_instances() {
        let path = temp_db();
        {
            let mut backend = LibsqlBackend::open(&path).expect("open");
            backend.save("dealdesk.lists", r#"{"schemaVersion":1,"data":[]}"#).expect("save");
        }

        let backend = LibsqlBackend::open(&path).expect("reopen");
        assert_eq!(
            backend.load("dealdesk.lists").unwrap().as_deref(),
            Some(r#"{"schemaVersion":1,"data":[]}"#)
        );
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = std::env::temp_dir().join(format!("dealdesk_data_{}", Uuid::now_v7()));
        let path = dir.join("nested").join("dealdesk.db");
        let backend = LibsqlBackend::open(&path).expect("open");
        assert_eq!(backend.path(), path.as_path());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn usable_from_async_context() {
        let mut backend = LibsqlBackend::open(&temp_db()).expect("open");
        backend.save("dealdesk.rows", "[]").expect("save");
        assert_eq!(backend.load("dealdesk.rows").unwrap().as_deref(), Some("[]"));
    }
}
