use crate::{table_exists, StorageError, SECRETS_TABLE};
use regmig_core::Secret;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;

/// Write side of the 1.0 database.
pub struct TargetStore {
    conn: Connection,
}

impl TargetStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StorageError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn create_schema(&self) -> Result<(), StorageError> {
        let sql = include_str!("../schema/v1_secrets.sql");
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn table_exists(&self, table_name: &str) -> Result<bool, StorageError> {
        table_exists(&self.conn, table_name)
    }

    pub fn insert_repo(&self, slug: &str) -> Result<i64, StorageError> {
        self.conn.execute(
            "INSERT INTO repos (repo_uid, repo_slug, repo_active) VALUES (?1, ?1, 1)",
            [slug],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn secrets(&self) -> Result<Vec<Secret>, StorageError> {
        let mut statement = self.conn.prepare(
            "
            SELECT secret_id, secret_repo_id, secret_name, secret_data, secret_pull_request
            FROM secrets
            ORDER BY secret_id ASC
            ",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(Secret {
                id: row.get(0)?,
                repo_id: row.get(1)?,
                name: row.get(2)?,
                data: row.get(3)?,
                pull_request: row.get(4)?,
            })
        })?;

        let mut secrets = Vec::new();
        for row in rows {
            secrets.push(row?);
        }
        Ok(secrets)
    }

    pub fn secret_count(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM secrets", [], |row| row.get(0))?)
    }

    /// Last identifier handed out by the `secrets` AUTOINCREMENT sequence.
    pub fn secret_sequence(&self) -> Result<Option<i64>, StorageError> {
        let seq = self
            .conn
            .query_row(
                "SELECT seq FROM sqlite_sequence WHERE name = ?1",
                [SECRETS_TABLE],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seq)
    }

    /// Opens the single migration transaction. Dropping the returned value
    /// without calling [`SecretTransaction::commit`] rolls everything back.
    pub fn begin(&mut self) -> Result<SecretTransaction<'_>, StorageError> {
        Ok(SecretTransaction {
            tx: self.conn.transaction()?,
        })
    }
}

pub struct SecretTransaction<'conn> {
    tx: Transaction<'conn>,
}

impl SecretTransaction<'_> {
    /// Highest secret identifier in use, or 0 when the table is empty.
    pub fn last_secret_id(&self) -> Result<i64, StorageError> {
        Ok(self.tx.query_row(
            "SELECT COALESCE(MAX(secret_id), 0) FROM secrets",
            [],
            |row| row.get(0),
        )?)
    }

    pub fn repo_id_by_slug(&self, slug: &str) -> Result<Option<i64>, StorageError> {
        let repo_id = self
            .tx
            .query_row(
                "SELECT repo_id FROM repos WHERE repo_slug = ?1",
                [slug],
                |row| row.get(0),
            )
            .optional()?;
        Ok(repo_id)
    }

    pub fn insert_secret(&self, secret: &Secret) -> Result<(), StorageError> {
        self.tx.execute(
            "
            INSERT INTO secrets (
                secret_id,
                secret_repo_id,
                secret_name,
                secret_data,
                secret_pull_request,
                secret_pull_request_push
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0)
            ",
            params![
                secret.id,
                secret.repo_id,
                secret.name,
                secret.data,
                secret.pull_request,
            ],
        )?;
        Ok(())
    }

    /// Moves the `secrets` sequence so the next store-assigned identifier is at
    /// least `next_id`. The sequence never moves down, so ids of deleted rows
    /// are not handed out again.
    pub fn reset_secret_sequence(&self, next_id: i64) -> Result<(), StorageError> {
        let last_issued = next_id - 1;
        let updated = self.tx.execute(
            "UPDATE sqlite_sequence SET seq = MAX(seq, ?1) WHERE name = ?2",
            params![last_issued, SECRETS_TABLE],
        )?;
        if updated == 0 {
            self.tx.execute(
                "INSERT INTO sqlite_sequence (name, seq) VALUES (?1, ?2)",
                params![SECRETS_TABLE, last_issued],
            )?;
        }
        Ok(())
    }

    pub fn commit(self) -> Result<(), StorageError> {
        self.tx.commit()?;
        Ok(())
    }
}
