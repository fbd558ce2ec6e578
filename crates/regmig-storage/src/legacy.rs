use crate::{table_exists, StorageError};
use regmig_core::LegacyCredential;
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;

/// Registry credentials of active repositories. Repositories without an owning
/// user (`repo_user_id <= 0`) belong to the system and are left behind.
const REGISTRY_IMPORT_QUERY: &str = "
    SELECT
        repo_full_name,
        COALESCE(registry_addr, ''),
        COALESCE(registry_username, ''),
        COALESCE(registry_password, ''),
        COALESCE(registry_email, '')
    FROM registry
    INNER JOIN repos ON (repo_id = registry_repo_id)
    WHERE repo_user_id > 0
    ORDER BY registry_id ASC
";

/// Read side of the pre-1.0 database.
pub struct LegacyStore {
    conn: Connection,
}

impl LegacyStore {
    /// Opens an existing legacy database. The source is never written to, so
    /// the connection is read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| StorageError::Open {
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

    pub fn create_schema(&self) -> Result<(), StorageError> {
        let sql = include_str!("../schema/v0_registry.sql");
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn table_exists(&self, table_name: &str) -> Result<bool, StorageError> {
        table_exists(&self.conn, table_name)
    }

    pub fn insert_repo(&self, user_id: i64, full_name: &str) -> Result<i64, StorageError> {
        let (owner, name) = full_name.split_once('/').unwrap_or(("", full_name));
        self.conn.execute(
            "
            INSERT INTO repos (repo_user_id, repo_owner, repo_name, repo_full_name, repo_is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![user_id, owner, name, full_name, user_id > 0],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_registry(
        &self,
        repo_id: i64,
        addr: &str,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<i64, StorageError> {
        self.conn.execute(
            "
            INSERT INTO registry (
                registry_repo_id,
                registry_addr,
                registry_username,
                registry_password,
                registry_email,
                registry_token
            ) VALUES (?1, ?2, ?3, ?4, ?5, '')
            ",
            params![repo_id, addr, username, password, email],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn registry_credentials(&self) -> Result<Vec<LegacyCredential>, StorageError> {
        let mut statement = self.conn.prepare(REGISTRY_IMPORT_QUERY)?;
        let rows = statement.query_map([], |row| {
            Ok(LegacyCredential {
                repo_full_name: row.get(0)?,
                addr: row.get(1)?,
                username: row.get(2)?,
                password: row.get(3)?,
                email: row.get(4)?,
            })
        })?;

        let mut credentials = Vec::new();
        for row in rows {
            credentials.push(row?);
        }
        Ok(credentials)
    }
}
