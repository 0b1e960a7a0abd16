// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;

use crate::error::Fallible;
use crate::types::timestamp::Timestamp;

/// Every write to a key bumps its revision by one. The first write is
/// revision 1.
pub type Revision = i64;

/// A string key-value store backed by SQLite.
///
/// Each operation runs in its own transaction, so a read-modify-write is
/// atomic at the call boundary. There is no cross-call locking: two callers
/// doing `get` then `put` race, and the last writer wins. Callers that need
/// to detect that use [`Database::put_if_revision`].
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let conn = Connection::open(database_path)?;
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Fallible<Self> {
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Read the value under a key.
    pub fn get(&self, key: &str) -> Fallible<Option<String>> {
        Ok(self.get_versioned(key)?.map(|(value, _)| value))
    }

    /// Read the value under a key together with its revision.
    pub fn get_versioned(&self, key: &str) -> Fallible<Option<(String, Revision)>> {
        let conn = self.acquire();
        let sql = "select value, revision from kv where key = ?;";
        let row = conn
            .query_row(sql, [key], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;
        Ok(row)
    }

    /// Overwrite the value under a key. Returns the new revision.
    pub fn put(&self, key: &str, value: &str) -> Fallible<Revision> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        let revision = write_value(&tx, key, value)?;
        tx.commit()?;
        Ok(revision)
    }

    /// Write only if the key is still at `expected` (0 meaning absent).
    /// Returns whether the write happened.
    pub fn put_if_revision(&self, key: &str, value: &str, expected: Revision) -> Fallible<bool> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        let current = read_revision(&tx, key)?.unwrap_or(0);
        if current != expected {
            log::debug!("Revision mismatch on {key}: expected {expected}, found {current}");
            return Ok(false);
        }
        write_value(&tx, key, value)?;
        tx.commit()?;
        Ok(true)
    }

    /// Read the current value, compute a new one, and write it back, all in
    /// one transaction.
    pub fn update<F>(&self, key: &str, f: F) -> Fallible<Revision>
    where
        F: FnOnce(Option<String>) -> Fallible<String>,
    {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        let current: Option<String> = tx
            .query_row("select value from kv where key = ?;", [key], |row| {
                row.get(0)
            })
            .optional()?;
        let value = f(current)?;
        let revision = write_value(&tx, key, &value)?;
        tx.commit()?;
        Ok(revision)
    }

    /// Delete a key. Returns whether it existed.
    pub fn remove(&self, key: &str) -> Fallible<bool> {
        let conn = self.acquire();
        let count = conn.execute("delete from kv where key = ?;", [key])?;
        Ok(count > 0)
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

fn read_revision(tx: &Transaction, key: &str) -> Fallible<Option<Revision>> {
    let sql = "select revision from kv where key = ?;";
    let revision = tx.query_row(sql, [key], |row| row.get(0)).optional()?;
    Ok(revision)
}

fn write_value(tx: &Transaction, key: &str, value: &str) -> Fallible<Revision> {
    let sql = "insert into kv (key, value, revision, updated_at) values (?1, ?2, 1, ?3) on conflict(key) do update set value = excluded.value, revision = kv.revision + 1, updated_at = excluded.updated_at returning revision;";
    let revision: Revision =
        tx.query_row(sql, (key, value, Timestamp::now()), |row| row.get(0))?;
    Ok(revision)
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["kv"], |row| row.get(0))?;
    Ok(count > 0)
}
