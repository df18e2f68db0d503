//! Message storage - byte-level API for chat message persistence.
//!
//! Records are opaque bytes here. Ordering comes from a secondary index whose
//! keys sort by creation time, then by insertion sequence, so messages created
//! within the same millisecond keep their send order.

use anyhow::Result;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use std::sync::Arc;

const MESSAGE_DATA: TableDefinition<&str, &[u8]> = TableDefinition::new("messages:data");
const MESSAGE_INDEX: TableDefinition<&str, &str> = TableDefinition::new("messages:index");
const MESSAGE_META: TableDefinition<&str, u64> = TableDefinition::new("messages:meta");

const SEQUENCE_KEY: &str = "next_seq";
const SIGN_BIT: u64 = 1 << 63;

/// Low-level message storage with byte-level API
#[derive(Debug, Clone)]
pub struct MessageStorage {
    db: Arc<Database>,
}

impl MessageStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MESSAGE_DATA)?;
        write_txn.open_table(MESSAGE_INDEX)?;
        write_txn.open_table(MESSAGE_META)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Store a raw message record and index it by creation time.
    ///
    /// Fails if a record with the same id already exists.
    pub fn insert_raw(&self, id: &str, created_at_ms: i64, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        Self::insert_in_txn(&write_txn, id, created_at_ms, data)?;
        write_txn.commit()?;
        Ok(())
    }

    /// Store a new record stamped no earlier than the newest indexed one.
    ///
    /// `encode` receives the assigned timestamp and returns the record bytes.
    /// Returns the assigned timestamp.
    pub fn append_raw<F>(&self, id: &str, now_ms: i64, encode: F) -> Result<i64>
    where
        F: FnOnce(i64) -> Result<Vec<u8>>,
    {
        let write_txn = self.db.begin_write()?;
        let latest = {
            let index_table = write_txn.open_table(MESSAGE_INDEX)?;
            match index_table.last()? {
                Some((key, _)) => Self::created_at_from_key(key.value()),
                None => None,
            }
        };
        let created_at_ms = latest.map_or(now_ms, |latest| now_ms.max(latest));
        let data = encode(created_at_ms)?;
        Self::insert_in_txn(&write_txn, id, created_at_ms, &data)?;
        write_txn.commit()?;
        Ok(created_at_ms)
    }

    fn insert_in_txn(
        write_txn: &WriteTransaction,
        id: &str,
        created_at_ms: i64,
        data: &[u8],
    ) -> Result<()> {
        let mut data_table = write_txn.open_table(MESSAGE_DATA)?;
        if data_table.get(id)?.is_some() {
            return Err(anyhow::anyhow!("Message {} already exists", id));
        }
        data_table.insert(id, data)?;
        drop(data_table);

        let mut meta_table = write_txn.open_table(MESSAGE_META)?;
        let seq = meta_table
            .get(SEQUENCE_KEY)?
            .map(|value| value.value())
            .unwrap_or(0);
        meta_table.insert(SEQUENCE_KEY, seq.saturating_add(1))?;
        drop(meta_table);

        let mut index_table = write_txn.open_table(MESSAGE_INDEX)?;
        let key = Self::index_key(created_at_ms, seq);
        index_table.insert(key.as_str(), id)?;
        Ok(())
    }

    /// Get raw message data by ID
    pub fn get_raw(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MESSAGE_DATA)?;

        if let Some(data) = table.get(id)? {
            Ok(Some(data.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// List up to `limit` raw records ordered by creation time.
    ///
    /// Index entries whose record is missing are skipped.
    pub fn list_raw(&self, newest_first: bool, limit: usize) -> Result<Vec<(String, Vec<u8>)>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(MESSAGE_INDEX)?;
        let data = read_txn.open_table(MESSAGE_DATA)?;

        let mut ids = Vec::new();
        let iter = index.iter()?;
        if newest_first {
            for item in iter.rev() {
                let (_, value) = item?;
                ids.push(value.value().to_string());
                if ids.len() == limit {
                    break;
                }
            }
        } else {
            for item in iter {
                let (_, value) = item?;
                ids.push(value.value().to_string());
                if ids.len() == limit {
                    break;
                }
            }
        }

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match data.get(id.as_str())? {
                Some(bytes) => records.push((id, bytes.value().to_vec())),
                None => tracing::warn!(message_id = %id, "Index entry without message data"),
            }
        }

        Ok(records)
    }

    /// Count stored messages
    pub fn count(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MESSAGE_DATA)?;
        Ok(table.len()? as usize)
    }

    /// Flipping the sign bit maps i64 onto u64 in order, so pre-1970
    /// timestamps sort before later ones under zero-padded string order.
    fn index_key(created_at_ms: i64, seq: u64) -> String {
        let ordered = (created_at_ms as u64) ^ SIGN_BIT;
        format!("{ordered:020}:{seq:020}")
    }

    fn created_at_from_key(key: &str) -> Option<i64> {
        let (ordered, _) = key.split_once(':')?;
        let ordered: u64 = ordered.parse().ok()?;
        Some((ordered ^ SIGN_BIT) as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Returns both the store and the TempDir to ensure the directory
    /// is not deleted while the store is in use.
    fn test_store() -> (MessageStorage, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("messages.redb");
        let db = Arc::new(Database::create(db_path).unwrap());
        (MessageStorage::new(db).unwrap(), dir)
    }

    #[test]
    fn test_insert_and_get_raw() {
        let (storage, _temp_dir) = test_store();

        storage.insert_raw("msg-001", 1_000, b"hello").unwrap();

        let retrieved = storage.get_raw("msg-001").unwrap();
        assert_eq!(retrieved.as_deref(), Some(b"hello".as_slice()));
        assert!(storage.get_raw("msg-404").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let (storage, _temp_dir) = test_store();

        storage.insert_raw("msg-001", 1_000, b"first").unwrap();
        assert!(storage.insert_raw("msg-001", 2_000, b"second").is_err());
        assert_eq!(storage.count().unwrap(), 1);
        assert_eq!(storage.get_raw("msg-001").unwrap().unwrap(), b"first");
    }

    #[test]
    fn test_list_raw_orders_by_created_at() {
        let (storage, _temp_dir) = test_store();

        storage.insert_raw("b", 2_000, b"2").unwrap();
        storage.insert_raw("a", 1_000, b"1").unwrap();
        storage.insert_raw("c", 3_000, b"3").unwrap();

        let newest: Vec<String> = storage
            .list_raw(true, 10)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(newest, vec!["c", "b", "a"]);

        let oldest: Vec<String> = storage
            .list_raw(false, 2)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(oldest, vec!["a", "b"]);
    }

    #[test]
    fn test_same_millisecond_keeps_insertion_order() {
        let (storage, _temp_dir) = test_store();

        storage.insert_raw("first", 5_000, b"1").unwrap();
        storage.insert_raw("second", 5_000, b"2").unwrap();

        let newest = storage.list_raw(true, 10).unwrap();
        assert_eq!(newest[0].0, "second");
        assert_eq!(newest[1].0, "first");
    }

    #[test]
    fn test_list_raw_zero_limit() {
        let (storage, _temp_dir) = test_store();
        storage.insert_raw("a", 1, b"1").unwrap();
        assert!(storage.list_raw(true, 0).unwrap().is_empty());
    }

    #[test]
    fn test_pre_epoch_timestamps_sort_before_epoch() {
        let (storage, _temp_dir) = test_store();

        storage.insert_raw("epoch", 0, b"0").unwrap();
        storage.insert_raw("older", -86_400_000, b"-2").unwrap();
        storage.insert_raw("old", -1, b"-1").unwrap();
        storage.insert_raw("recent", 1_700_000_000_000, b"1").unwrap();

        let oldest: Vec<String> = storage
            .list_raw(false, 10)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(oldest, vec!["older", "old", "epoch", "recent"]);
    }

    #[test]
    fn test_index_key_round_trips_timestamp() {
        for created_at in [i64::MIN, -1, 0, 1, 1_700_000_000_000, i64::MAX] {
            let key = MessageStorage::index_key(created_at, 7);
            assert_eq!(MessageStorage::created_at_from_key(&key), Some(created_at));
        }
    }

    #[test]
    fn test_append_raw_never_stamps_before_newest() {
        let (storage, _temp_dir) = test_store();
        storage.insert_raw("future", 9_000, b"f").unwrap();

        // clock stepped backwards
        let stamped = storage
            .append_raw("next", 4_000, |created_at| Ok(created_at.to_string().into_bytes()))
            .unwrap();
        assert_eq!(stamped, 9_000);
        assert_eq!(storage.get_raw("next").unwrap().unwrap(), b"9000");

        let newest = storage.list_raw(true, 10).unwrap();
        assert_eq!(newest[0].0, "next");

        let later = storage
            .append_raw("later", 12_000, |_| Ok(b"l".to_vec()))
            .unwrap();
        assert_eq!(later, 12_000);
    }

    #[test]
    fn test_append_raw_encode_failure_writes_nothing() {
        let (storage, _temp_dir) = test_store();
        let result = storage.append_raw("bad", 1_000, |_| Err(anyhow::anyhow!("encode failed")));
        assert!(result.is_err());
        assert_eq!(storage.count().unwrap(), 0);
    }
}
