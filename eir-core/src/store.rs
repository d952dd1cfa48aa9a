//! The ordered-store abstraction: exact lookup, predecessor, successor,
//! upsert, over both the TAC-range map and the IMEI-prefix map.
//!
//! `RangeRepository` is async so that a future SQL-backed adapter can await
//! network I/O without changing the trait; `InMemoryRangeStore` never
//! actually yields, it just wraps a `BTreeMap` behind an `RwLock`.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::range::{ImeiEntry, TacRange};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("range store lock was poisoned")]
    Poisoned,
    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait RangeRepository: Send + Sync {
    async fn tac_lookup(&self, key: &[u8]) -> Result<Option<TacRange>, StoreError>;
    async fn tac_prev(&self, key: &[u8]) -> Result<Option<TacRange>, StoreError>;
    async fn tac_next(&self, key: &[u8]) -> Result<Option<TacRange>, StoreError>;
    async fn tac_save(&self, range: TacRange) -> Result<(), StoreError>;
    async fn tac_delete(&self, key: &[u8]) -> Result<Option<TacRange>, StoreError>;
    async fn tac_list(&self) -> Result<Vec<TacRange>, StoreError>;
    async fn clear_tac(&self) -> Result<(), StoreError>;

    async fn imei_lookup(&self, start_imei: &[u8]) -> Result<Option<ImeiEntry>, StoreError>;
    async fn imei_save(&self, entry: ImeiEntry) -> Result<(), StoreError>;
    async fn imei_delete(&self, start_imei: &[u8]) -> Result<Option<ImeiEntry>, StoreError>;
    async fn imei_list(&self) -> Result<Vec<ImeiEntry>, StoreError>;
    async fn clear_imei(&self) -> Result<(), StoreError>;
}

/// Reference in-memory implementation: one `RwLock<BTreeMap<..>>` per map,
/// matching the teacher's single-mutex-per-resource style. Reads take a
/// shared lock, writes take an exclusive one; `BTreeMap::range` gives
/// predecessor/successor directly since `Vec<u8>`'s `Ord` is byte-lexicographic.
#[derive(Default)]
pub struct InMemoryRangeStore {
    tac: RwLock<BTreeMap<Vec<u8>, TacRange>>,
    imei: RwLock<BTreeMap<Vec<u8>, ImeiEntry>>,
}

impl InMemoryRangeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RangeRepository for InMemoryRangeStore {
    async fn tac_lookup(&self, key: &[u8]) -> Result<Option<TacRange>, StoreError> {
        let map = self.tac.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    async fn tac_prev(&self, key: &[u8]) -> Result<Option<TacRange>, StoreError> {
        let map = self.tac.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .range::<[u8], _>(..key)
            .next_back()
            .map(|(_, v)| v.clone()))
    }

    async fn tac_next(&self, key: &[u8]) -> Result<Option<TacRange>, StoreError> {
        let map = self.tac.read().map_err(|_| StoreError::Poisoned)?;
        let lower = (std::ops::Bound::Excluded(key), std::ops::Bound::Unbounded);
        Ok(map.range::<[u8], _>(lower).next().map(|(_, v)| v.clone()))
    }

    async fn tac_save(&self, range: TacRange) -> Result<(), StoreError> {
        let mut map = self.tac.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(range.key.clone(), range);
        Ok(())
    }

    async fn tac_delete(&self, key: &[u8]) -> Result<Option<TacRange>, StoreError> {
        let mut map = self.tac.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(key))
    }

    async fn tac_list(&self) -> Result<Vec<TacRange>, StoreError> {
        let map = self.tac.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.values().cloned().collect())
    }

    async fn clear_tac(&self) -> Result<(), StoreError> {
        let mut map = self.tac.write().map_err(|_| StoreError::Poisoned)?;
        map.clear();
        Ok(())
    }

    async fn imei_lookup(&self, start_imei: &[u8]) -> Result<Option<ImeiEntry>, StoreError> {
        let map = self.imei.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(start_imei).cloned())
    }

    async fn imei_save(&self, entry: ImeiEntry) -> Result<(), StoreError> {
        let mut map = self.imei.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(entry.start_imei.clone(), entry);
        Ok(())
    }

    async fn imei_delete(&self, start_imei: &[u8]) -> Result<Option<ImeiEntry>, StoreError> {
        let mut map = self.imei.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(start_imei))
    }

    async fn imei_list(&self) -> Result<Vec<ImeiEntry>, StoreError> {
        let map = self.imei.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.values().cloned().collect())
    }

    async fn clear_imei(&self) -> Result<(), StoreError> {
        let mut map = self.imei.write().map_err(|_| StoreError::Poisoned)?;
        map.clear();
        Ok(())
    }
}
