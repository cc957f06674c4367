// Key-value store over JSON collections

use crate::codec::{self, ID_FIELD};
use crate::error::{StoreError, StoreResult};
use crate::medium::Medium;
use crate::record::Record;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, info};

/// Result of [`KeyValueStore::update_by_id`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    CollectionMissing,
}

/// Result of [`KeyValueStore::remove_by_id`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotFound,
    CollectionMissing,
}

/// Access point to a [`Medium`] holding JSON collections
///
/// Each key holds either nothing or a JSON array. Every mutation reads the
/// whole collection, changes it in memory and writes it back, so a store is
/// single-writer: two interleaved read-modify-write sequences on one key keep
/// only the last write.
pub struct KeyValueStore<M: Medium> {
    medium: M,
}

impl<M: Medium> KeyValueStore<M> {
    pub fn new(medium: M) -> Self {
        Self { medium }
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    pub fn into_medium(self) -> M {
        self.medium
    }

    // ========================================================================
    // Raw API
    // ========================================================================

    /// Write `data` verbatim under `key`
    pub fn set_raw(&mut self, key: &str, data: &str) -> StoreResult<()> {
        self.medium.set_item(key, data)
    }

    /// Raw text stored under `key`
    pub fn get_raw(&self, key: &str) -> StoreResult<Option<String>> {
        self.medium.get_item(key)
    }

    /// Delete `key`; no-op if absent
    pub fn remove_raw(&mut self, key: &str) -> StoreResult<()> {
        debug!(key, "remove_raw");
        self.medium.remove_item(key)
    }

    pub fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.medium.get_item(key)?.is_some())
    }

    pub fn keys(&self) -> StoreResult<Vec<String>> {
        self.medium.keys()
    }

    // ========================================================================
    // Collection API
    // ========================================================================

    /// Deserialized collection under `key`, or `None` if the key is absent
    pub fn find_all(&self, key: &str) -> StoreResult<Option<Vec<Value>>> {
        match self.medium.get_item(key)? {
            Some(raw) => codec::decode_collection(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    /// Create an empty collection under `key` unless the key already exists
    ///
    /// Returns true if the collection was created.
    pub fn init_collection(&mut self, key: &str) -> StoreResult<bool> {
        if self.contains_key(key)? {
            return Ok(false);
        }

        info!(key, "Initializing empty collection");
        self.save_all_and_flush(key, &Vec::<Value>::new())?;
        Ok(true)
    }

    /// Append `value` to the collection under `key`
    ///
    /// The collection must already exist; see [`init_collection`](Self::init_collection).
    pub fn save<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> StoreResult<()> {
        let mut items = self
            .find_all(key)?
            .ok_or_else(|| StoreError::collection_missing(key))?;

        items.push(serde_json::to_value(value)?);
        debug!(key, len = items.len(), "save: appended");

        self.save_all_and_flush(key, &items)
    }

    /// Serialize `data` and overwrite whatever is stored under `key`
    pub fn save_all_and_flush<T: Serialize + ?Sized>(&mut self, key: &str, data: &T) -> StoreResult<()> {
        let json = codec::encode(data)?;
        self.medium.set_item(key, &json)
    }

    /// First item in the collection whose `id` equals `id`
    pub fn find_by_id(&self, key: &str, id: impl Into<Value>) -> StoreResult<Option<Value>> {
        let id = id.into();

        let Some(mut items) = self.find_all(key)? else {
            return Ok(None);
        };

        Ok(codec::position_by_id(&items, &id).map(|index| items.swap_remove(index)))
    }

    /// Replace the first item whose `id` equals `id` with `data`
    ///
    /// The stored id is written onto `data`, so the payload cannot change it.
    /// `data` must serialize to a JSON object.
    pub fn update_by_id<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        id: impl Into<Value>,
        data: &T,
    ) -> StoreResult<UpdateOutcome> {
        let id = id.into();

        let Some(mut items) = self.find_all(key)? else {
            debug!(key, %id, "update_by_id: collection missing");
            return Ok(UpdateOutcome::CollectionMissing);
        };

        let Some(index) = codec::position_by_id(&items, &id) else {
            debug!(key, %id, "update_by_id: not found");
            return Ok(UpdateOutcome::NotFound);
        };

        let mut replacement = serde_json::to_value(data)?;
        let stored_id = items[index][ID_FIELD].clone();
        match replacement.as_object_mut() {
            Some(object) => {
                object.insert(ID_FIELD.to_string(), stored_id);
            }
            None => return Err(StoreError::NotAnObject { key: key.to_string() }),
        }

        items[index] = replacement;
        self.save_all_and_flush(key, &items)?;

        debug!(key, %id, index, "update_by_id: updated");
        Ok(UpdateOutcome::Updated)
    }

    /// Remove the first item whose `id` equals `id`
    pub fn remove_by_id(&mut self, key: &str, id: impl Into<Value>) -> StoreResult<RemoveOutcome> {
        let id = id.into();

        let Some(mut items) = self.find_all(key)? else {
            debug!(key, %id, "remove_by_id: collection missing");
            return Ok(RemoveOutcome::CollectionMissing);
        };

        let Some(index) = codec::position_by_id(&items, &id) else {
            debug!(key, %id, "remove_by_id: not found");
            return Ok(RemoveOutcome::NotFound);
        };

        items.remove(index);
        self.save_all_and_flush(key, &items)?;

        debug!(key, %id, index, "remove_by_id: removed");
        Ok(RemoveOutcome::Removed)
    }

    // ========================================================================
    // Typed API
    // ========================================================================

    /// Collection under `key` deserialized as `T`
    pub fn find_all_as<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<Vec<T>>> {
        match self.find_all(key)? {
            Some(items) => {
                let records = items
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<Vec<T>, _>>()?;
                Ok(Some(records))
            }
            None => Ok(None),
        }
    }

    pub fn find_by_id_as<T: DeserializeOwned>(&self, key: &str, id: impl Into<Value>) -> StoreResult<Option<T>> {
        match self.find_by_id(key, id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Append a record to its default collection, creating the collection if needed
    pub fn save_record<T: Record>(&mut self, record: &T) -> StoreResult<()> {
        let key = T::collection_key();
        self.init_collection(key)?;
        self.save(key, record)
    }

    /// Replace the stored record with the same id
    pub fn update_record<T: Record>(&mut self, record: &T) -> StoreResult<UpdateOutcome> {
        self.update_by_id(T::collection_key(), record.id_value(), record)
    }

    pub fn remove_record<T: Record>(&mut self, id: impl Into<Value>) -> StoreResult<RemoveOutcome> {
        self.remove_by_id(T::collection_key(), id)
    }

    pub fn records<T: Record>(&self) -> StoreResult<Vec<T>> {
        Ok(self.find_all_as(T::collection_key())?.unwrap_or_default())
    }
}
