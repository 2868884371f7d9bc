// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persistent link records.
//!
//! The adapter keeps one [`LinkRecord`] per known address so that devices
//! can be rebuilt after a restart without asking them for their product
//! class again. Two stores are provided:
//!
//! - [`MemoryStore`] for tests and hosts with their own persistence
//! - [`JsonFileStore`], a single JSON document rewritten on every change

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::protocol::LinkRecord;
use crate::types::Address;

/// Address-keyed storage of link records.
pub trait LinkStore: Send + Sync + 'static {
    /// Returns the record stored for `address`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be read.
    fn get(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<Option<LinkRecord>, StoreError>> + Send;

    /// Stores `record` under `address`, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    fn set(
        &self,
        address: Address,
        record: LinkRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes the record stored under `address`. Missing records are not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    fn delete(&self, address: Address) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// In-process store. Contents are lost with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Address, LinkRecord>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl LinkStore for MemoryStore {
    async fn get(&self, address: Address) -> Result<Option<LinkRecord>, StoreError> {
        Ok(self.records.read().get(&address).copied())
    }

    async fn set(&self, address: Address, record: LinkRecord) -> Result<(), StoreError> {
        self.records.write().insert(address, record);
        Ok(())
    }

    async fn delete(&self, address: Address) -> Result<(), StoreError> {
        self.records.write().remove(&address);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    #[serde(flatten)]
    record: LinkRecord,
    saved_at: DateTime<Utc>,
}

/// On-disk layout of a [`JsonFileStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    records: BTreeMap<Address, StoredRecord>,
}

/// Store backed by one JSON file.
///
/// The whole document is held in memory and written back, through a
/// temporary file and a rename, after every change. A change only reaches
/// the in-memory document once it has been written.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<Document>,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file exists but cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let document = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let document: Document = serde_json::from_str(&contents)?;
                tracing::info!(
                    path = %path.display(),
                    records = document.records.len(),
                    "Loaded link records"
                );
                document
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No link store found, starting empty");
                Document::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    /// Returns the path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns when the record for `address` was last written.
    pub async fn saved_at(&self, address: Address) -> Option<DateTime<Utc>> {
        self.document
            .lock()
            .await
            .records
            .get(&address)
            .map(|stored| stored.saved_at)
    }

    async fn save(&self, document: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Saved link records");
        Ok(())
    }
}

impl LinkStore for JsonFileStore {
    async fn get(&self, address: Address) -> Result<Option<LinkRecord>, StoreError> {
        let document = self.document.lock().await;
        Ok(document.records.get(&address).map(|stored| stored.record))
    }

    async fn set(&self, address: Address, record: LinkRecord) -> Result<(), StoreError> {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        next.records.insert(
            address,
            StoredRecord {
                record,
                saved_at: Utc::now(),
            },
        );
        self.save(&next).await?;
        *document = next;
        Ok(())
    }

    async fn delete(&self, address: Address) -> Result<(), StoreError> {
        let mut document = self.document.lock().await;
        if !document.records.contains_key(&address) {
            return Ok(());
        }

        let mut next = document.clone();
        next.records.remove(&address);
        self.save(&next).await?;
        *document = next;
        Ok(())
    }
}
