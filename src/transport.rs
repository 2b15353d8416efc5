//! Upload transport: where file bytes go once the store has accepted the metadata.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

use crate::backend::FileSystemStore;
use crate::error::FsError;
use crate::types::{FileSystemItem, ItemId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("no content stored for {0}")]
    NotFound(ItemId),

    #[error("quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: u64, available: u64 },

    // std::io::Error is stringified so the error stays Clone
    #[error("transport I/O error: {0}")]
    Io(String),

    #[error("rejected by remote: {0}")]
    Rejected(String),
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::Io(e.to_string())
    }
}

/// Failure of [`upload_with_transport`], keeping the two taxonomies apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error(transparent)]
    Store(#[from] FsError),

    #[error("upload of {item_id} failed: {source}")]
    Transport {
        item_id: ItemId,
        #[source]
        source: TransportError,
        /// Whether the metadata entry was deleted again.
        rolled_back: bool,
    },
}

/// What to do with the metadata entry when the bytes fail to arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    /// Leave the entry; the caller decides.
    #[default]
    Keep,
    DeleteOnFailure,
}

/// Persists content for items the store has recorded.
#[async_trait::async_trait]
pub trait UploadTransport: Send + Sync + 'static {
    async fn put(&self, id: ItemId, data: &[u8]) -> Result<(), TransportError>;

    async fn fetch(&self, id: ItemId) -> Result<Vec<u8>, TransportError>;

    async fn remove(&self, id: ItemId) -> Result<(), TransportError>;
}

/// In-memory content store, mostly for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    blobs: Arc<RwLock<HashMap<ItemId, Vec<u8>>>>,
    quota: Option<u64>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the total number of bytes held.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota = Some(bytes);
        self
    }

    pub async fn used_bytes(&self) -> u64 {
        let blobs = self.blobs.read().await;
        blobs.values().map(|b| b.len() as u64).sum()
    }

    pub async fn contains(&self, id: ItemId) -> bool {
        self.blobs.read().await.contains_key(&id)
    }
}

#[async_trait::async_trait]
impl UploadTransport for MemoryTransport {
    async fn put(&self, id: ItemId, data: &[u8]) -> Result<(), TransportError> {
        let mut blobs = self.blobs.write().await;
        if let Some(quota) = self.quota {
            let replaced = blobs.get(&id).map_or(0, |b| b.len() as u64);
            let used: u64 = blobs.values().map(|b| b.len() as u64).sum::<u64>() - replaced;
            let available = quota.saturating_sub(used);
            if data.len() as u64 > available {
                return Err(TransportError::QuotaExceeded {
                    needed: data.len() as u64,
                    available,
                });
            }
        }
        blobs.insert(id, data.to_vec());
        Ok(())
    }

    async fn fetch(&self, id: ItemId) -> Result<Vec<u8>, TransportError> {
        let blobs = self.blobs.read().await;
        blobs.get(&id).cloned().ok_or(TransportError::NotFound(id))
    }

    async fn remove(&self, id: ItemId) -> Result<(), TransportError> {
        let mut blobs = self.blobs.write().await;
        blobs
            .remove(&id)
            .map(|_| ())
            .ok_or(TransportError::NotFound(id))
    }
}

/// Record the file in `store`, then hand its bytes to `transport`.
///
/// The metadata mutation completes before any await point. On transport
/// failure the entry stays unless `rollback` asks for it to be deleted.
pub async fn upload_with_transport<S, T>(
    store: &mut S,
    transport: &T,
    name: &str,
    mime_type: &str,
    data: &[u8],
    parent_id: Option<ItemId>,
    rollback: RollbackPolicy,
) -> Result<FileSystemItem, UploadError>
where
    S: FileSystemStore + ?Sized,
    T: UploadTransport + ?Sized,
{
    let item = store.upload_file(name, data.len() as u64, mime_type, parent_id)?;

    match transport.put(item.id, data).await {
        Ok(()) => Ok(item),
        Err(source) => {
            let rolled_back = rollback == RollbackPolicy::DeleteOnFailure
                && store.delete_items(&[item.id]) > 0;
            warn!(item_id = %item.id, error = %source, rolled_back, "Upload transport failed");
            Err(UploadError::Transport {
                item_id: item.id,
                source,
                rolled_back,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryFileSystem;
    use crate::error::ErrorKind;

    struct Unreachable;

    #[async_trait::async_trait]
    impl UploadTransport for Unreachable {
        async fn put(&self, _id: ItemId, _data: &[u8]) -> Result<(), TransportError> {
            Err(std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into())
        }

        async fn fetch(&self, id: ItemId) -> Result<Vec<u8>, TransportError> {
            Err(TransportError::NotFound(id))
        }

        async fn remove(&self, id: ItemId) -> Result<(), TransportError> {
            Err(TransportError::NotFound(id))
        }
    }

    /// Refuses empty payloads, otherwise stores in memory.
    struct NonEmptyOnly(MemoryTransport);

    #[async_trait::async_trait]
    impl UploadTransport for NonEmptyOnly {
        async fn put(&self, id: ItemId, data: &[u8]) -> Result<(), TransportError> {
            if data.is_empty() {
                return Err(TransportError::Rejected("empty upload".into()));
            }
            self.0.put(id, data).await
        }

        async fn fetch(&self, id: ItemId) -> Result<Vec<u8>, TransportError> {
            self.0.fetch(id).await
        }

        async fn remove(&self, id: ItemId) -> Result<(), TransportError> {
            self.0.remove(id).await
        }
    }

    #[tokio::test]
    async fn test_upload_stores_bytes_and_metadata() {
        let mut fs = MemoryFileSystem::new();
        let transport = MemoryTransport::new();

        let item = upload_with_transport(
            &mut fs,
            &transport,
            "notes.txt",
            "text/plain",
            b"Hello, World!",
            None,
            RollbackPolicy::Keep,
        )
        .await
        .unwrap();

        assert_eq!(item.size, Some(13));
        assert_eq!(transport.fetch(item.id).await.unwrap(), b"Hello, World!");
        assert_eq!(fs.list_children(None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_error_skips_transport() {
        let mut fs = MemoryFileSystem::new();
        let transport = MemoryTransport::new();
        fs.upload_file("notes.txt", 1, "text/plain", None).unwrap();

        let err = upload_with_transport(
            &mut fs,
            &transport,
            "NOTES.txt",
            "text/plain",
            b"x",
            None,
            RollbackPolicy::Keep,
        )
        .await
        .unwrap_err();

        match err {
            UploadError::Store(e) => assert_eq!(e.kind(), ErrorKind::DuplicateName),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.used_bytes().await, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_entry_by_default() {
        let mut fs = MemoryFileSystem::new();
        let err = upload_with_transport(
            &mut fs,
            &Unreachable,
            "a.bin",
            "application/octet-stream",
            b"abc",
            None,
            RollbackPolicy::Keep,
        )
        .await
        .unwrap_err();

        match err {
            UploadError::Transport {
                source: TransportError::Io(message),
                rolled_back: false,
                ..
            } => assert!(!message.is_empty()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(fs.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_upload_is_a_transport_error() {
        let mut fs = MemoryFileSystem::new();
        let transport = NonEmptyOnly(MemoryTransport::new());

        let err = upload_with_transport(
            &mut fs,
            &transport,
            "empty.txt",
            "text/plain",
            b"",
            None,
            RollbackPolicy::DeleteOnFailure,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            UploadError::Transport {
                source: TransportError::Rejected(_),
                rolled_back: true,
                ..
            }
        ));
        assert!(fs.is_empty());

        let item = upload_with_transport(
            &mut fs,
            &transport,
            "full.txt",
            "text/plain",
            b"content",
            None,
            RollbackPolicy::DeleteOnFailure,
        )
        .await
        .unwrap();
        assert_eq!(transport.fetch(item.id).await.unwrap(), b"content");
    }

    #[tokio::test]
    async fn test_transport_failure_rolls_back_when_asked() {
        let mut fs = MemoryFileSystem::new();
        let err = upload_with_transport(
            &mut fs,
            &Unreachable,
            "a.bin",
            "application/octet-stream",
            b"abc",
            None,
            RollbackPolicy::DeleteOnFailure,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            UploadError::Transport {
                rolled_back: true,
                ..
            }
        ));
        assert!(fs.is_empty());
    }

    #[tokio::test]
    async fn test_quota() {
        let transport = MemoryTransport::new().with_quota(8);
        let a = ItemId::new();
        transport.put(a, b"12345").await.unwrap();
        // Replacing an existing blob only counts the difference.
        transport.put(a, b"1234567").await.unwrap();

        let err = transport.put(ItemId::new(), b"12").await.unwrap_err();
        assert_eq!(
            err,
            TransportError::QuotaExceeded {
                needed: 2,
                available: 1
            }
        );
        transport.remove(a).await.unwrap();
        assert!(!transport.contains(a).await);
        assert!(matches!(
            transport.remove(a).await,
            Err(TransportError::NotFound(_))
        ));
    }
}
