//! docshelf: an in-memory virtual file system for document management views.
//!
//! The store keeps a flat arena of folders and files linked by parent ids,
//! plus the navigation and selection state a file-explorer page needs.

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod transport;
pub mod types;
pub mod validation;

// Re-export
pub use backend::FileSystemStore;
pub use backends::MemoryFileSystem;
pub use config::{NameCase, StoreConfig};
pub use error::{ErrorKind, FsError, FsResult};
pub use snapshot::TreeSnapshot;
pub use transport::{
    MemoryTransport, RollbackPolicy, TransportError, UploadError, UploadTransport,
    upload_with_transport,
};
pub use types::*;
pub use validation::{NameValidation, validate_file_name};
