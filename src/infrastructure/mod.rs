//! Infrastructure layer: external I/O boundaries

pub mod traits;

pub use traits::{BlobStore, FileBlobStore, MemoryBlobStore};
