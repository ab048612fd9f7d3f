//! Filesystem-backed blob storage.

pub mod fs_blob_store;
