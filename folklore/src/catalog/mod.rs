//! The raw dataset catalog.
//!
//! A catalog maps dataset names to descriptors: which files make up the
//! dataset, where they come from, and the hashes that verify them. The
//! catalog drives the fetch, unpack, and process stages.

mod dataset;
mod executors;
#[cfg(feature = "fetch")]
mod fetch;
mod source;

pub use dataset::{available_processed, Catalog, RawDataset};
pub use executors::{FetchExecutor, ProcessExecutor, UnpackExecutor};
#[cfg(feature = "fetch")]
pub use fetch::{download, FetchError};
pub use source::{hash_bytes, HashType, SourceFile, SourceRole};
