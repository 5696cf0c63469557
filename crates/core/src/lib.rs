//! sc-core: Core library for the s3commander client
//!
//! This crate provides the object store access and transfer engine:
//! - Configuration management and client settings
//! - Exhaustive, pagination-correct listing
//! - Whole-object content retrieval
//! - Progress-tracked, atomically published downloads
//! - Server-side filtered queries
//!
//! The engine is written against the `ObjectStore` trait and does not depend
//! on any S3 SDK.

pub mod config;
pub mod content;
pub mod download;
pub mod error;
pub mod listing;
pub mod path;
pub mod progress;
pub mod query;
pub mod traits;

pub use config::{ClientConfig, Config, ConfigManager, StaticCredentials};
pub use download::{DownloadConfig, DownloadOptions, DownloadReport};
pub use error::{Error, Result};
pub use path::ObjectRef;
pub use progress::{LineProgress, NoProgress, ProgressObserver, ProgressUpdate};
pub use query::{DEFAULT_EXPRESSION, QuerySummary};
pub use traits::{
    ByteChunks, ListPage, ObjectStore, PageRequest, QueryEvent, QueryStats, RecordStream,
    VersionListing, VersionRecord,
};
