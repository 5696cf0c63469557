//! ObjectStore trait definition
//!
//! This trait defines the remote API the engine is written against.
//! It keeps listing, download and query logic independent of the S3 SDK.

use std::ops::Range;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::ObjectRef;

/// Request for one page of an object listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Bucket to list
    pub bucket: String,

    /// Key prefix to filter by
    pub prefix: Option<String>,

    /// Continuation token returned by the previous page
    pub continuation_token: Option<String>,

    /// Maximum number of keys per page (remote default when unset)
    pub max_keys: Option<i32>,
}

/// One page of an object listing, as reported by the remote store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Object keys in remote order
    pub keys: Vec<String>,

    /// Truncation flag; `None` when the response did not carry one
    pub is_truncated: Option<bool>,

    /// Token for the next page
    pub next_continuation_token: Option<String>,
}

/// Metadata describing one historical revision of an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Object key
    pub key: String,

    /// Version id ("null" for objects written before versioning was enabled)
    pub version_id: String,

    /// Whether this is the current version
    pub is_latest: bool,

    /// Whether this revision is a delete marker
    pub is_delete_marker: bool,

    /// Size in bytes (absent for delete markers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    /// Last modification time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag without surrounding quotes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// Result of a single version listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionListing {
    /// Versions and delete markers
    pub versions: Vec<VersionRecord>,

    /// Whether the remote store holds more versions than returned
    pub is_truncated: bool,
}

/// Scan statistics reported by the query engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub bytes_scanned: i64,
    pub bytes_processed: i64,
    pub bytes_returned: i64,
}

/// One event of a server-side query result stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    /// A chunk of result records
    Records(Bytes),
    /// Final statistics
    Stats(QueryStats),
    /// Periodic progress statistics
    Progress(QueryStats),
    /// Keep-alive
    Continuation,
    /// The remote signalled the end of the stream
    End,
}

/// Chunks of an object body
pub type ByteChunks = BoxStream<'static, Result<Bytes>>;

/// Server-pushed stream of query events
///
/// `close` releases the underlying connection. Implementations must
/// tolerate `next_event` not being called again after `close`.
#[async_trait]
pub trait RecordStream: Send {
    /// Receive the next event; `None` once the transport has no more events
    async fn next_event(&mut self) -> Result<Option<QueryEvent>>;

    /// Release the stream
    fn close(&mut self);
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List bucket names
    async fn list_buckets(&self) -> Result<Vec<String>>;

    /// Fetch one page of object keys
    async fn list_objects_page(&self, request: &PageRequest) -> Result<ListPage>;

    /// List versions and delete markers under a key prefix (single call)
    async fn list_object_versions(&self, bucket: &str, prefix: &str) -> Result<VersionListing>;

    /// Metadata probe returning the authoritative content length
    async fn content_length(&self, object: &ObjectRef) -> Result<u64>;

    /// Get the whole object body
    async fn get_object(&self, object: &ObjectRef) -> Result<Vec<u8>>;

    /// Stream the bytes of `range` (end exclusive)
    async fn get_range(&self, object: &ObjectRef, range: Range<u64>) -> Result<ByteChunks>;

    /// Start a server-side query over newline-delimited JSON records
    async fn select_object_content(
        &self,
        object: &ObjectRef,
        expression: &str,
    ) -> Result<Box<dyn RecordStream>>;
}
