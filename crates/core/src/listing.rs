//! Bucket, object and version listing
//!
//! `list_objects` walks continuation tokens until the remote store reports a
//! final page. The walk is all-or-nothing: a failed page discards the keys
//! gathered so far.

use crate::error::{Error, Result};
use crate::path::normalize_prefix;
use crate::traits::{ObjectStore, PageRequest, VersionRecord};

/// List the names of all buckets visible to the client
pub async fn list_buckets(store: &dyn ObjectStore) -> Result<Vec<String>> {
    store.list_buckets().await
}

/// List object keys in `bucket` under `prefix`
///
/// With `fetch_all` unset only the first page is fetched, which keeps
/// interactive use (shell completion) bounded. With `fetch_all` set every
/// page is fetched in remote order.
pub async fn list_objects(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: Option<&str>,
    fetch_all: bool,
) -> Result<Vec<String>> {
    let mut request = PageRequest {
        bucket: bucket.to_string(),
        prefix: normalize_prefix(prefix),
        ..Default::default()
    };

    let mut keys = Vec::new();
    let mut pages = 0usize;

    loop {
        let page = store.list_objects_page(&request).await?;
        pages += 1;

        let truncated = page.is_truncated.ok_or_else(|| {
            Error::Protocol(format!(
                "page {pages} of s3://{bucket} listing has no truncation flag"
            ))
        })?;
        keys.extend(page.keys);

        if !fetch_all || !truncated {
            break;
        }

        // A truncated page must hand us the cursor for the next one.
        let token = page
            .next_continuation_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::Protocol(format!(
                    "page {pages} of s3://{bucket} listing is truncated but has no continuation token"
                ))
            })?;
        request.continuation_token = Some(token);
    }

    tracing::debug!(bucket, pages, keys = keys.len(), "listed objects");
    Ok(keys)
}

/// List versions and delete markers of objects under `key`
///
/// Issues a single request. When the remote store holds more versions than
/// one response carries, the first response is returned and a warning is
/// logged.
pub async fn list_versions(
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> Result<Vec<VersionRecord>> {
    let listing = store.list_object_versions(bucket, key).await?;

    if listing.is_truncated {
        tracing::warn!(
            bucket,
            key,
            returned = listing.versions.len(),
            "version listing truncated by the remote store; only the first page is shown"
        );
    }

    Ok(listing.versions)
}
