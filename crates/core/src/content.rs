//! Whole-object retrieval
//!
//! The object is buffered in memory. No size limit is enforced here; callers
//! must not use this for objects too large to hold.

use crate::error::Result;
use crate::path::ObjectRef;
use crate::traits::ObjectStore;

/// Fetch the object (or the pinned version) as raw bytes
pub async fn get_object_bytes(store: &dyn ObjectStore, object: &ObjectRef) -> Result<Vec<u8>> {
    object.validate()?;
    let data = store.get_object(object).await?;
    tracing::debug!(object = %object, bytes = data.len(), "fetched object");
    Ok(data)
}

/// Fetch the object as displayable text; invalid UTF-8 is replaced
pub async fn get_object_content(store: &dyn ObjectStore, object: &ObjectRef) -> Result<String> {
    let data = get_object_bytes(store, object).await?;
    Ok(match String::from_utf8(data) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
