//! Object references
//!
//! An object is addressed by bucket, key and an optional version id.
//! Keys are slash-delimited; no version id means the current version.

use crate::error::{Error, Result};

/// A reference to one object (optionally one version of it) in a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    /// Bucket name
    pub bucket: String,
    /// Object key
    pub key: String,
    /// Version id, `None` for the current version
    pub version_id: Option<String>,
}

impl ObjectRef {
    /// Create a reference to the current version of an object
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            version_id: None,
        }
    }

    /// Pin the reference to a specific version
    ///
    /// An empty version id is treated as the current version.
    pub fn with_version(mut self, version_id: Option<impl Into<String>>) -> Self {
        self.version_id = version_id
            .map(Into::into)
            .filter(|v: &String| !v.is_empty());
        self
    }

    /// Last path segment of the key, used as the local file name
    pub fn file_name(&self) -> Result<&str> {
        let name = self.key.rsplit('/').next().unwrap_or_default();
        if matches!(name, "" | "." | "..") {
            return Err(Error::InvalidPath(format!(
                "Key '{}' does not name a file",
                self.key
            )));
        }
        Ok(name)
    }

    /// Check that bucket and key are present
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(Error::InvalidPath("Bucket name cannot be empty".into()));
        }
        if self.key.is_empty() {
            return Err(Error::InvalidPath("Object key cannot be empty".into()));
        }
        Ok(())
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)?;
        if let Some(version) = &self.version_id {
            write!(f, "?versionId={version}")?;
        }
        Ok(())
    }
}

/// Normalize an optional listing prefix: an empty prefix means no prefix
pub fn normalize_prefix(prefix: Option<&str>) -> Option<String> {
    prefix.filter(|p| !p.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_nested_key() {
        let object = ObjectRef::new("bucket", "logs/2024/01/app.json");
        assert_eq!(object.file_name().unwrap(), "app.json");
    }

    #[test]
    fn test_file_name_flat_key() {
        let object = ObjectRef::new("bucket", "report.csv");
        assert_eq!(object.file_name().unwrap(), "report.csv");
    }

    #[test]
    fn test_file_name_directory_key() {
        let object = ObjectRef::new("bucket", "logs/2024/");
        assert!(matches!(object.file_name(), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_file_name_dot_segments() {
        for key in ["a/..", "a/.", "..", "."] {
            let object = ObjectRef::new("bucket", key);
            assert!(
                matches!(object.file_name(), Err(Error::InvalidPath(_))),
                "key {key:?} should not name a file"
            );
        }

        let object = ObjectRef::new("bucket", "a/..b");
        assert_eq!(object.file_name().unwrap(), "..b");
    }

    #[test]
    fn test_with_version() {
        let object = ObjectRef::new("b", "k").with_version(Some("v1"));
        assert_eq!(object.version_id.as_deref(), Some("v1"));

        let object = ObjectRef::new("b", "k").with_version(Some(""));
        assert!(object.version_id.is_none());

        let object = ObjectRef::new("b", "k").with_version(None::<String>);
        assert!(object.version_id.is_none());
    }

    #[test]
    fn test_validate() {
        assert!(ObjectRef::new("b", "k").validate().is_ok());
        assert!(ObjectRef::new("", "k").validate().is_err());
        assert!(ObjectRef::new("b", "").validate().is_err());
    }

    #[test]
    fn test_display() {
        let object = ObjectRef::new("bucket", "a/b.txt");
        assert_eq!(object.to_string(), "s3://bucket/a/b.txt");

        let object = object.with_version(Some("3HL4kqtJ"));
        assert_eq!(object.to_string(), "s3://bucket/a/b.txt?versionId=3HL4kqtJ");
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix(None), None);
        assert_eq!(normalize_prefix(Some("")), None);
        assert_eq!(normalize_prefix(Some("logs/")), Some("logs/".to_string()));
    }
}
