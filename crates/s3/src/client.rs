//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from sc-core.

use std::ops::Range;

use async_trait::async_trait;
use aws_credential_types::provider::ProvideCredentials;
use aws_smithy_types::error::display::DisplayErrorContext;
use futures::StreamExt;

use sc_core::{
    ByteChunks, ClientConfig, Error, ListPage, ObjectRef, ObjectStore, PageRequest, RecordStream,
    Result, VersionListing, VersionRecord,
};

use crate::select::SelectEventStream;

/// Error codes reported by S3 for missing buckets, keys and versions
const NOT_FOUND_CODES: &[&str] = &["NoSuchKey", "NoSuchBucket", "NoSuchVersion", "NotFound"];

/// Error codes reported by S3 for rejected credentials or permissions
const AUTH_CODES: &[&str] = &[
    "AccessDenied",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "ExpiredToken",
];

/// Credentials resolved by the active provider chain
#[derive(Debug, Clone)]
pub struct CredentialsInfo {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub expiry: Option<jiff::Timestamp>,
}

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    sdk_config: aws_config::SdkConfig,
    region: String,
}

impl S3Client {
    /// Create a new S3 client
    ///
    /// Credentials are resolved lazily; a failure surfaces from the first
    /// operation that needs them.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region_name().to_string()));

        if let Some(profile) = config.profile_name() {
            loader = loader.profile_name(profile);
        }

        if let Some(creds) = config.static_credentials() {
            loader = loader.credentials_provider(aws_credential_types::Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "s3commander-static-credentials",
            ));
        }

        if let Some(endpoint) = config.endpoint() {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.path_style())
            .build();

        tracing::debug!(
            region = config.region_name(),
            endpoint = config.endpoint().unwrap_or("default"),
            "created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            sdk_config,
            region: config.region_name().to_string(),
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    /// Region the client was built for
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Resolve the credentials the client signs requests with
    pub async fn credentials(&self) -> Result<CredentialsInfo> {
        let provider = self
            .sdk_config
            .credentials_provider()
            .ok_or_else(|| Error::Auth("No credentials provider configured".into()))?;

        let creds = provider
            .provide_credentials()
            .await
            .map_err(|e| Error::Auth(DisplayErrorContext(&e).to_string()))?;

        Ok(CredentialsInfo {
            access_key_id: creds.access_key_id().to_string(),
            secret_access_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().map(str::to_string),
            expiry: creds
                .expiry()
                .and_then(|t| jiff::Timestamp::try_from(t).ok()),
        })
    }
}

/// Map an SDK error onto the shared error type, keeping the remote message
pub(crate) fn classify_error<E>(err: &E, context: &str) -> Error
where
    E: std::error::Error + 'static,
{
    let message = DisplayErrorContext(err).to_string();
    if NOT_FOUND_CODES.iter().any(|code| message.contains(code)) {
        Error::NotFound(format!("{context}: {message}"))
    } else if AUTH_CODES.iter().any(|code| message.contains(code)) {
        Error::Auth(format!("{context}: {message}"))
    } else {
        Error::Network(format!("{context}: {message}"))
    }
}

/// HTTP Range header for an end-exclusive byte range
pub(crate) fn range_header(range: &Range<u64>) -> String {
    format!("bytes={}-{}", range.start, range.end.saturating_sub(1))
}

fn to_timestamp(dt: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    jiff::Timestamp::new(dt.secs(), dt.subsec_nanos() as i32).ok()
}

fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

/// Merge versions and delete markers into records, newest first per key
pub(crate) fn version_records(
    versions: &[aws_sdk_s3::types::ObjectVersion],
    markers: &[aws_sdk_s3::types::DeleteMarkerEntry],
) -> Vec<VersionRecord> {
    let mut records: Vec<VersionRecord> = versions
        .iter()
        .map(|v| VersionRecord {
            key: v.key().unwrap_or_default().to_string(),
            version_id: v.version_id().unwrap_or("null").to_string(),
            is_latest: v.is_latest().unwrap_or(false),
            is_delete_marker: false,
            size_bytes: v.size(),
            last_modified: v.last_modified().and_then(to_timestamp),
            etag: v.e_tag().map(trim_etag),
        })
        .chain(markers.iter().map(|m| VersionRecord {
            key: m.key().unwrap_or_default().to_string(),
            version_id: m.version_id().unwrap_or("null").to_string(),
            is_latest: m.is_latest().unwrap_or(false),
            is_delete_marker: true,
            size_bytes: None,
            last_modified: m.last_modified().and_then(to_timestamp),
            etag: None,
        }))
        .collect();

    records.sort_by(|a, b| {
        a.key
            .cmp(&b.key)
            .then_with(|| b.last_modified.cmp(&a.last_modified))
    });
    records
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| classify_error(&e, "list buckets"))?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    async fn list_objects_page(&self, request: &PageRequest) -> Result<ListPage> {
        tracing::debug!(
            bucket = %request.bucket,
            prefix = request.prefix.as_deref().unwrap_or(""),
            continuation = request.continuation_token.is_some(),
            "list objects page"
        );

        let response = self
            .inner
            .list_objects_v2()
            .bucket(&request.bucket)
            .set_prefix(request.prefix.clone())
            .set_continuation_token(request.continuation_token.clone())
            .set_max_keys(request.max_keys)
            .send()
            .await
            .map_err(|e| classify_error(&e, &format!("list s3://{}", request.bucket)))?;

        Ok(ListPage {
            keys: response
                .contents()
                .iter()
                .filter_map(|o| o.key().map(str::to_string))
                .collect(),
            is_truncated: response.is_truncated(),
            next_continuation_token: response.next_continuation_token().map(str::to_string),
        })
    }

    async fn list_object_versions(&self, bucket: &str, prefix: &str) -> Result<VersionListing> {
        let mut request = self.inner.list_object_versions().bucket(bucket);
        if !prefix.is_empty() {
            request = request.prefix(prefix);
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_error(&e, &format!("list versions of s3://{bucket}/{prefix}")))?;

        Ok(VersionListing {
            versions: version_records(response.versions(), response.delete_markers()),
            is_truncated: response.is_truncated().unwrap_or(false),
        })
    }

    async fn content_length(&self, object: &ObjectRef) -> Result<u64> {
        let response = self
            .inner
            .head_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .set_version_id(object.version_id.clone())
            .send()
            .await
            .map_err(|e| classify_error(&e, &object.to_string()))?;

        let length = response
            .content_length()
            .ok_or_else(|| Error::Protocol(format!("{object}: HEAD response has no content length")))?;

        u64::try_from(length)
            .map_err(|_| Error::Protocol(format!("{object}: negative content length {length}")))
    }

    async fn get_object(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .set_version_id(object.version_id.clone())
            .send()
            .await
            .map_err(|e| classify_error(&e, &object.to_string()))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(format!("{object}: {}", DisplayErrorContext(&e))))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn get_range(&self, object: &ObjectRef, range: Range<u64>) -> Result<ByteChunks> {
        let response = self
            .inner
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .set_version_id(object.version_id.clone())
            .range(range_header(&range))
            .send()
            .await
            .map_err(|e| classify_error(&e, &object.to_string()))?;

        let context = object.to_string();
        let chunks = futures::stream::unfold(Some(response.body), move |body| {
            let context = context.clone();
            async move {
                let mut body = body?;
                match body.try_next().await {
                    Ok(Some(chunk)) => Some((Ok(chunk), Some(body))),
                    Ok(None) => None,
                    // Stop after the first transport error.
                    Err(e) => Some((
                        Err(Error::Network(format!("{context}: {}", DisplayErrorContext(&e)))),
                        None,
                    )),
                }
            }
        });

        Ok(chunks.boxed())
    }

    async fn select_object_content(
        &self,
        object: &ObjectRef,
        expression: &str,
    ) -> Result<Box<dyn RecordStream>> {
        use aws_sdk_s3::types::{
            ExpressionType, InputSerialization, JsonInput, JsonOutput, JsonType,
            OutputSerialization,
        };

        if object.version_id.is_some() {
            tracing::warn!(object = %object, "queries always read the current version");
        }

        let output = self
            .inner
            .select_object_content()
            .bucket(&object.bucket)
            .key(&object.key)
            .expression(expression)
            .expression_type(ExpressionType::Sql)
            .input_serialization(
                InputSerialization::builder()
                    .json(JsonInput::builder().r#type(JsonType::Lines).build())
                    .build(),
            )
            .output_serialization(
                OutputSerialization::builder()
                    .json(JsonOutput::builder().build())
                    .build(),
            )
            .send()
            .await
            .map_err(|e| classify_error(&e, &object.to_string()))?;

        Ok(Box::new(SelectEventStream::new(output.payload, object.to_string())))
    }
}
