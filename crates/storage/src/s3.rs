//! S3 content backend using byte-range requests.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;

use crate::error::StorageError;
use crate::traits::ContentBackend;

/// HTTP status S3 returns when a range starts past the end of the object.
const RANGE_NOT_SATISFIABLE: u16 = 416;

/// Client settings for [`S3Backend`].
///
/// Credentials always come from the AWS default provider chain.
#[derive(Debug, Clone, Default)]
pub struct S3Config {
    /// Region override (otherwise from the environment/profile).
    pub region: Option<String>,
    /// Custom endpoint URL for S3-compatible stores.
    pub endpoint_url: Option<String>,
    /// Use path-style addressing (`endpoint/bucket/key`).
    pub force_path_style: bool,
}

impl S3Config {
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn with_force_path_style(mut self, force: bool) -> Self {
        self.force_path_style = force;
        self
    }
}

/// Serves content from an S3 bucket, one request per call.
///
/// Locators are full object keys (prefix included). Nothing is cached.
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Backend {
    /// Create a backend from an existing client.
    ///
    /// # Arguments
    /// * `client` - Configured S3 client
    /// * `bucket` - Bucket name
    /// * `prefix` - Key prefix of the storage root (may be empty)
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    /// Create a backend with a client built from the default provider chain.
    ///
    /// # Arguments
    /// * `bucket` - Bucket name
    /// * `prefix` - Key prefix of the storage root (may be empty)
    /// * `config` - Region, endpoint, and addressing overrides
    pub async fn connect(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        config: &S3Config,
    ) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();
        Self::new(Client::from_conf(s3_config), bucket, prefix)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Join a key prefix and a relative path with a single `/`.
pub(crate) fn join_key(prefix: &str, relative: &str) -> String {
    let relative: &str = relative.trim_start_matches('/');
    if prefix.is_empty() {
        relative.to_string()
    } else {
        format!("{}/{}", prefix, relative)
    }
}

/// HTTP `Range` header value for `length` bytes at `offset`.
///
/// Returns None for an empty range, which needs no request.
pub(crate) fn range_header(offset: u64, length: u64) -> Option<String> {
    if length == 0 {
        return None;
    }
    let last: u64 = offset.saturating_add(length - 1);
    Some(format!("bytes={}-{}", offset, last))
}

#[async_trait]
impl ContentBackend for S3Backend {
    fn kind(&self) -> &'static str {
        "s3"
    }

    fn locator(&self, relative: &str) -> String {
        join_key(&self.prefix, relative)
    }

    async fn fetch_size(&self, locator: &str) -> Result<u64, StorageError> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(locator)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().map_or(false, |e| e.is_not_found()) {
                    StorageError::LocatorNotFound {
                        locator: locator.to_string(),
                    }
                } else {
                    StorageError::unavailable(locator, DisplayErrorContext(&err))
                }
            })?;

        output
            .content_length()
            .and_then(|len| u64::try_from(len).ok())
            .ok_or_else(|| StorageError::unavailable(locator, "missing content length"))
    }

    async fn read_range(
        &self,
        locator: &str,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, StorageError> {
        let Some(range) = range_header(offset, length) else {
            return Ok(Vec::new());
        };
        tracing::trace!(bucket = %self.bucket, key = locator, %range, "s3 range read");

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(locator)
            .range(range)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                let status: Option<u16> = err.raw_response().map(|r| r.status().as_u16());
                if status == Some(RANGE_NOT_SATISFIABLE) {
                    return Ok(Vec::new());
                }
                if err.as_service_error().map_or(false, |e| e.is_no_such_key()) {
                    return Err(StorageError::LocatorNotFound {
                        locator: locator.to_string(),
                    });
                }
                return Err(StorageError::unavailable(locator, DisplayErrorContext(&err)));
            }
        };

        let mut bytes: Vec<u8> = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::unavailable(locator, e))?
            .into_bytes()
            .to_vec();
        bytes.truncate(length as usize);
        Ok(bytes)
    }

    async fn read_all(&self, locator: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(locator)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().map_or(false, |e| e.is_no_such_key()) {
                    StorageError::LocatorNotFound {
                        locator: locator.to_string(),
                    }
                } else {
                    StorageError::unavailable(locator, DisplayErrorContext(&err))
                }
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::unavailable(locator, e))?;
        Ok(bytes.into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
    use aws_smithy_http_client::test_util::{ReplayEvent, StaticReplayClient};
    use aws_smithy_types::body::SdkBody;

    const NO_SUCH_KEY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message><Key>root/missing</Key><RequestId>R1</RequestId></Error>"#;

    const INVALID_RANGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>InvalidRange</Code><Message>The requested range is not satisfiable</Message><RequestId>R2</RequestId></Error>"#;

    fn event(status: u16, headers: &[(&str, &str)], body: &'static str) -> ReplayEvent {
        let request = http::Request::builder()
            .uri("https://bucket.s3.us-east-1.amazonaws.com/root/key")
            .body(SdkBody::empty())
            .unwrap();
        let mut response = http::Response::builder().status(status);
        for (name, value) in headers {
            response = response.header(*name, *value);
        }
        ReplayEvent::new(request, response.body(SdkBody::from(body)).unwrap())
    }

    /// Backend whose client answers from `events` in order.
    fn replay_backend(events: Vec<ReplayEvent>) -> (S3Backend, StaticReplayClient) {
        let http_client = StaticReplayClient::new(events);
        let conf = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKID", "SECRET", None, None, "test"))
            .retry_config(aws_sdk_s3::config::retry::RetryConfig::disabled())
            .http_client(http_client.clone())
            .build();
        (S3Backend::new(Client::from_conf(conf), "bucket", "root"), http_client)
    }

    #[tokio::test]
    async fn test_size_from_content_length() {
        let (backend, _) = replay_backend(vec![event(200, &[("Content-Length", "1234")], "")]);
        assert_eq!(backend.fetch_size("root/key").await.unwrap(), 1234);
    }

    #[tokio::test]
    async fn test_size_of_missing_key() {
        let (backend, _) = replay_backend(vec![event(404, &[], "")]);
        assert!(matches!(
            backend.fetch_size("root/key").await,
            Err(StorageError::LocatorNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_size_access_denied_is_unavailable() {
        let (backend, _) = replay_backend(vec![event(403, &[], "")]);
        let err = backend.fetch_size("root/key").await.unwrap_err();
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_range_read_sends_range_header() {
        let (backend, http_client) = replay_backend(vec![event(
            206,
            &[("Content-Length", "3"), ("Content-Range", "bytes 4-6/7")],
            "abc",
        )]);
        let data: Vec<u8> = backend.read_range("root/key", 4, 100).await.unwrap();
        assert_eq!(data, b"abc");

        let requests: Vec<_> = http_client.actual_requests().collect();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].headers().get("range"), Some("bytes=4-103"));
    }

    #[tokio::test]
    async fn test_range_past_end_is_empty() {
        let (backend, _) = replay_backend(vec![event(
            416,
            &[("Content-Type", "application/xml")],
            INVALID_RANGE,
        )]);
        assert!(backend.read_range("root/key", 10, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_range_read_of_missing_key() {
        let (backend, _) = replay_backend(vec![event(
            404,
            &[("Content-Type", "application/xml")],
            NO_SUCH_KEY,
        )]);
        assert!(matches!(
            backend.read_range("root/missing", 0, 5).await,
            Err(StorageError::LocatorNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_range_makes_no_request() {
        let (backend, http_client) = replay_backend(Vec::new());
        assert!(backend.read_range("root/key", 0, 0).await.unwrap().is_empty());
        assert_eq!(http_client.actual_requests().count(), 0);
    }

    #[tokio::test]
    async fn test_root_opens_when_declaration_check_is_denied() {
        let (backend, _) = replay_backend(vec![
            event(403, &[], ""),
            event(404, &[("Content-Type", "application/xml")], NO_SUCH_KEY),
        ]);
        let root = crate::OcflRoot::open(std::sync::Arc::new(backend)).await.unwrap();
        assert_eq!(root.spec(), None);
        assert_eq!(root.layout_name(), None);
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("", "ocfl_layout.json"), "ocfl_layout.json");
        assert_eq!(join_key("root", "abc/inventory.json"), "root/abc/inventory.json");
        assert_eq!(join_key("a/b", "/x"), "a/b/x");
    }

    #[test]
    fn test_range_header() {
        assert_eq!(range_header(0, 1).as_deref(), Some("bytes=0-0"));
        assert_eq!(range_header(10, 4096).as_deref(), Some("bytes=10-4105"));
        assert_eq!(range_header(5, 0), None);
    }

    #[test]
    fn test_config_builder() {
        let config = S3Config::default()
            .with_region("us-west-2")
            .with_endpoint_url("http://localhost:9000")
            .with_force_path_style(true);
        assert_eq!(config.region.as_deref(), Some("us-west-2"));
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert!(config.force_path_style);
    }

    #[test]
    fn test_prefix_is_trimmed() {
        let conf = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        let backend = S3Backend::new(Client::from_conf(conf), "bucket", "/store/");
        assert_eq!(backend.prefix(), "store");
        assert_eq!(backend.locator("obj/v1/content/a.txt"), "store/obj/v1/content/a.txt");
        assert_eq!(backend.kind(), "s3");
    }
}
