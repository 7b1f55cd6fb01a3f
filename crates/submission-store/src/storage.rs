//! Upload storage backends.
//!
//! Uploads are persisted either to a local directory served back over the
//! `/uploads` static route, or to a remote HTTP object store. The backend
//! is chosen once at startup from configuration.

use crate::error::StoreError;
use crate::types::{StoredFile, Upload};
use rand::Rng;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Build the storage key for an upload: `{millis}-{random}-{sanitized name}`.
fn storage_key(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{}-{}", millis, suffix, sanitize_file_name(original_name))
}

/// Strip path components, control characters, and whitespace from a
/// client-supplied filename before it becomes part of a storage key.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "file".into()
    } else {
        cleaned
    }
}

/// Local-disk upload storage.
pub struct LocalStorage {
    dir: PathBuf,
    /// URL path prefix the uploads directory is served under.
    public_prefix: String,
}

impl LocalStorage {
    pub fn new(dir: PathBuf, public_prefix: impl Into<String>) -> Self {
        Self {
            dir,
            public_prefix: public_prefix.into(),
        }
    }

    /// Persist an upload under the storage directory.
    pub async fn put(&self, upload: &Upload) -> Result<StoredFile, StoreError> {
        fs::create_dir_all(&self.dir).await?;

        let key = storage_key(&upload.original_name);
        let path = self.dir.join(&key);
        fs::write(&path, &upload.bytes).await?;

        debug!(
            "Stored {} byte upload at {:?}",
            upload.bytes.len(),
            path
        );

        Ok(StoredFile {
            kind: upload.kind,
            original_name: upload.original_name.clone(),
            location: format!("{}/{}", self.public_prefix.trim_end_matches('/'), key),
        })
    }

    /// Directory uploads are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Remote HTTP object-store upload storage.
///
/// Objects are PUT to `{endpoint}/{key}` with the upload's declared content
/// type; the returned location is `{public_url}/{key}`.
pub struct RemoteStorage {
    client: reqwest::Client,
    endpoint: String,
    public_url: String,
    token: Option<String>,
}

impl RemoteStorage {
    pub fn new(
        endpoint: impl Into<String>,
        public_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            public_url: public_url.into(),
            token,
        }
    }

    /// Persist an upload to the object store.
    pub async fn put(&self, upload: &Upload) -> Result<StoredFile, StoreError> {
        let key = storage_key(&upload.original_name);
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), key);

        let mut request = self
            .client
            .put(&url)
            .header("content-type", upload.content_type.clone())
            .body(upload.bytes.clone());

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StoreError::ObjectStore(format!(
                "PUT {} returned {}",
                url,
                response.status()
            )));
        }

        debug!("Stored {} byte upload at {}", upload.bytes.len(), url);

        Ok(StoredFile {
            kind: upload.kind,
            original_name: upload.original_name.clone(),
            location: format!("{}/{}", self.public_url.trim_end_matches('/'), key),
        })
    }
}

/// Upload storage backend, selected at startup.
pub enum Storage {
    /// Local filesystem, served back as static files.
    Local(LocalStorage),
    /// Remote HTTP object store.
    Remote(RemoteStorage),
}

impl Storage {
    pub fn local(dir: PathBuf, public_prefix: impl Into<String>) -> Self {
        info!("Using local upload storage at {:?}", dir);
        Storage::Local(LocalStorage::new(dir, public_prefix))
    }

    pub fn remote(
        endpoint: impl Into<String>,
        public_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        let endpoint = endpoint.into();
        info!("Using remote upload storage at {}", endpoint);
        Storage::Remote(RemoteStorage::new(endpoint, public_url, token))
    }

    /// Persist an upload, returning its durable reference.
    pub async fn put(&self, upload: &Upload) -> Result<StoredFile, StoreError> {
        match self {
            Storage::Local(s) => s.put(upload).await,
            Storage::Remote(s) => s.put(upload).await,
        }
    }

    /// Local uploads directory, if this backend has one to serve.
    pub fn local_dir(&self) -> Option<&Path> {
        match self {
            Storage::Local(s) => Some(s.dir()),
            Storage::Remote(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentKind;

    fn jpeg_upload(name: &str) -> Upload {
        Upload {
            kind: DocumentKind::Passport,
            original_name: name.into(),
            content_type: "image/jpeg".into(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10],
        }
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("scan.jpg"), "scan.jpg");
        assert_eq!(sanitize_file_name("my passport.jpg"), "my_passport.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\id.png"), "id.png");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[test]
    fn test_storage_keys_are_unique() {
        let a = storage_key("scan.jpg");
        let b = storage_key("scan.jpg");
        assert_ne!(a, b);
        assert!(a.ends_with("-scan.jpg"));
    }

    #[tokio::test]
    async fn test_local_put_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::local(dir.path().to_path_buf(), "/uploads");

        let stored = storage.put(&jpeg_upload("scan.jpg")).await.unwrap();

        assert!(stored.location.starts_with("/uploads/"));
        assert_eq!(stored.original_name, "scan.jpg");

        let key = stored.location.strip_prefix("/uploads/").unwrap();
        let written = std::fs::read(dir.path().join(key)).unwrap();
        assert_eq!(written, vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);
    }

    #[tokio::test]
    async fn test_local_put_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads");
        let storage = Storage::local(nested.clone(), "/uploads");

        storage.put(&jpeg_upload("scan.jpg")).await.unwrap();

        assert!(nested.is_dir());
        assert_eq!(std::fs::read_dir(&nested).unwrap().count(), 1);
    }

    #[test]
    fn test_local_dir_exposed_only_for_local_backend() {
        let local = Storage::local(PathBuf::from("/tmp/uploads"), "/uploads");
        assert!(local.local_dir().is_some());

        let remote = Storage::remote("http://store:9000/bucket", "http://cdn", None);
        assert!(remote.local_dir().is_none());
    }

    mod remote {
        use super::*;
        use wiremock::matchers::{header, method};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn test_put_uploads_bytes_and_returns_public_location() {
            let mock_server = MockServer::start().await;
            Mock::given(method("PUT"))
                .and(header("content-type", "image/jpeg"))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&mock_server)
                .await;

            let storage = Storage::remote(mock_server.uri(), "http://cdn.example.com", None);
            let upload = jpeg_upload("scan.jpg");
            let stored = storage.put(&upload).await.unwrap();

            assert!(stored.location.starts_with("http://cdn.example.com/"));
            assert!(stored.location.ends_with("-scan.jpg"));
            assert_eq!(stored.original_name, "scan.jpg");

            let requests = mock_server.received_requests().await.unwrap();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].body, upload.bytes);
            assert!(requests[0].url.path().ends_with("-scan.jpg"));
        }

        #[tokio::test]
        async fn test_put_sends_bearer_token_when_configured() {
            let mock_server = MockServer::start().await;
            Mock::given(method("PUT"))
                .and(header("authorization", "Bearer store-token"))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&mock_server)
                .await;

            let storage = Storage::remote(
                mock_server.uri(),
                "http://cdn.example.com",
                Some("store-token".into()),
            );
            storage.put(&jpeg_upload("scan.jpg")).await.unwrap();
        }

        #[tokio::test]
        async fn test_put_error_status_surfaces_as_store_error() {
            let mock_server = MockServer::start().await;
            Mock::given(method("PUT"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&mock_server)
                .await;

            let storage = Storage::remote(mock_server.uri(), "http://cdn.example.com", None);
            let err = storage.put(&jpeg_upload("scan.jpg")).await.unwrap_err();

            match err {
                StoreError::ObjectStore(msg) => assert!(msg.contains("503")),
                other => panic!("expected object store error, got {:?}", other),
            }
        }
    }
}
