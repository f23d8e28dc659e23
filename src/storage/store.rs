//! Where the dataset lives: a local CSV file or a single object in an S3 bucket.

use crate::storage::csv::{dataset_from_csv, dataset_to_csv};
use crate::storage::error::{LoadError, PublishError};
use crate::types::dataset::Dataset;
use crate::utils::ensure_dir_exists;
use bon::bon;
use log::{info, warn};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::{fs, task};

/// Bucket the published dataset is uploaded to.
pub const DEFAULT_BUCKET: &str = "kayak-project-garp";

/// Object key of the published dataset.
pub const DEFAULT_OBJECT_KEY: &str = "df_complete.csv";

/// One object in an S3 bucket.
///
/// Credentials, region and endpoint that are not passed to the builder come from the
/// standard AWS environment (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`,
/// `AWS_SESSION_TOKEN`, `AWS_REGION`, `AWS_ENDPOINT`, ...), then from instance
/// credentials. Requests are signed with SigV4.
#[derive(Clone)]
pub struct S3Store {
    store: Arc<AmazonS3>,
    bucket: String,
    key: ObjectPath,
}

#[bon]
impl S3Store {
    /// # Arguments
    ///
    /// * `.bucket(..)`: Optional. Defaults to [`DEFAULT_BUCKET`].
    /// * `.key(..)`: Optional. Defaults to [`DEFAULT_OBJECT_KEY`].
    /// * `.region(..)`: Optional. AWS region.
    /// * `.endpoint(..)`: Optional. Custom endpoint for S3 compatible stores; plain
    ///   `http://` endpoints are allowed. Requests use path style (`{endpoint}/{bucket}/{key}`).
    /// * `.access_key_id(..)` / `.secret_access_key(..)`: Optional. Static credentials.
    ///
    /// # Errors
    ///
    /// The [`object_store::Error`] of an invalid configuration.
    #[builder]
    pub fn new(
        #[builder(into, default = DEFAULT_BUCKET.to_string())] bucket: String,
        #[builder(into, default = DEFAULT_OBJECT_KEY.to_string())] key: String,
        #[builder(into)] region: Option<String>,
        #[builder(into)] endpoint: Option<String>,
        #[builder(into)] access_key_id: Option<String>,
        #[builder(into)] secret_access_key: Option<String>,
    ) -> Result<Self, object_store::Error> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket.clone());
        if let Some(region) = region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = endpoint {
            builder = builder
                .with_allow_http(endpoint.starts_with("http://"))
                .with_endpoint(endpoint);
        }
        if let Some(access_key_id) = access_key_id {
            builder = builder.with_access_key_id(access_key_id);
        }
        if let Some(secret_access_key) = secret_access_key {
            builder = builder.with_secret_access_key(secret_access_key);
        }

        Ok(Self {
            store: Arc::new(builder.build()?),
            bucket,
            key: ObjectPath::from(key),
        })
    }

    pub fn url(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    async fn get(&self) -> Result<Vec<u8>, LoadError> {
        let result = self
            .store
            .get(&self.key)
            .await
            .map_err(|source| LoadError::ObjectStore {
                url: self.url(),
                source,
            })?;
        let bytes = result
            .bytes()
            .await
            .map_err(|source| LoadError::ObjectStore {
                url: self.url(),
                source,
            })?;
        Ok(bytes.to_vec())
    }

    async fn put(&self, bytes: Vec<u8>) -> Result<(), PublishError> {
        self.store
            .put(&self.key, PutPayload::from(bytes))
            .await
            .map_err(|source| PublishError::ObjectStore {
                url: self.url(),
                source,
            })?;
        Ok(())
    }
}

impl fmt::Debug for S3Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Store")
            .field("url", &self.url())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum DatasetStore {
    Local(PathBuf),
    Object(S3Store),
}

impl DatasetStore {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        DatasetStore::Local(path.into())
    }

    pub async fn read(&self) -> Result<Vec<u8>, LoadError> {
        match self {
            DatasetStore::Local(path) => fs::read(path)
                .await
                .map_err(|e| LoadError::Read(path.clone(), e)),
            DatasetStore::Object(store) => store.get().await,
        }
    }

    /// Fully replaces the stored dataset with `bytes`.
    pub async fn write(&self, bytes: Vec<u8>) -> Result<(), PublishError> {
        match self {
            DatasetStore::Local(path) => write_local(path, bytes).await,
            DatasetStore::Object(store) => store.put(bytes).await,
        }
    }

    pub async fn load(&self) -> Result<Dataset, LoadError> {
        let bytes = self.read().await?;
        let dataset = dataset_from_csv(bytes)?;
        info!("Loaded {} locations from {}", dataset.len(), self);
        Ok(dataset)
    }

    pub async fn save(&self, dataset: &Dataset) -> Result<(), PublishError> {
        let bytes = dataset_to_csv(dataset).map_err(PublishError::Csv)?;
        self.write(bytes).await
    }
}

impl fmt::Display for DatasetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetStore::Local(path) => write!(f, "{}", path.display()),
            DatasetStore::Object(store) => write!(f, "{}", store.url()),
        }
    }
}

/// Writes to a temporary file next to `path` and renames it over `path`, so readers see
/// either the previous or the new dataset.
async fn write_local(path: &Path, bytes: Vec<u8>) -> Result<(), PublishError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    ensure_dir_exists(&dir)
        .await
        .map_err(|e| PublishError::DirCreation(dir.clone(), e))?;

    let path_buf = path.to_path_buf();
    task::spawn_blocking(move || {
        let mut temp_file = NamedTempFile::new_in(&dir)
            .map_err(|e| PublishError::Write(path_buf.clone(), e))?;
        temp_file
            .write_all(&bytes)
            .and_then(|_| temp_file.flush())
            .map_err(|e| PublishError::Write(path_buf.clone(), e))?;
        temp_file.persist(&path_buf).map_err(|e| {
            warn!("Could not replace {}: {}", path_buf.display(), e.error);
            PublishError::Persist(path_buf.clone(), e.error)
        })?;
        Ok::<(), PublishError>(())
    })
    .await??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn local_write_replaces_previous_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let store = DatasetStore::local(dir.path().join("nested").join("df_complete.csv"));

        store.write(b"first".to_vec()).await?;
        store.write(b"second".to_vec()).await?;

        assert_eq!(store.read().await?, b"second".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn local_read_of_missing_file_fails() {
        let dir = tempdir().unwrap();
        let store = DatasetStore::local(dir.path().join("absent.csv"));
        assert!(matches!(store.read().await, Err(LoadError::Read(..))));
    }

    fn s3_store(server: &MockServer) -> S3Store {
        S3Store::builder()
            .bucket("kayak-data")
            .region("eu-west-3")
            .endpoint(server.uri())
            .access_key_id("AKIDEXAMPLE")
            .secret_access_key("wJalrXUtnFEMIK7MDENGbPxRfiCYEXAMPLEKEY")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn s3_put_is_signed_and_path_style() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/kayak-data/df_complete.csv"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"5d41402abc4b2a76b9719d911017c592\""),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = DatasetStore::Object(s3_store(&server));
        store.write(b"id,city\n".to_vec()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let authorization = requests[0]
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(authorization.starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));
        assert!(authorization.contains("/eu-west-3/s3/aws4_request"));
        assert_eq!(requests[0].body, b"id,city\n".to_vec());
    }

    #[tokio::test]
    async fn s3_get_reads_object_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/kayak-data/df_complete.csv"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"5d41402abc4b2a76b9719d911017c592\"")
                    .insert_header("Last-Modified", "Fri, 16 Oct 2026 08:00:00 GMT")
                    .set_body_string("id,city\n"),
            )
            .mount(&server)
            .await;

        let store = DatasetStore::Object(s3_store(&server));
        assert_eq!(store.read().await.unwrap(), b"id,city\n".to_vec());
        assert_eq!(store.to_string(), "s3://kayak-data/df_complete.csv");
    }

    #[tokio::test]
    async fn s3_missing_object_is_a_load_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = DatasetStore::Object(s3_store(&server)).read().await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::ObjectStore {
                source: object_store::Error::NotFound { .. },
                ..
            }
        ));
    }

    #[test]
    fn debug_output_hides_credentials() {
        let store = S3Store::builder()
            .region("eu-west-3")
            .access_key_id("AKIDEXAMPLE")
            .secret_access_key("wJalrXUtnFEMIK7MDENGbPxRfiCYEXAMPLEKEY")
            .build()
            .unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("s3://kayak-project-garp/df_complete.csv"));
        assert!(!debug.contains("EXAMPLEKEY"));
    }
}
