//! Object-store trait and shared types.
//!
//! The [`ObjectStore`] trait is the only thing the repository and the site
//! publisher know about storage. Every call names its bucket explicitly and
//! reports a plain success or failure: transient and permanent errors are not
//! told apart, and nothing here retries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{op} failed: {message}")]
    Transport { op: &'static str, message: String },
    #[error("no such object: {0}")]
    NotFound(String),
    #[error("cannot start transport runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Predefined bucket access policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedAcl {
    Private,
    PublicRead,
}

impl CannedAcl {
    pub fn as_str(self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
        }
    }
}

/// Operations the album repository needs from a bucket service.
pub trait ObjectStore {
    /// Every key in the bucket, in whatever order the service returns them.
    fn list_objects(&self, bucket: &str) -> Result<Vec<String>, StoreError>;

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError>;

    /// Names of all buckets visible to the credentials.
    fn list_buckets(&self) -> Result<Vec<String>, StoreError>;

    fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StoreError>;

    fn put_bucket_acl(&self, bucket: &str, acl: CannedAcl) -> Result<(), StoreError>;

    /// Serve the bucket as a static website with the given index and error documents.
    fn put_bucket_website(&self, bucket: &str, index: &str, error: &str)
    -> Result<(), StoreError>;
}
