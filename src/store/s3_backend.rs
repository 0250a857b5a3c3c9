//! S3-compatible backend on `aws-sdk-s3`.
//!
//! The SDK is async. [`S3Store`] owns a current-thread tokio runtime and
//! blocks on one request at a time, so callers see an ordinary synchronous
//! API and requests are strictly sequential. The runtime and client are
//! released when the store is dropped, whichever way the command exits.
//!
//! Credentials, region and endpoint come from the `cloudphotorc` config; the
//! usual AWS environment and profile lookup is not consulted.

use super::backend::{CannedAcl, ObjectStore, StoreError};
use crate::config::Config;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument,
    IndexDocument, WebsiteConfiguration,
};
use tokio::runtime::Runtime;
use tracing::{debug, info, instrument};

/// Name reported by the static credentials provider.
const CREDENTIALS_SOURCE: &str = "cloudphotorc";

pub struct S3Store {
    runtime: Runtime,
    client: Client,
}

/// Collapse any SDK failure into a transport error carrying its full context.
fn transport<E: std::error::Error>(op: &'static str) -> impl FnOnce(E) -> StoreError {
    move |err| StoreError::Transport {
        op,
        message: DisplayErrorContext(err).to_string(),
    }
}

impl S3Store {
    /// Build a client for the endpoint and credentials in `config`.
    pub fn connect(config: &Config) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            CREDENTIALS_SOURCE,
        );
        let sdk_config = runtime.block_on(
            aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .endpoint_url(&config.endpoint_url)
                .credentials_provider(credentials)
                .load(),
        );
        let client = Client::new(&sdk_config);

        info!(
            endpoint = %config.endpoint_url,
            region = %config.region,
            "S3 client initialized"
        );

        Ok(Self { runtime, client })
    }
}

impl ObjectStore for S3Store {
    #[instrument(skip(self))]
    fn list_objects(&self, bucket: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let request = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation_token.take())
                .send();
            let response = self
                .runtime
                .block_on(request)
                .map_err(transport("list_objects"))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(count = keys.len(), "Listed objects");
        Ok(keys)
    }

    #[instrument(skip(self, body), fields(bytes = body.len()))]
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send();
        self.runtime
            .block_on(request)
            .map_err(transport("put_object"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let request = self.client.get_object().bucket(bucket).key(key).send();
        let response = self
            .runtime
            .block_on(request)
            .map_err(transport("get_object"))?;
        let body = self
            .runtime
            .block_on(response.body.collect())
            .map_err(transport("get_object"))?;
        Ok(body.into_bytes().to_vec())
    }

    #[instrument(skip(self))]
    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let request = self.client.delete_object().bucket(bucket).key(key).send();
        self.runtime
            .block_on(request)
            .map_err(transport("delete_object"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let response = self
            .runtime
            .block_on(self.client.list_buckets().send())
            .map_err(transport("list_buckets"))?;
        Ok(response
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    #[instrument(skip(self))]
    fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StoreError> {
        let configuration = CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build();
        let request = self
            .client
            .create_bucket()
            .bucket(bucket)
            .create_bucket_configuration(configuration)
            .send();
        self.runtime
            .block_on(request)
            .map_err(transport("create_bucket"))?;
        info!(bucket, region, "Bucket created");
        Ok(())
    }

    #[instrument(skip(self))]
    fn put_bucket_acl(&self, bucket: &str, acl: CannedAcl) -> Result<(), StoreError> {
        let canned = match acl {
            CannedAcl::Private => BucketCannedAcl::Private,
            CannedAcl::PublicRead => BucketCannedAcl::PublicRead,
        };
        let request = self.client.put_bucket_acl().bucket(bucket).acl(canned).send();
        self.runtime
            .block_on(request)
            .map_err(transport("put_bucket_acl"))?;
        debug!(acl = acl.as_str(), "Bucket ACL set");
        Ok(())
    }

    #[instrument(skip(self))]
    fn put_bucket_website(
        &self,
        bucket: &str,
        index: &str,
        error: &str,
    ) -> Result<(), StoreError> {
        let index_document = IndexDocument::builder()
            .suffix(index)
            .build()
            .map_err(transport("put_bucket_website"))?;
        let error_document = ErrorDocument::builder()
            .key(error)
            .build()
            .map_err(transport("put_bucket_website"))?;
        let website = WebsiteConfiguration::builder()
            .index_document(index_document)
            .error_document(error_document)
            .build();

        let request = self
            .client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(website)
            .send();
        self.runtime
            .block_on(request)
            .map_err(transport("put_bucket_website"))?;
        Ok(())
    }
}
