//! In-process object store.
//!
//! Buckets are plain maps held behind a `Mutex`. Every call is recorded so
//! tests can assert on the exact sequence of storage operations, and any
//! single call can be made to fail to exercise the abort paths. It is
//! exported for the integration tests in `tests/`.

use super::backend::{CannedAcl, ObjectStore, StoreError};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One recorded call against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListObjects,
    Put(String),
    Get(String),
    Delete(String),
    ListBuckets,
    CreateBucket(String),
    PutBucketAcl(CannedAcl),
    PutBucketWebsite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsiteSettings {
    pub index: String,
    pub error: String,
}

#[derive(Default)]
struct State {
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    acls: BTreeMap<String, CannedAcl>,
    websites: BTreeMap<String, WebsiteSettings>,
    calls: Vec<StoreCall>,
    failing: Vec<StoreCall>,
    reverse_listing: bool,
}

impl State {
    /// Record `call` and fail it if it was registered with `fail_on`.
    fn record(&mut self, op: &'static str, call: StoreCall) -> Result<(), StoreError> {
        let fails = self.failing.contains(&call);
        self.calls.push(call);
        if fails {
            return Err(StoreError::Transport {
                op,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with one empty bucket.
    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::new();
        store.state().buckets.insert(bucket.to_string(), BTreeMap::new());
        store
    }

    /// Return listings in descending key order instead of ascending.
    pub fn with_reversed_listing(self) -> Self {
        self.state().reverse_listing = true;
        self
    }

    /// Put an object directly, without recording a call.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.state().buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                body: body.into(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    /// Make every future call equal to `call` fail with a transport error.
    pub fn fail_on(&self, call: StoreCall) {
        self.state().failing.push(call);
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.state().buckets.get(bucket)?.get(key).cloned()
    }

    /// All keys in a bucket, sorted.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.state()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn acl(&self, bucket: &str) -> Option<CannedAcl> {
        self.state().acls.get(bucket).copied()
    }

    pub fn website(&self, bucket: &str) -> Option<WebsiteSettings> {
        self.state().websites.get(bucket).cloned()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn no_bucket(bucket: &str) -> StoreError {
    StoreError::NotFound(format!("bucket {bucket}"))
}

impl ObjectStore for MemoryStore {
    fn list_objects(&self, bucket: &str) -> Result<Vec<String>, StoreError> {
        let mut state = self.state();
        state.record("list_objects", StoreCall::ListObjects)?;
        let objects = state.buckets.get(bucket).ok_or_else(|| no_bucket(bucket))?;
        let mut keys: Vec<String> = objects.keys().cloned().collect();
        if state.reverse_listing {
            keys.reverse();
        }
        Ok(keys)
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        state.record("put_object", StoreCall::Put(key.to_string()))?;
        let objects = state.buckets.get_mut(bucket).ok_or_else(|| no_bucket(bucket))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let mut state = self.state();
        state.record("get_object", StoreCall::Get(key.to_string()))?;
        state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_bucket(bucket))?
            .get(key)
            .map(|object| object.body.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        state.record("delete_object", StoreCall::Delete(key.to_string()))?;
        // S3 deletes are idempotent: a missing key is not an error.
        state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_bucket(bucket))?
            .remove(key);
        Ok(())
    }

    fn list_buckets(&self) -> Result<Vec<String>, StoreError> {
        let mut state = self.state();
        state.record("list_buckets", StoreCall::ListBuckets)?;
        Ok(state.buckets.keys().cloned().collect())
    }

    fn create_bucket(&self, bucket: &str, _region: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        state.record("create_bucket", StoreCall::CreateBucket(bucket.to_string()))?;
        state.buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }

    fn put_bucket_acl(&self, bucket: &str, acl: CannedAcl) -> Result<(), StoreError> {
        let mut state = self.state();
        state.record("put_bucket_acl", StoreCall::PutBucketAcl(acl))?;
        state.acls.insert(bucket.to_string(), acl);
        Ok(())
    }

    fn put_bucket_website(
        &self,
        bucket: &str,
        index: &str,
        error: &str,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        state.record("put_bucket_website", StoreCall::PutBucketWebsite)?;
        state.websites.insert(
            bucket.to_string(),
            WebsiteSettings {
                index: index.to_string(),
                error: error.to_string(),
            },
        );
        Ok(())
    }
}
