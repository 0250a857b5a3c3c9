//! Object-store transport.
//!
//! | Operation | S3 call |
//! |---|---|
//! | **list_objects** | `ListObjectsV2`, following continuation tokens |
//! | **put_object / get_object / delete_object** | `PutObject` / `GetObject` / `DeleteObject` |
//! | **list_buckets / create_bucket** | `ListBuckets` / `CreateBucket` |
//! | **put_bucket_acl** | `PutBucketAcl` with a canned ACL |
//! | **put_bucket_website** | `PutBucketWebsite` (index + error documents) |
//!
//! The module is split into:
//! - **Backend**: [`ObjectStore`] trait, [`StoreError`], [`CannedAcl`]
//! - **S3**: [`S3Store`], the production backend on `aws-sdk-s3`
//! - **Memory**: [`MemoryStore`], an in-process bucket used by the tests

pub mod backend;
pub mod memory;
pub mod s3_backend;

pub use backend::{CannedAcl, ObjectStore, StoreError};
pub use memory::{MemoryStore, StoreCall};
pub use s3_backend::S3Store;
