//! Stream attachments into S3 compatible buckets and adopt the objects already there.
//!
//! Uploads go through [`upload::Uploader`]: the object key is locked for the whole session,
//! renamed per the destination naming policy when taken, and the body is regrouped into
//! fixed size parts sent as a multipart upload. [`scan`] lists the objects no attachment
//! record references and [`link::Linker`] turns them into records.

pub mod cli;
pub mod delete;
pub mod destination;
pub mod link;
pub mod lock;
pub mod naming;
pub mod records;
pub mod s3;
pub mod scan;
pub mod store;
pub mod stream;
pub mod upload;
