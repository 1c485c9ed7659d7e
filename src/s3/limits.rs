//! Multipart upload limits of the store
//!
//! - [S3 Quotas](https://docs.aws.amazon.com/AmazonS3/latest/userguide/qfacts.html)
//! - [Multipart Upload Overview](https://docs.aws.amazon.com/AmazonS3/latest/userguide/mpuoverview.html)

/// Maximum size of a single object, 5 TiB
pub const MAX_OBJECT_SIZE_BYTES: u64 = 5_497_558_138_880;

/// Maximum size of one part, 5 GiB
pub const MAX_PART_SIZE_BYTES: usize = 5_368_709_120;

/// Parts are numbered 1 to 10,000
pub const MAX_PARTS_PER_UPLOAD: u16 = 10_000;

/// Minimum size of every part but the last one, 5 MiB
///
/// This is the part size used by the upload session unless a larger one is requested.
pub const MIN_PART_SIZE_BYTES: usize = 5_242_880;

/// Clamp a requested part size into the range accepted by the store
#[must_use]
pub fn part_size(requested: usize) -> usize {
    requested.clamp(MIN_PART_SIZE_BYTES, MAX_PART_SIZE_BYTES)
}
