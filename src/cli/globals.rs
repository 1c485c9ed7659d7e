use crate::s3::limits;
use std::path::PathBuf;

// Define the global arguments
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// parts in flight per upload
    pub max_requests: usize,
    pub buf_size: usize,
    /// attachment record database
    pub db_path: PathBuf,
    pub quiet: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            max_requests: 1,
            buf_size: limits::MIN_PART_SIZE_BYTES,
            db_path,
            quiet: false,
        }
    }

    pub fn set_max_requests(&mut self, max_requests: u8) {
        self.max_requests = usize::from(max_requests.max(1));
    }

    /// Clamped into the part sizes the store accepts
    pub fn set_buf_size(&mut self, buf_size: usize) {
        self.buf_size = limits::part_size(buf_size);
    }
}
