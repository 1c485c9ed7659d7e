use crate::{s3::limits::MAX_PARTS_PER_UPLOAD, store::CompletedPart};
use std::collections::BTreeMap;

/// Part numbers handed out in stream order and the acknowledgements received so far
#[derive(Debug, Default)]
pub struct Parts {
    counter: u16,
    completed: BTreeMap<u16, CompletedPart>,
}

impl Parts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next part number, starting at 1, `None` once the store limit is reached
    pub fn next_number(&mut self) -> Option<u16> {
        if self.counter >= MAX_PARTS_PER_UPLOAD {
            return None;
        }
        self.counter += 1;
        Some(self.counter)
    }

    /// Numbers handed out so far
    #[must_use]
    pub const fn counter(&self) -> u16 {
        self.counter
    }

    /// Record the `ETag` of a part, returns `false` if the number was already recorded
    pub fn record(&mut self, number: u16, etag: String) -> bool {
        if self.completed.contains_key(&number) {
            return false;
        }
        self.completed.insert(number, CompletedPart { number, etag });
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.completed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Every part handed out has been acknowledged
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed.len() == usize::from(self.counter)
    }

    /// Acknowledged parts in ascending part number
    #[must_use]
    pub fn completed(&self) -> Vec<CompletedPart> {
        let mut parts: Vec<CompletedPart> = self.completed.values().cloned().collect();
        parts.sort_by_key(|part| part.number);
        parts
    }
}
