//! Offset/limit pagination window

use crate::error::{AppError, AppResult};

/// Zero-based `from` offset and positive `size` limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    from: i64,
    size: i64,
}

impl Page {
    pub fn new(from: i64, size: i64) -> AppResult<Self> {
        if from < 0 {
            return Err(AppError::Validation(format!("from must not be negative, got {}", from)));
        }
        if size <= 0 {
            return Err(AppError::Validation(format!("size must be positive, got {}", size)));
        }
        Ok(Self { from, size })
    }

    pub fn offset(&self) -> i64 {
        self.from
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    /// Apply the window to an already ordered sequence
    pub fn slice<T>(&self, ordered: impl IntoIterator<Item = T>) -> Vec<T> {
        ordered
            .into_iter()
            .skip(self.from as usize)
            .take(self.size as usize)
            .collect()
    }
}
