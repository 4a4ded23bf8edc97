//! Shared utility functions used across multiple modules.

use std::sync::atomic::{AtomicI64, Ordering};

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Process-wide millisecond clock for modification stamps.
///
/// Follows wall-clock time but never hands out a value less than or equal to
/// the previous one, so "changed since" ordering holds even for saves that
/// land within the same millisecond.
pub struct Clock;

impl Clock {
    /// Next modification stamp (Unix ms).
    pub fn now() -> i64 {
        let wall = chrono::Utc::now().timestamp_millis();
        let mut last = LAST_STAMP.load(Ordering::Relaxed);
        loop {
            let next = wall.max(last + 1);
            match LAST_STAMP.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(observed) => last = observed,
            }
        }
    }
}
