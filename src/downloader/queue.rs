// URL queue - ordered set of pending downloads, keyed by URL

use super::errors::AppError;
use super::models::QueueEntry;

/// Pending download requests in insertion order. No two entries share a
/// URL; display order is insertion order and is never reordered.
#[derive(Debug, Default)]
pub struct UrlQueue {
    entries: Vec<QueueEntry>,
}

impl UrlQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Rejects duplicates without modifying the queue.
    pub fn add(&mut self, entry: QueueEntry) -> Result<(), AppError> {
        if self.contains(&entry.url) {
            return Err(AppError::DuplicateUrl(entry.url));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove the entry with this URL. No-op when absent.
    pub fn remove(&mut self, url: &str) {
        self.entries.retain(|e| e.url != url);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.iter().any(|e| e.url == url)
    }

    /// Snapshot of the queue in insertion order.
    pub fn snapshot(&self) -> Vec<QueueEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Caller-side input check, run before any metadata probe: trims the
/// input, rejects empty fields and URLs already queued. Returns the
/// trimmed URL to probe.
pub fn validate_new_url(queue: &UrlQueue, raw: &str) -> Result<String, AppError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(AppError::EmptyInput);
    }
    if queue.contains(url) {
        return Err(AppError::DuplicateUrl(url.to_string()));
    }
    Ok(url.to_string())
}
