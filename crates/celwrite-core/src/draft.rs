//! Per-question draft persistence.
//!
//! Stores must never surface a failure to the session: a write that cannot
//! be carried out is logged and dropped, and a read that fails behaves like
//! "no draft".

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

/// Prefix of every draft key.
pub const DRAFT_KEY_PREFIX: &str = "celwrite_draft_";

/// Storage key for the draft of `question_id`.
pub fn draft_key(question_id: &str) -> String {
    format!("{DRAFT_KEY_PREFIX}{question_id}")
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Overwrite the draft for `question_id`. Returns without waiting for
    /// the write to land.
    fn save(&self, question_id: &str, text: &str);

    /// The last saved text for `question_id`, if any.
    async fn load(&self, question_id: &str) -> Option<String>;
}

/// Process-local store; also the fallback when no database is available.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<String, String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.drafts.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    fn save(&self, question_id: &str, text: &str) {
        match self.drafts.lock() {
            Ok(mut drafts) => {
                drafts.insert(draft_key(question_id), text.to_string());
            }
            Err(_) => warn!(question_id, "draft store lock poisoned; draft not saved"),
        }
    }

    async fn load(&self, question_id: &str) -> Option<String> {
        self.drafts
            .lock()
            .ok()
            .and_then(|d| d.get(&draft_key(question_id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format() {
        assert_eq!(draft_key("t1-1"), "celwrite_draft_t1-1");
    }

    #[tokio::test]
    async fn save_overwrites_and_load_reads_back() {
        let store = MemoryDraftStore::new();
        assert_eq!(store.load("q").await, None);

        store.save("q", "first");
        store.save("q", "second");
        assert_eq!(store.load("q").await.as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn empty_text_is_a_present_draft() {
        let store = MemoryDraftStore::new();
        store.save("q", "");
        assert_eq!(store.load("q").await, Some(String::new()));
    }

    #[tokio::test]
    async fn drafts_are_keyed_per_question() {
        let store = MemoryDraftStore::new();
        store.save("a", "alpha");
        store.save("b", "beta");
        assert_eq!(store.load("a").await.as_deref(), Some("alpha"));
        assert_eq!(store.load("b").await.as_deref(), Some("beta"));
    }
}
