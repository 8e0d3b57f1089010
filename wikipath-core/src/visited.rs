use parking_lot::Mutex;
use std::collections::HashSet;

/// Per-search set of pages already enqueued or expanded, shared by the
/// expansion tasks of one search.
#[derive(Debug, Default)]
pub struct VisitedSet {
    pages: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `page` was not present before.
    pub fn insert(&self, page: &str) -> bool {
        let mut pages = self.pages.lock();
        if pages.contains(page) {
            return false;
        }
        pages.insert(page.to_string())
    }

    pub fn contains(&self, page: &str) -> bool {
        self.pages.lock().contains(page)
    }

    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.lock().is_empty()
    }
}
