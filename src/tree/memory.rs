//! In-memory content tree.
//!
//! Backs the service binary (loaded from a JSON page dump) and the tests.

use dashmap::DashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::tree::page::{ContentTree, PageRecord, PageType, TreeError, VisibilityFilter};

/// Pages grouped by parent id, each group kept in storage order.
#[derive(Clone, Default)]
pub struct InMemoryTree {
    children: Arc<DashMap<u64, Vec<PageRecord>>>,
}

impl InMemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a flat page list; order within a parent is kept.
    pub fn from_pages(pages: impl IntoIterator<Item = PageRecord>) -> Self {
        let tree = Self::new();
        for page in pages {
            tree.insert(page);
        }
        tree
    }

    /// Load a JSON array of pages.
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let pages: Vec<PageRecord> = serde_json::from_reader(BufReader::new(file))?;
        let tree = Self::from_pages(pages);
        tracing::info!(pages = tree.len(), path = %path.display(), "Loaded content tree");
        Ok(tree)
    }

    /// Append a page after its existing siblings.
    pub fn insert(&self, page: PageRecord) {
        self.children.entry(page.parent_id).or_default().push(page);
    }

    /// Total number of pages.
    pub fn len(&self) -> usize {
        self.children.iter().map(|r| r.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentTree for InMemoryTree {
    fn children_of(
        &self,
        parent_id: u64,
        allowed: &[PageType],
        filter: &VisibilityFilter,
    ) -> Result<Vec<PageRecord>, TreeError> {
        let Some(siblings) = self.children.get(&parent_id) else {
            return Ok(Vec::new());
        };
        Ok(siblings
            .iter()
            .filter(|p| allowed.contains(&p.page_type) && filter.allows(p))
            .cloned()
            .collect())
    }
}
