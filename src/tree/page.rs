//! Page records and the content-tree lookup contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page type, mirroring the numeric codes stored with each page.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Standard = 1,
    Advanced = 2,
    ExternalLink = 3,
    Shortcut = 4,
    Mountpoint = 7,
    Link = 199,
    Folder = 254,
    Recycler = 255,
}

impl PageType {
    /// Types that are directly viewable and therefore addressable by path.
    pub const ADDRESSABLE: [PageType; 3] =
        [PageType::Standard, PageType::Advanced, PageType::Shortcut];
}

impl TryFrom<u8> for PageType {
    type Error = TreeError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            1 => Ok(PageType::Standard),
            2 => Ok(PageType::Advanced),
            3 => Ok(PageType::ExternalLink),
            4 => Ok(PageType::Shortcut),
            7 => Ok(PageType::Mountpoint),
            199 => Ok(PageType::Link),
            254 => Ok(PageType::Folder),
            255 => Ok(PageType::Recycler),
            other => Err(TreeError::UnknownPageType(other)),
        }
    }
}

/// A single node in the content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: u64,
    pub parent_id: u64,
    pub page_type: PageType,
    pub title: String,
    #[serde(default)]
    pub nav_title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub alias: String,
    /// Explicit path segment override.
    #[serde(default)]
    pub path_segment: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub deleted: bool,
    /// Visible from (seconds since epoch, 0 = always).
    #[serde(default)]
    pub start_time: u64,
    /// Visible until (seconds since epoch, 0 = forever).
    #[serde(default)]
    pub end_time: u64,
}

impl PageRecord {
    /// Create a visible standard page.
    pub fn new(id: u64, parent_id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            page_type: PageType::Standard,
            title: title.into(),
            nav_title: String::new(),
            subtitle: String::new(),
            alias: String::new(),
            path_segment: String::new(),
            hidden: false,
            deleted: false,
            start_time: 0,
            end_time: 0,
        }
    }

    /// Title fields in the order they are tried when matching a segment.
    pub fn title_fields(&self) -> [&str; 5] {
        [
            &self.path_segment,
            &self.alias,
            &self.subtitle,
            &self.nav_title,
            &self.title,
        ]
    }
}

/// Restricts which pages a lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityFilter {
    /// Reference time for start/end windows (seconds since epoch).
    pub now: u64,
    pub include_hidden: bool,
}

impl VisibilityFilter {
    /// Frontend visibility at the given time.
    pub fn at(now: u64) -> Self {
        Self {
            now,
            include_hidden: false,
        }
    }

    pub fn allows(&self, page: &PageRecord) -> bool {
        if page.deleted {
            return false;
        }
        if page.hidden && !self.include_hidden {
            return false;
        }
        if page.start_time != 0 && page.start_time > self.now {
            return false;
        }
        if page.end_time != 0 && page.end_time <= self.now {
            return false;
        }
        true
    }
}

/// Errors surfaced by a content-tree backend.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("content tree backend failure: {0}")]
    Backend(String),

    #[error("unknown page type: {0}")]
    UnknownPageType(u8),
}

/// Read access to the content tree.
pub trait ContentTree: Send + Sync {
    /// Immediate children of `parent_id`, restricted to `allowed` types and
    /// pages the filter admits, in storage order.
    fn children_of(
        &self,
        parent_id: u64,
        allowed: &[PageType],
        filter: &VisibilityFilter,
    ) -> Result<Vec<PageRecord>, TreeError>;
}
