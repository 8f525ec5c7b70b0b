//! Content tree access.
//!
//! # Data Flow
//! ```text
//! PathResolver (one unresolved segment)
//!     → page.rs (ContentTree::children_of, visibility + type filter)
//!     → slug.rs (normalize each title field)
//!     → first child whose normalized title equals the segment
//! ```
//!
//! # Design Decisions
//! - The tree is an external collaborator; only the trait lives here
//! - memory.rs is the bundled backend (JSON page dump)
//! - Matching is exact string equality after normalization

pub mod memory;
pub mod page;
pub mod slug;

pub use memory::InMemoryTree;
pub use page::{ContentTree, PageRecord, PageType, TreeError, VisibilityFilter};
pub use slug::convert_to_safe_string;
