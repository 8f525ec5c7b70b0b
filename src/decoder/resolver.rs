//! Path → page resolution.
//!
//! # Responsibilities
//! - Find the longest cached prefix of the path
//! - Walk the content tree for the uncached tail, one segment per lookup
//! - Cache every prefix the walk resolves, as soon as it resolves
//!
//! # Design Decisions
//! - The walk starts at the cached node, or the site root when nothing matched
//! - A tail opening with a parameter set skips the walk entirely
//! - The first segment without a matching child ends the walk; it and the
//!   rest are returned unresolved, never guessed at
//! - Child order decides ties: first match in storage order wins

use std::collections::VecDeque;
use std::sync::Arc;

use crate::cache::store::unix_now;
use crate::cache::PathCache;
use crate::decoder::params::ParameterDecoder;
use crate::decoder::types::DecodeResult;
use crate::observability::metrics;
use crate::tree::{convert_to_safe_string, ContentTree, PageType, VisibilityFilter};

/// Outcome of resolving a segment sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Deepest page reached.
    pub node_id: u64,
    /// Segments no page accounted for, in order.
    pub remaining: VecDeque<String>,
}

/// Resolves speaking path segments to a page id.
#[derive(Clone)]
pub struct PathResolver {
    tree: Arc<dyn ContentTree>,
    path_cache: PathCache,
    root_page_id: u64,
    space_character: char,
}

impl PathResolver {
    pub fn new(
        tree: Arc<dyn ContentTree>,
        path_cache: PathCache,
        root_page_id: u64,
        space_character: char,
    ) -> Self {
        Self {
            tree,
            path_cache,
            root_page_id,
            space_character,
        }
    }

    /// Resolve as much of `segments` as the cache and the tree allow.
    pub fn decode_path(
        &self,
        language_id: u64,
        segments: &[String],
        parameters: &dyn ParameterDecoder,
    ) -> DecodeResult<Resolution> {
        let prefix = self.path_cache.search(language_id, segments)?;
        let mut current = prefix.node_id.unwrap_or(self.root_page_id);
        let mut remaining: VecDeque<String> = prefix.tail(segments).iter().cloned().collect();

        match remaining.front() {
            None => {
                return Ok(Resolution {
                    node_id: current,
                    remaining,
                })
            }
            Some(first) if parameters.is_parameter_set(first) => {
                tracing::trace!(segment = %first, "Tail starts with a parameter set, skipping tree walk");
                return Ok(Resolution {
                    node_id: current,
                    remaining,
                });
            }
            Some(_) => {}
        }

        let filter = VisibilityFilter::at(unix_now());
        let mut processed: Vec<String> = segments[..prefix.matched].to_vec();

        while let Some(segment) = remaining.front() {
            let Some(child) = self.search_pages(current, segment, &filter)? else {
                tracing::debug!(parent = current, segment = %segment, "No page matches segment");
                break;
            };
            current = child;
            if let Some(segment) = remaining.pop_front() {
                processed.push(segment);
            }
            self.path_cache.put(language_id, current, &processed.join("/"))?;
        }

        Ok(Resolution {
            node_id: current,
            remaining,
        })
    }

    /// First visible child of `parent_id` whose normalized title is `segment`.
    fn search_pages(
        &self,
        parent_id: u64,
        segment: &str,
        filter: &VisibilityFilter,
    ) -> DecodeResult<Option<u64>> {
        metrics::record_tree_lookup();
        let children = self
            .tree
            .children_of(parent_id, &PageType::ADDRESSABLE, filter)?;

        Ok(children
            .iter()
            .find(|page| {
                page.title_fields()
                    .iter()
                    .filter(|field| !field.is_empty())
                    .any(|field| convert_to_safe_string(field, self.space_character) == segment)
            })
            .map(|page| page.id))
    }
}
