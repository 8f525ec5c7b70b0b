//! Parameter sets embedded in the path.
//!
//! A parameter set starts with a reserved segment (the set name) followed by
//! one segment per declared variable:
//!
//! ```text
//! news/article/42     (with set "article" = ["tx_news[news]"])
//!      ^^^^^^^ ^^
//!      name    value → tx_news[news]=42
//! ```
//!
//! Several sets may follow each other. The resolver stops its tree walk at
//! the first segment naming a set and hands the rest over here.

use percent_encoding::percent_decode_str;
use std::collections::{BTreeMap, VecDeque};

use crate::config::ParameterSetConfig;
use crate::decoder::query::insert_param;
use crate::decoder::types::Parameters;

/// Turns the unresolved tail of a path into parameters.
pub trait ParameterDecoder: Send + Sync {
    /// Whether `segment` opens a parameter set.
    fn is_parameter_set(&self, segment: &str) -> bool;

    /// Consume every leading parameter set from `segments`.
    ///
    /// Segments that belong to no set are left in place for the caller to
    /// report.
    fn decode(&self, segments: &mut VecDeque<String>) -> Parameters;
}

/// Positional parameter sets declared in configuration.
#[derive(Debug, Clone, Default)]
pub struct ParameterSets {
    sets: BTreeMap<String, Vec<String>>,
}

impl ParameterSets {
    pub fn new(sets: BTreeMap<String, Vec<String>>) -> Self {
        Self { sets }
    }

    pub fn from_config(config: &BTreeMap<String, ParameterSetConfig>) -> Self {
        Self::new(
            config
                .iter()
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, set)| (name.clone(), set.variables.clone()))
                .collect(),
        )
    }
}

impl ParameterDecoder for ParameterSets {
    fn is_parameter_set(&self, segment: &str) -> bool {
        self.sets.contains_key(segment)
    }

    fn decode(&self, segments: &mut VecDeque<String>) -> Parameters {
        let mut params = Parameters::new();

        while let Some(variables) = segments.front().and_then(|s| self.sets.get(s)) {
            let name = segments.pop_front().unwrap_or_default();
            for variable in variables {
                let Some(raw) = segments.pop_front() else {
                    tracing::debug!(set = %name, variable = %variable, "Parameter set truncated");
                    break;
                };
                let value = percent_decode_str(&raw).decode_utf8_lossy().into_owned();
                insert_param(&mut params, variable, value);
            }
        }
        params
    }
}
