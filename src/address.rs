//! Dataset addresses: the hierarchy levels encoded in the path of the viewer URL.
//!
//! A path such as `/zika/genome/` is split into segments and every segment is
//! matched against an [`AddressSchema`]. Matching is by value, not by position,
//! so `/genome/zika/` names the same dataset and yields the same canonical key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Joins level values into the dataset fetch key.
pub const KEY_SEPARATOR: &str = "_";

/// Values a level accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Accepts {
    /// Free-form: any segment not claimed by an enumerated level.
    #[default]
    Any,
    OneOf(Vec<String>),
}

impl Accepts {
    /// True only when the value is explicitly enumerated.
    pub fn lists(&self, value: &str) -> bool {
        match self {
            Accepts::Any => false,
            Accepts::OneOf(values) => values.iter().any(|v| v == value),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Accepts::Any)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub accepts: Accepts,
}

impl Level {
    pub fn new(name: impl Into<String>, required: bool, accepts: Accepts) -> Self {
        Self {
            name: name.into(),
            required,
            accepts,
        }
    }

    pub fn one_of(name: impl Into<String>, required: bool, values: &[&str]) -> Self {
        Self::new(
            name,
            required,
            Accepts::OneOf(values.iter().map(ToString::to_string).collect()),
        )
    }
}

/// The recognized address levels and the order their values take in the
/// canonical key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSchema {
    pub levels: Vec<Level>,
    /// Level names in canonical key order. Defaults to ascending level name.
    #[serde(default)]
    pub key_order: Option<Vec<String>>,
}

impl Default for AddressSchema {
    fn default() -> Self {
        Self {
            levels: vec![
                Level::one_of("virus", true, &["zika", "ebola", "dengue"]),
                Level::one_of("segment", false, &["genome"]),
                Level::one_of("resolution", false, &["1y", "3y", "6y", "12y"]),
            ],
            key_order: None,
        }
    }
}

impl AddressSchema {
    pub fn new(levels: Vec<Level>) -> Self {
        Self {
            levels,
            key_order: None,
        }
    }

    pub fn with_key_order(mut self, order: &[&str]) -> Self {
        self.key_order = Some(order.iter().map(ToString::to_string).collect());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.levels.is_empty() {
            return Err(ConfigError::EmptySchema);
        }
        let mut seen = Vec::with_capacity(self.levels.len());
        for level in &self.levels {
            if seen.contains(&level.name.as_str()) {
                return Err(ConfigError::DuplicateLevel(level.name.clone()));
            }
            if matches!(&level.accepts, Accepts::OneOf(values) if values.is_empty()) {
                return Err(ConfigError::EmptyEnumeration(level.name.clone()));
            }
            seen.push(level.name.as_str());
        }
        if let Some(order) = &self.key_order {
            let mut expected = seen.clone();
            expected.sort_unstable();
            let mut given: Vec<&str> = order.iter().map(String::as_str).collect();
            given.sort_unstable();
            if given != expected {
                return Err(ConfigError::KeyOrder(order.join(",")));
            }
        }
        Ok(())
    }

    /// Level names in canonical key order.
    pub fn key_order(&self) -> Vec<&str> {
        match &self.key_order {
            Some(order) => order.iter().map(String::as_str).collect(),
            None => {
                let mut names: Vec<&str> = self.levels.iter().map(|l| l.name.as_str()).collect();
                names.sort_unstable();
                names
            }
        }
    }

    fn rank(&self, name: &str) -> usize {
        self.key_order()
            .iter()
            .position(|n| *n == name)
            .unwrap_or(usize::MAX)
    }
}

/// Why an address cannot be trusted to name a single dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressIssue {
    /// A segment fits more than one level.
    Ambiguous { segment: String, levels: Vec<String> },
    /// Several segments claim the same level.
    Contradictory { level: String, values: Vec<String> },
}

/// Structured decomposition of a viewer path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetAddress {
    /// Matched `(level, value)` pairs in path order.
    pub levels: Vec<(String, String)>,
    /// Matched values joined in canonical level order.
    pub canonical_key: String,
    /// Segments no level recognized, joined with `/`.
    pub raw_suffix: String,
    pub is_complete: bool,
    pub is_valid: bool,
    pub issues: Vec<AddressIssue>,
    segments: Vec<String>,
}

impl DatasetAddress {
    pub fn value(&self, level: &str) -> Option<&str> {
        self.levels
            .iter()
            .find(|(name, _)| name == level)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_recognized_levels(&self) -> bool {
        !self.levels.is_empty()
    }

    pub fn is_malformed(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Every segment of the original path with a leading and trailing slash.
    pub fn normalized_path(&self) -> String {
        join_segments(&self.segments)
    }
}

/// Collapses empty segments and adds leading and trailing slashes:
/// `zika//s1` becomes `/zika/s1/`, the empty path becomes `/`.
pub fn normalize_path(pathname: &str) -> String {
    let segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
    join_segments(&segments)
}

fn join_segments<S: AsRef<str>>(segments: &[S]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::from("/");
    for segment in segments {
        out.push_str(segment.as_ref());
        out.push('/');
    }
    out
}

/// Parses a pathname against the schema. Pure: no I/O, same input same output.
pub fn parse(schema: &AddressSchema, pathname: &str) -> DatasetAddress {
    let segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
    let wildcards: Vec<usize> = schema
        .levels
        .iter()
        .enumerate()
        .filter(|(_, l)| l.accepts.is_wildcard())
        .map(|(i, _)| i)
        .collect();

    // level index -> claiming segments, in path order
    let mut claims: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    let mut order: Vec<usize> = Vec::new();
    let mut issues = Vec::new();
    let mut unrecognized = Vec::new();

    for segment in &segments {
        let explicit: Vec<usize> = schema
            .levels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.accepts.lists(segment))
            .map(|(i, _)| i)
            .collect();
        let candidates = if explicit.is_empty() {
            &wildcards
        } else {
            &explicit
        };

        match candidates.as_slice() {
            [] => unrecognized.push(*segment),
            [only] => {
                let claimed = claims.entry(*only).or_default();
                if claimed.is_empty() {
                    order.push(*only);
                }
                claimed.push(*segment);
            }
            many => issues.push(AddressIssue::Ambiguous {
                segment: (*segment).to_string(),
                levels: many.iter().map(|i| schema.levels[*i].name.clone()).collect(),
            }),
        }
    }

    for (idx, values) in &claims {
        if values.len() > 1 {
            issues.push(AddressIssue::Contradictory {
                level: schema.levels[*idx].name.clone(),
                values: values.iter().map(ToString::to_string).collect(),
            });
        }
    }

    let levels: Vec<(String, String)> = order
        .iter()
        .map(|idx| {
            (
                schema.levels[*idx].name.clone(),
                claims[idx][0].to_string(),
            )
        })
        .collect();

    let is_complete = schema
        .levels
        .iter()
        .enumerate()
        .all(|(i, l)| !l.required || claims.contains_key(&i));

    let mut ranked: Vec<&(String, String)> = levels.iter().collect();
    ranked.sort_by_key(|(name, _)| schema.rank(name));
    let canonical_key = ranked
        .iter()
        .map(|(_, value)| value.as_str())
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR);

    DatasetAddress {
        canonical_key,
        raw_suffix: unrecognized.join("/"),
        is_complete,
        is_valid: is_complete && issues.is_empty(),
        issues,
        levels,
        segments: segments.iter().map(ToString::to_string).collect(),
    }
}
