use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A token value after masking. The wildcard is its own variant so that
/// equality checks and template rendering never compare against the literal
/// `"<*>"` string.
#[derive(Debug, Clone)]
pub enum TokenValue {
    Wildcard,
    Text(Arc<str>),
}

pub const WILDCARD: &str = "<*>";

impl TokenValue {
    pub fn as_str(&self) -> &str {
        match self {
            TokenValue::Wildcard => WILDCARD,
            TokenValue::Text(s) => s,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, TokenValue::Wildcard)
    }
}

impl PartialEq for TokenValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TokenValue::Wildcard, TokenValue::Wildcard) => true,
            // Interned values usually share the allocation, so the pointer
            // check short-circuits the content comparison.
            (TokenValue::Text(a), TokenValue::Text(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl Eq for TokenValue {}

impl Hash for TokenValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            TokenValue::Wildcard => state.write_u8(0),
            TokenValue::Text(s) => {
                state.write_u8(1);
                s.hash(state);
            }
        }
    }
}

impl Ord for TokenValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (TokenValue::Wildcard, TokenValue::Wildcard) => Ordering::Equal,
            (TokenValue::Wildcard, TokenValue::Text(_)) => Ordering::Less,
            (TokenValue::Text(_), TokenValue::Wildcard) => Ordering::Greater,
            (TokenValue::Text(a), TokenValue::Text(b)) => a.as_ref().cmp(b.as_ref()),
        }
    }
}

impl PartialOrd for TokenValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One word of a log line with its column index and the global frequency of
/// its pre-masking surface form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub value: TokenValue,
    pub position: usize,
    pub frequency: usize,
}

/// A log line after preprocessing. `id` equals the input-order index of the
/// line within the batch.
#[derive(Debug, Clone)]
pub struct LogMessage {
    pub id: usize,
    pub content: String,
    pub words: Vec<Word>,
}

/// The subset of a log's words sharing one frequency level.
#[derive(Debug, Clone)]
pub struct WordCombination {
    pub frequency: usize,
    pub words: Vec<Word>,
}

/// The Longest Common Pattern selected for a group: the root of its
/// bidirectional tree.
#[derive(Debug, Clone)]
pub struct LogPattern {
    pub frequency: usize,
    pub words: Vec<Word>,
}

/// Group identity: logs land in the same group iff they agree on token
/// count and LCP.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternKey {
    pub token_count: usize,
    pub frequency: usize,
    pub words: Vec<(usize, TokenValue)>,
}

impl PatternKey {
    pub fn new(token_count: usize, combo: &WordCombination) -> Self {
        PatternKey {
            token_count,
            frequency: combo.frequency,
            words: combo
                .words
                .iter()
                .map(|w| (w.position, w.value.clone()))
                .collect(),
        }
    }
}

/// All logs sharing one pattern key. Logs are stored as batch indices; a
/// log's id doubles as its index into the preprocessed batch.
#[derive(Debug, Clone)]
pub struct LogGroup {
    pub pattern: LogPattern,
    pub logs: Vec<usize>,
}

/// A node of the bidirectional tree. `position` is `None` only for the
/// synthetic child-direction root.
#[derive(Debug, Clone)]
pub struct Node {
    pub position: Option<usize>,
    pub value: TokenValue,
    pub is_variable: bool,
    pub children: BTreeMap<TokenValue, Node>,
    pub logs: Vec<usize>,
    /// Parent-column resolutions local to this subgroup, recorded by
    /// iterative parent reclassification. Takes precedence over the
    /// group-level parent node at the same position.
    pub parent_overrides: BTreeMap<usize, TokenValue>,
}

impl Node {
    pub fn root(logs: Vec<usize>) -> Self {
        Node {
            position: None,
            value: TokenValue::Wildcard,
            is_variable: false,
            children: BTreeMap::new(),
            logs,
            parent_overrides: BTreeMap::new(),
        }
    }

    pub fn constant(position: usize, value: TokenValue, logs: Vec<usize>) -> Self {
        Node {
            position: Some(position),
            value,
            is_variable: false,
            children: BTreeMap::new(),
            logs,
            parent_overrides: BTreeMap::new(),
        }
    }

    pub fn variable(position: usize, logs: Vec<usize>) -> Self {
        Node {
            position: Some(position),
            value: TokenValue::Wildcard,
            is_variable: true,
            children: BTreeMap::new(),
            logs,
            parent_overrides: BTreeMap::new(),
        }
    }
}

/// Bidirectional parallel tree for one log group. Lives for the duration of
/// one group's processing.
#[derive(Debug, Clone)]
pub struct BidirectionalTree {
    pub root_pattern: LogPattern,
    pub parent_direction: BTreeMap<usize, Node>,
    pub parent_columns: Vec<usize>,
    pub child_root: Node,
}

/// Final mining output: one entry per distinct template string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub template: String,
    pub count: usize,
    pub log_ids: Vec<usize>,
}
