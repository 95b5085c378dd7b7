use crate::config::Config;
use crate::postprocess::VariableDetector;
use crate::types::{BidirectionalTree, Node, ParseResult, TokenValue, WILDCARD};
use itertools::Itertools;
use std::collections::BTreeMap;

/// Materializes one `ParseResult` per leaf of the child-direction tree. A
/// leaf's effective template is `base ⊕ path ⊕ parent_overrides(path)`:
/// the path wins over the base, and the overrides recorded during parent
/// reclassification win over both.
pub struct TemplateExtractor {
    detector: VariableDetector,
}

impl TemplateExtractor {
    pub fn new(config: &Config) -> Self {
        TemplateExtractor {
            detector: VariableDetector::from_config(config),
        }
    }

    pub fn extract(&self, tree: &BidirectionalTree) -> Vec<ParseResult> {
        let mut base: BTreeMap<usize, TokenValue> = BTreeMap::new();
        for (&pos, node) in &tree.parent_direction {
            let value = if node.is_variable {
                TokenValue::Wildcard
            } else {
                node.value.clone()
            };
            base.insert(pos, value);
        }
        for word in &tree.root_pattern.words {
            base.insert(word.position, word.value.clone());
        }

        let mut results = Vec::new();
        self.collect(&tree.child_root, &base, BTreeMap::new(), &mut results);
        results
    }

    fn collect(
        &self,
        node: &Node,
        base: &BTreeMap<usize, TokenValue>,
        mut path: BTreeMap<usize, TokenValue>,
        results: &mut Vec<ParseResult>,
    ) {
        if let Some(pos) = node.position {
            let value = if node.is_variable {
                TokenValue::Wildcard
            } else {
                node.value.clone()
            };
            path.insert(pos, value);
        }
        for (&pos, value) in &node.parent_overrides {
            path.insert(pos, value.clone());
        }

        if node.children.is_empty() {
            if node.logs.is_empty() {
                return;
            }
            results.push(ParseResult {
                template: self.render(base, &path),
                count: node.logs.len(),
                log_ids: node.logs.clone(),
            });
            return;
        }

        for child in node.children.values() {
            self.collect(child, base, path.clone(), results);
        }
    }

    /// Renders the merged template as a dense space-joined token array.
    /// Positions nothing claimed become wildcards; surviving constants are
    /// re-examined by the variable detector.
    fn render(&self, base: &BTreeMap<usize, TokenValue>, path: &BTreeMap<usize, TokenValue>) -> String {
        let mut merged: BTreeMap<usize, &TokenValue> = BTreeMap::new();
        for (&pos, value) in base {
            merged.insert(pos, value);
        }
        for (&pos, value) in path {
            merged.insert(pos, value);
        }

        let max_pos = merged.keys().next_back().copied().unwrap_or(0);
        (0..=max_pos)
            .map(|pos| match merged.get(&pos) {
                Some(value) if !value.is_wildcard() && self.detector.is_variable(value.as_str()) => {
                    WILDCARD
                }
                Some(value) => value.as_str(),
                None => WILDCARD,
            })
            .join(" ")
    }
}
