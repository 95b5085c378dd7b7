use crate::config::Config;
use crate::types::{BidirectionalTree, LogGroup, LogMessage, Node, TokenValue};
use ahash::AHashSet;
use std::collections::BTreeMap;

/// Builds the bidirectional parallel tree for one log group: constants
/// above the LCP frequency go to the parent direction, candidate variables
/// below it are split recursively in the child direction.
pub struct TreeBuilder<'a> {
    config: &'a Config,
    logs: &'a [LogMessage],
}

impl<'a> TreeBuilder<'a> {
    pub fn new(config: &'a Config, logs: &'a [LogMessage]) -> Self {
        TreeBuilder { config, logs }
    }

    pub fn build(&self, group: &LogGroup) -> BidirectionalTree {
        let root_positions: AHashSet<usize> =
            group.pattern.words.iter().map(|w| w.position).collect();
        let token_count = group
            .logs
            .first()
            .map(|&id| self.logs[id].words.len())
            .unwrap_or(0);

        // A column's representative frequency is the maximum over the group.
        let mut parent_columns = Vec::new();
        let mut child_columns = Vec::new();
        for pos in 0..token_count {
            if root_positions.contains(&pos) {
                continue;
            }
            let max_freq = group
                .logs
                .iter()
                .map(|&id| self.logs[id].words[pos].frequency)
                .max()
                .unwrap_or(0);
            if max_freq > group.pattern.frequency {
                parent_columns.push(pos);
            } else {
                child_columns.push(pos);
            }
        }

        let parent_direction = self.build_parent_direction(&group.logs, &parent_columns);

        let mut child_root = Node::root(group.logs.clone());
        self.split_child_direction(&parent_columns, &mut child_root, &group.logs, child_columns);

        BidirectionalTree {
            root_pattern: group.pattern.clone(),
            parent_direction,
            parent_columns,
            child_root,
        }
    }

    /// Initial parent-direction pass: a column with a single distinct value
    /// across the whole group is a constant, anything else a variable.
    fn build_parent_direction(
        &self,
        group_logs: &[usize],
        parent_columns: &[usize],
    ) -> BTreeMap<usize, Node> {
        let mut parent_direction = BTreeMap::new();
        for &pos in parent_columns {
            let node = match self.resolve_column(group_logs, pos) {
                Some(value) => Node::constant(pos, value, group_logs.to_vec()),
                None => Node::variable(pos, group_logs.to_vec()),
            };
            parent_direction.insert(pos, node);
        }
        parent_direction
    }

    /// `Some(value)` when the column holds exactly one distinct value over
    /// `logs`, `None` when it varies.
    fn resolve_column(&self, logs: &[usize], pos: usize) -> Option<TokenValue> {
        let mut first: Option<&TokenValue> = None;
        for &id in logs {
            let value = &self.logs[id].words[pos].value;
            match first {
                None => first = Some(value),
                Some(seen) if seen != value => return None,
                _ => {}
            }
        }
        first.cloned()
    }

    /// Recursive child-direction construction. Columns are processed most
    /// constrained first; a column whose distinct-value count exceeds the
    /// branch threshold collapses to a single wildcard edge, otherwise each
    /// value gets its own constant branch and the group splits.
    fn split_child_direction(
        &self,
        parent_columns: &[usize],
        node: &mut Node,
        current_logs: &[usize],
        mut columns: Vec<usize>,
    ) {
        if columns.is_empty() {
            return;
        }

        // Stable sort keeps ties in ascending column order, which makes
        // parallel and sequential runs produce identical trees.
        columns.sort_by_key(|&pos| self.count_unique_in_column(current_logs, pos));
        let pos = columns[0];
        let remaining = columns[1..].to_vec();

        let mut partitions: BTreeMap<TokenValue, Vec<usize>> = BTreeMap::new();
        for &id in current_logs {
            partitions
                .entry(self.logs[id].words[pos].value.clone())
                .or_default()
                .push(id);
        }

        let unique_count = partitions.len();
        let threshold = self.branch_threshold(unique_count);

        if unique_count > threshold {
            // Too many distinct values: the column is a variable here.
            let mut child = Node::variable(pos, current_logs.to_vec());
            self.split_child_direction(parent_columns, &mut child, current_logs, remaining);
            node.children.insert(TokenValue::Wildcard, child);
        } else {
            for (value, sub_logs) in partitions {
                let mut child = Node::constant(pos, value.clone(), sub_logs.clone());
                // Parent columns that looked variable over the whole group
                // may be constant within this subgroup; re-resolve them.
                self.reclassify_parent_columns(parent_columns, &mut child, &sub_logs);
                self.split_child_direction(parent_columns, &mut child, &sub_logs, remaining.clone());
                node.children.insert(value, child);
            }
        }
    }

    /// Iterative parent reclassification: records, per subgroup, how each
    /// parent column resolves. The override wins over the group-level
    /// parent node during template extraction.
    fn reclassify_parent_columns(&self, parent_columns: &[usize], node: &mut Node, sub_logs: &[usize]) {
        for &pos in parent_columns {
            let value = match self.resolve_column(sub_logs, pos) {
                Some(value) => value,
                None => TokenValue::Wildcard,
            };
            node.parent_overrides.insert(pos, value);
        }
    }

    fn count_unique_in_column(&self, logs: &[usize], pos: usize) -> usize {
        let mut seen: AHashSet<&TokenValue> = AHashSet::new();
        for &id in logs {
            seen.insert(&self.logs[id].words[pos].value);
        }
        seen.len()
    }

    /// Branch threshold for a column with `unique_count` distinct values.
    /// The comparison used by the caller is strictly greater-than; the
    /// dynamic variants are clamped to `[2, 10]`.
    fn branch_threshold(&self, unique_count: usize) -> usize {
        if !self.config.use_dynamic_threshold || unique_count == 0 {
            return self.config.child_branch_threshold;
        }
        let threshold = if self.config.use_statistical_threshold {
            self.statistical_threshold(unique_count)
        } else {
            ((unique_count as f64).ln() * self.config.dynamic_threshold_factor) as usize
        };
        threshold.clamp(2, 10)
    }

    /// Statistical threshold: conservative for small value sets, square-root
    /// scaled for large ones, sigmoid-smoothed in between.
    fn statistical_threshold(&self, unique_count: usize) -> usize {
        let factor = self.config.dynamic_threshold_factor;
        let n = unique_count as f64;
        let mut threshold = n.ln() * factor;
        if unique_count < 10 {
            threshold *= 1.5;
        }
        if unique_count > 100 {
            threshold = n.sqrt() * factor * 0.7;
        }
        if unique_count > 20 && unique_count < 100 {
            let x = (n - 50.0) / 30.0;
            let sigmoid = 1.0 / (1.0 + (-x).exp());
            threshold *= 0.7 + 0.6 * sigmoid;
        }
        threshold as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder_config(dynamic: bool, statistical: bool) -> Config {
        Config {
            use_dynamic_threshold: dynamic,
            use_statistical_threshold: statistical,
            ..Config::default()
        }
    }

    #[test]
    fn static_threshold_passes_through_unclamped() {
        let config = builder_config(false, false);
        let builder = TreeBuilder::new(&config, &[]);
        assert_eq!(builder.branch_threshold(50), 3);
        let config = Config {
            child_branch_threshold: 1,
            ..builder_config(false, false)
        };
        let builder = TreeBuilder::new(&config, &[]);
        assert_eq!(builder.branch_threshold(50), 1);
    }

    #[test]
    fn dynamic_threshold_is_clamped() {
        let config = builder_config(true, false);
        let builder = TreeBuilder::new(&config, &[]);
        // ln(2) * 2.0 ≈ 1.39 → clamped up to 2.
        assert_eq!(builder.branch_threshold(2), 2);
        // ln(1000) * 2.0 ≈ 13.8 → clamped down to 10.
        assert_eq!(builder.branch_threshold(1000), 10);
    }

    #[test]
    fn statistical_threshold_adjusts_by_size() {
        let config = builder_config(true, true);
        let builder = TreeBuilder::new(&config, &[]);
        // Small sets get the 1.5 multiplier: ln(8) * 2.0 * 1.5 ≈ 6.2.
        assert_eq!(builder.branch_threshold(8), 6);
        // Large sets switch to sqrt scaling and hit the upper clamp.
        assert_eq!(builder.branch_threshold(150), 10);
    }

    #[test]
    fn statistical_threshold_smooths_the_mid_range() {
        let config = builder_config(true, true);
        let builder = TreeBuilder::new(&config, &[]);
        // At 50 the sigmoid sits at 0.5, so the factor is exactly 1:
        // ln(50) * 2.0 ≈ 7.8.
        assert_eq!(builder.branch_threshold(50), 7);
        // Below the midpoint the smoothing pulls the threshold down:
        // ln(30) * 2.0 * 0.90 ≈ 6.1.
        assert_eq!(builder.branch_threshold(30), 6);
    }
}
