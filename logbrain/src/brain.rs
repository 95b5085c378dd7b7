use crate::config::{Config, ConfigError};
use crate::grouping::create_initial_groups;
use crate::preprocess::Preprocessor;
use crate::quality::QualityFilter;
use crate::template::TemplateExtractor;
use crate::tree::TreeBuilder;
use crate::types::{LogGroup, LogMessage, ParseResult};
use ahash::AHashMap;
use rayon::prelude::*;

/// The Brain mining engine. Construction compiles every configured regex;
/// parsing is total and never errors on log content.
pub struct BrainParser {
    config: Config,
    preprocessor: Preprocessor,
}

impl BrainParser {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let preprocessor = Preprocessor::new(&config.delimiters, &config.common_variables)?;
        Ok(BrainParser {
            config,
            preprocessor,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Mines templates from a batch of raw log lines. Returns one entry per
    /// distinct template, sorted by count descending; every input line is
    /// accounted for by exactly one entry.
    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> Vec<ParseResult> {
        let line_refs: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
        aggregate_results(self.run(&line_refs, &self.config, false))
    }

    /// Full pipeline over `lines` under `config`. `reparse` marks derived
    /// runs so they can never trigger another reparse.
    fn run(&self, lines: &[&str], config: &Config, reparse: bool) -> Vec<ParseResult> {
        if lines.is_empty() {
            return Vec::new();
        }
        let logs = self.preprocessor.preprocess_logs(lines);
        let groups = create_initial_groups(&logs, config);

        let any_large = groups
            .iter()
            .any(|g| g.logs.len() >= config.parallel_processing_threshold);
        if any_large {
            self.process_groups_parallel(&groups, &logs, config, reparse)
        } else {
            groups
                .iter()
                .flat_map(|group| self.process_group(group, &logs, config, reparse))
                .collect()
        }
    }

    /// Tree building and extraction are independent per group; fan out on a
    /// pool sized by the number of large groups. Collecting by group index
    /// keeps the output order identical to the sequential path.
    fn process_groups_parallel(
        &self,
        groups: &[LogGroup],
        logs: &[LogMessage],
        config: &Config,
        reparse: bool,
    ) -> Vec<ParseResult> {
        let large_groups = groups
            .iter()
            .filter(|g| g.logs.len() >= config.parallel_processing_threshold)
            .count();
        let workers = large_groups.min(8).max(2);

        let per_group: Vec<Vec<ParseResult>> =
            match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(|| {
                    groups
                        .par_iter()
                        .map(|group| self.process_group(group, logs, config, reparse))
                        .collect()
                }),
                Err(_) => groups
                    .iter()
                    .map(|group| self.process_group(group, logs, config, reparse))
                    .collect(),
            };
        per_group.into_iter().flatten().collect()
    }

    fn process_group(
        &self,
        group: &LogGroup,
        logs: &[LogMessage],
        config: &Config,
        reparse: bool,
    ) -> Vec<ParseResult> {
        let tree = TreeBuilder::new(config, logs).build(group);
        let results = TemplateExtractor::new(config).extract(&tree);

        if !config.use_enhanced_post_processing || reparse {
            return results;
        }

        let (mut good, bad) = QualityFilter::from_config(config).partition(results);
        if !bad.is_empty() {
            good.extend(self.reparse_with_relaxed_settings(bad, logs, config));
        }
        good
    }

    /// Reparses the logs behind low-quality templates under progressively
    /// relaxed settings. Levels 1 and 2 keep only quality survivors; level 3
    /// (plain Brain) accepts whatever comes back. When nothing improves the
    /// original bad results are returned unchanged.
    fn reparse_with_relaxed_settings(
        &self,
        bad: Vec<ParseResult>,
        logs: &[LogMessage],
        config: &Config,
    ) -> Vec<ParseResult> {
        let mut remaining: Vec<usize> = Vec::new();
        let mut seen = vec![false; logs.len()];
        for result in &bad {
            for &id in &result.log_ids {
                if id < logs.len() && !seen[id] {
                    seen[id] = true;
                    remaining.push(id);
                }
            }
        }
        if remaining.is_empty() {
            return bad;
        }

        let mut recovered: Vec<ParseResult> = Vec::new();

        let relaxed = Config {
            entropy_threshold: 0.95,
            min_entropy_length: 15,
            timestamp_min_digits: 10,
            ..config.clone()
        };
        self.reparse_level(&mut remaining, &relaxed, true, logs, &mut recovered);

        if !remaining.is_empty() {
            let no_enhanced = Config {
                use_enhanced_post_processing: false,
                ..config.clone()
            };
            self.reparse_level(&mut remaining, &no_enhanced, true, logs, &mut recovered);
        }

        if !remaining.is_empty() {
            let original = Config {
                use_enhanced_post_processing: false,
                use_statistical_threshold: false,
                ..config.clone()
            };
            self.reparse_level(&mut remaining, &original, false, logs, &mut recovered);
        }

        if recovered.is_empty() {
            bad
        } else {
            recovered
        }
    }

    /// One relaxation level: reparse the remaining logs, translate the
    /// sub-run's log ids back to batch ids, keep accepted results and drop
    /// their logs from `remaining`.
    fn reparse_level(
        &self,
        remaining: &mut Vec<usize>,
        config: &Config,
        filter: bool,
        logs: &[LogMessage],
        recovered: &mut Vec<ParseResult>,
    ) {
        let lines: Vec<&str> = remaining.iter().map(|&id| logs[id].content.as_str()).collect();
        let results = aggregate_results(self.run(&lines, config, true));
        if results.is_empty() {
            return;
        }

        let accepted = if filter {
            QualityFilter::from_config(config).partition(results).0
        } else {
            results
        };
        if accepted.is_empty() {
            return;
        }

        let accepted: Vec<ParseResult> = accepted
            .into_iter()
            .map(|result| ParseResult {
                log_ids: result.log_ids.iter().map(|&i| remaining[i]).collect(),
                ..result
            })
            .collect();

        let mut processed = vec![false; logs.len()];
        for result in &accepted {
            for &id in &result.log_ids {
                processed[id] = true;
            }
        }
        remaining.retain(|&id| !processed[id]);
        recovered.extend(accepted);
    }
}

/// Merges duplicate templates: counts are summed and log-id lists
/// concatenated. Sorted by count descending, then template, so equal runs
/// produce byte-identical output.
pub(crate) fn aggregate_results(results: Vec<ParseResult>) -> Vec<ParseResult> {
    let mut merged: AHashMap<String, ParseResult> = AHashMap::new();
    for result in results {
        match merged.get_mut(&result.template) {
            Some(existing) => {
                existing.count += result.count;
                existing.log_ids.extend(result.log_ids);
            }
            None => {
                merged.insert(result.template.clone(), result);
            }
        }
    }

    let mut out: Vec<ParseResult> = merged.into_values().collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.template.cmp(&b.template)));
    out
}
