use crate::config::Config;
use crate::types::{LogGroup, LogMessage, LogPattern, PatternKey, Word, WordCombination};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Buckets logs by token count, selects each log's Longest Common Pattern
/// and co-locates logs sharing `(token_count, LCP)`. Groups come back
/// ordered by first member so downstream processing is deterministic.
pub fn create_initial_groups(logs: &[LogMessage], config: &Config) -> Vec<LogGroup> {
    let mut by_length: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for log in logs {
        by_length.entry(log.words.len()).or_default().push(log.id);
    }

    let mut groups: AHashMap<PatternKey, LogGroup> = AHashMap::new();
    for (token_count, ids) in by_length {
        for id in ids {
            let lcp = find_longest_word_combination(&logs[id], config);
            let key = PatternKey::new(token_count, &lcp);
            groups
                .entry(key)
                .or_insert_with(|| LogGroup {
                    pattern: LogPattern {
                        frequency: lcp.frequency,
                        words: lcp.words.clone(),
                    },
                    logs: Vec::new(),
                })
                .logs
                .push(id);
        }
    }

    let mut out: Vec<LogGroup> = groups.into_values().collect();
    out.sort_by_key(|group| group.logs[0]);
    out
}

/// Selects the log's LCP: the frequency level with the most words, subject
/// to the `max_freq × weight` threshold, with the two-frequency special
/// case from the paper.
pub fn find_longest_word_combination(log: &LogMessage, config: &Config) -> WordCombination {
    let mut by_freq: BTreeMap<usize, Vec<Word>> = BTreeMap::new();
    for word in &log.words {
        by_freq.entry(word.frequency).or_default().push(word.clone());
    }

    if by_freq.is_empty() {
        return WordCombination {
            frequency: 0,
            words: Vec::new(),
        };
    }

    // Logs with exactly two frequency levels often carry their constants at
    // the lower level; detect that by looking for variable-like shapes.
    if by_freq.len() == 2 && has_two_frequency_variables(&by_freq) {
        return select_constant_combination(&by_freq);
    }

    let max_frequency = by_freq.keys().next_back().copied().unwrap_or(0);
    let frequency_threshold = max_frequency as f64 * config.weight;

    let mut best: Option<WordCombination> = None;
    let mut max_len = 0;
    let mut max_token_len = 0;

    // Descending frequency order makes the tie-breaks deterministic: more
    // frequent levels win when word count and token length are equal.
    for (&frequency, words) in by_freq.iter().rev() {
        if (frequency as f64) < frequency_threshold {
            continue;
        }
        let token_len: usize = words.iter().map(|w| w.value.as_str().len()).sum();
        if words.len() > max_len || (words.len() == max_len && token_len > max_token_len) {
            max_len = words.len();
            max_token_len = token_len;
            best = Some(WordCombination {
                frequency,
                words: words.clone(),
            });
        }
    }

    // Only possible with weight > 0: nothing passed, take the top level.
    best.unwrap_or_else(|| {
        let (&frequency, words) = by_freq.iter().next_back().expect("non-empty levels");
        WordCombination {
            frequency,
            words: words.clone(),
        }
    })
}

static RE_PURE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("pattern"));
static RE_DOTTED_QUAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").expect("pattern"));
static RE_ID_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z]+_?\d+$").expect("pattern"));
static RE_NUMBER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\s+\d+\s+\d+\s+\d+$").expect("pattern"));

fn has_two_frequency_variables(by_freq: &BTreeMap<usize, Vec<Word>>) -> bool {
    by_freq.values().any(|words| has_variable_patterns(words))
}

/// More than half the words at this level look like variables.
fn has_variable_patterns(words: &[Word]) -> bool {
    let variable_count = words
        .iter()
        .filter(|w| {
            let v = w.value.as_str();
            RE_PURE_NUMBER.is_match(v)
                || RE_DOTTED_QUAD.is_match(v)
                || RE_ID_SHAPE.is_match(v)
                || RE_NUMBER_RUN.is_match(v)
        })
        .count();
    variable_count as f64 / words.len() as f64 > 0.5
}

/// Picks the level more likely to hold constants: lowest frequency first,
/// skipping levels that look variable.
fn select_constant_combination(by_freq: &BTreeMap<usize, Vec<Word>>) -> WordCombination {
    for (&frequency, words) in by_freq {
        if !has_variable_patterns(words) {
            return WordCombination {
                frequency,
                words: words.clone(),
            };
        }
    }
    let (&frequency, words) = by_freq.iter().next().expect("two levels");
    WordCombination {
        frequency,
        words: words.clone(),
    }
}
