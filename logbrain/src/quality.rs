use crate::config::Config;
use crate::types::{ParseResult, WILDCARD};

/// Separates usable templates from over-generalized ones. A template fails
/// when wildcards run too long, content words are too sparse, or nothing
/// but wildcards is left.
#[derive(Debug, Clone)]
pub struct QualityFilter {
    max_consecutive_wildcards: usize,
    min_content_words_ratio: f64,
}

impl QualityFilter {
    pub fn from_config(config: &Config) -> Self {
        QualityFilter {
            max_consecutive_wildcards: config.max_consecutive_wildcards,
            min_content_words_ratio: config.min_content_words_ratio,
        }
    }

    pub fn is_quality(&self, template: &str) -> bool {
        let tokens: Vec<&str> = template.split_whitespace().collect();
        if tokens.is_empty() {
            return false;
        }

        let mut wildcards = 0;
        let mut content_words = 0;
        let mut longest_run = 0;
        let mut current_run = 0;
        for &token in &tokens {
            if token == WILDCARD {
                wildcards += 1;
                current_run += 1;
                longest_run = longest_run.max(current_run);
            } else {
                content_words += 1;
                current_run = 0;
            }
        }

        if self.max_consecutive_wildcards > 0 && longest_run > self.max_consecutive_wildcards {
            return false;
        }
        if (content_words as f64) / (tokens.len() as f64) < self.min_content_words_ratio {
            return false;
        }
        if wildcards == tokens.len() {
            return false;
        }
        true
    }

    /// Splits results into (good, bad) preserving order.
    pub fn partition(&self, results: Vec<ParseResult>) -> (Vec<ParseResult>, Vec<ParseResult>) {
        results
            .into_iter()
            .partition(|result| self.is_quality(&result.template))
    }
}
