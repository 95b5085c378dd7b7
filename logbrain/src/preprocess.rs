use crate::config::ConfigError;
use crate::intern::Interner;
use crate::postprocess::is_numeric_heavy;
use crate::types::{LogMessage, TokenValue, Word, WILDCARD};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

// Placeholders that keep a datetime together through tokenization.
const DT_SPACE: &str = "_DTSPACE_";
const DT_COLON: &str = "_DTCOLON_";
const DT_COMMA: &str = "_DTCOMMA_";
const DT_EQUAL: &str = "_DTEQUAL_";

/// Datetime shapes protected before tokenization, most specific first.
static DATETIME_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // [31-Jul-2025 01:17:58]
        r"\[\d{1,2}-[A-Z][a-z]{2}-\d{4} \d{2}:\d{2}:\d{2}\]",
        // 2024-01-15 10:30:15.123
        r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d{3}",
        // 2024-01-15 10:30:15
        r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}",
        // 15/01/2024 10:30:15 (covers both day-first and month-first)
        r"\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2}",
        // 2025/07/31 01:17:58
        r"\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}",
        // Jan 15 10:30:15
        r"[A-Z][a-z]{2} +\d{1,2} +\d{2}:\d{2}:\d{2}",
        // Jan 15 2024 10:30:15
        r"[A-Z][a-z]{2} +\d{1,2} +\d{4} +\d{2}:\d{2}:\d{2}",
        // 15/Jan/2024 10:30:15
        r"\d{1,2}/[A-Z][a-z]{2}/\d{4} \d{2}:\d{2}:\d{2}",
        // 15.01.2024 10:30:15
        r"\d{2}\.\d{2}\.\d{4} \d{2}:\d{2}:\d{2}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("datetime pattern"))
    .collect()
});

/// Tokenization and masking front end. Compiled once per engine and reused
/// for every parse, including reparse passes.
#[derive(Debug)]
pub struct Preprocessor {
    delimiters: Regex,
    common_variables: Vec<(String, Regex)>,
}

impl Preprocessor {
    pub fn new(
        delimiters: &str,
        common_variables: &[(String, String)],
    ) -> Result<Self, ConfigError> {
        let delimiters = Regex::new(delimiters).map_err(|source| ConfigError::InvalidDelimiters {
            pattern: delimiters.to_string(),
            source,
        })?;
        let common_variables = common_variables
            .iter()
            .map(|(name, pattern)| {
                Regex::new(pattern)
                    .map(|re| (name.clone(), re))
                    .map_err(|source| ConfigError::InvalidCommonVariable {
                        name: name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Preprocessor {
            delimiters,
            common_variables,
        })
    }

    /// Turns raw lines into `LogMessage`s in input order. Frequencies are
    /// counted over the pre-masking surface forms, so two logs that shared
    /// a value keep sharing its frequency after both are masked.
    pub fn preprocess_logs(&self, lines: &[&str]) -> Vec<LogMessage> {
        let mut interner = Interner::default();
        let mut frequencies: AHashMap<Arc<str>, usize> = AHashMap::new();
        let mut raw_logs: Vec<Vec<Arc<str>>> = Vec::with_capacity(lines.len());

        for line in lines {
            let protected = protect_datetimes(line);
            let words = self.split_tokens(&protected, &mut interner);
            for word in &words {
                *frequencies.entry(Arc::clone(word)).or_insert(0) += 1;
            }
            raw_logs.push(words);
        }

        // Masking depends only on the surface form, so decide once per
        // distinct word.
        let mut masked: AHashMap<Arc<str>, TokenValue> = AHashMap::new();

        raw_logs
            .into_iter()
            .enumerate()
            .map(|(id, raw_words)| {
                let words = raw_words
                    .iter()
                    .enumerate()
                    .map(|(position, raw)| Word {
                        value: masked
                            .entry(Arc::clone(raw))
                            .or_insert_with(|| self.mask_token(raw))
                            .clone(),
                        position,
                        frequency: frequencies[raw],
                    })
                    .collect();
                LogMessage {
                    id,
                    content: lines[id].to_string(),
                    words,
                }
            })
            .collect()
    }

    /// Normalizes delimiters to spaces, splits on whitespace runs and
    /// restores protected datetime characters.
    fn split_tokens(&self, line: &str, interner: &mut Interner) -> Vec<Arc<str>> {
        let normalized = self.delimiters.replace_all(line, " ");
        normalized
            .split_whitespace()
            .map(|token| {
                if token.contains("_DT") {
                    let restored = token
                        .replace(DT_SPACE, " ")
                        .replace(DT_COLON, ":")
                        .replace(DT_COMMA, ",")
                        .replace(DT_EQUAL, "=");
                    interner.intern(&restored)
                } else {
                    interner.intern(token)
                }
            })
            .collect()
    }

    fn mask_token(&self, raw: &Arc<str>) -> TokenValue {
        if raw.as_ref() == WILDCARD {
            return TokenValue::Wildcard;
        }

        let mut best: Option<&Regex> = None;
        for (_, re) in &self.common_variables {
            if re.is_match(raw) {
                best = match best {
                    Some(current) if !is_better_match(re, current, raw) => Some(current),
                    _ => Some(re),
                };
            }
        }
        if best.is_some() {
            return TokenValue::Wildcard;
        }

        if is_numeric_heavy(raw) {
            return TokenValue::Wildcard;
        }

        TokenValue::Text(Arc::clone(raw))
    }
}

/// Rewrites delimiter characters inside recognized datetimes so they survive
/// tokenization as one token.
fn protect_datetimes(line: &str) -> String {
    let mut result = line.to_string();
    for re in DATETIME_PATTERNS.iter() {
        if re.is_match(&result) {
            result = re
                .replace_all(&result, |caps: &regex::Captures| {
                    caps[0]
                        .replace(' ', DT_SPACE)
                        .replace(':', DT_COLON)
                        .replace(',', DT_COMMA)
                        .replace('=', DT_EQUAL)
                })
                .into_owned();
        }
    }
    result
}

/// Decides whether `new` is a more specific match than `current` for the
/// token: higher weighted literal count wins, then longer actual match,
/// then longer pattern string.
fn is_better_match(new: &Regex, current: &Regex, word: &str) -> bool {
    let new_specificity = count_specific_chars(new.as_str());
    let current_specificity = count_specific_chars(current.as_str());
    if new_specificity > current_specificity {
        return true;
    }
    if new_specificity == current_specificity {
        let new_len = new.find(word).map_or(0, |m| m.as_str().len());
        let current_len = current.find(word).map_or(0, |m| m.as_str().len());
        if new_len > current_len {
            return true;
        }
        if new_len == current_len && new.as_str().len() > current.as_str().len() {
            return true;
        }
    }
    false
}

/// Counts literal characters in a pattern. Datetime separators weigh double
/// since they pin down a concrete format.
fn count_specific_chars(pattern: &str) -> usize {
    let mut count = 0;
    let mut escaped = false;
    for ch in pattern.chars() {
        if escaped {
            count += 1;
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '^' | '$' | '.' | '*' | '+' | '?' | '[' | ']' | '(' | ')' | '{' | '}' | '|' => {}
            '-' | ':' | '/' | ' ' | 'T' | 'Z' => count += 2,
            c if c.is_ascii_alphabetic() => count += 1,
            _ => {}
        }
    }
    count
}
