use crate::config::Config;
use ahash::AHashMap;

/// Protocol and format names that look mixed but are constants.
const PROTOCOL_NAMES: [&str; 9] = [
    "HTTP", "HTTPS", "SOCKS5", "FTP", "SSH", "TCP", "UDP", "IPV4", "IPV6",
];

/// Re-examines constant tokens of generated templates and decides whether
/// they should have been variables. The standard checks always run; the
/// enhanced set is enabled per config and tuned by its thresholds.
#[derive(Debug, Clone)]
pub struct VariableDetector {
    enhanced: bool,
    entropy_threshold: f64,
    min_entropy_length: usize,
    timestamp_min_digits: usize,
    timestamp_min_separators: usize,
}

impl VariableDetector {
    pub fn from_config(config: &Config) -> Self {
        VariableDetector {
            enhanced: config.use_enhanced_post_processing,
            entropy_threshold: config.entropy_threshold,
            min_entropy_length: config.min_entropy_length,
            timestamp_min_digits: config.timestamp_min_digits,
            timestamp_min_separators: config.timestamp_min_separators,
        }
    }

    /// Disjunction over the heuristic predicates.
    pub fn is_variable(&self, word: &str) -> bool {
        if is_numeric_heavy(word) || contains_mixed_patterns(word) {
            return true;
        }
        if !self.enhanced {
            return false;
        }
        has_complex_pattern(word)
            || self.looks_like_timestamp(word)
            || looks_like_hash(word)
            || looks_like_encoded(word)
            || self.has_high_entropy(word)
    }

    /// Mostly digits with a few `:-/.` separators, e.g. split datetimes
    /// that slipped past the masking patterns.
    fn looks_like_timestamp(&self, word: &str) -> bool {
        let mut digits = 0;
        let mut separators = 0;
        for ch in word.chars() {
            if ch.is_ascii_digit() {
                digits += 1;
            } else if matches!(ch, ':' | '-' | '/' | '.') {
                separators += 1;
            }
        }
        digits >= self.timestamp_min_digits && separators >= self.timestamp_min_separators
    }

    /// Shannon entropy of the character distribution, normalized by word
    /// length. Random identifiers score close to 1.
    fn has_high_entropy(&self, word: &str) -> bool {
        if word.len() < self.min_entropy_length {
            return false;
        }
        let mut freq: AHashMap<char, usize> = AHashMap::new();
        for ch in word.chars() {
            *freq.entry(ch).or_insert(0) += 1;
        }
        let len = word.len() as f64;
        let entropy: f64 = freq
            .values()
            .map(|&count| {
                let p = count as f64 / len;
                -p * p.log2()
            })
            .sum();
        entropy / len.log2() > self.entropy_threshold
    }
}

/// Tokens whose characters are at least 30% ASCII digits are treated as
/// variables. Also used as the masking fallback during preprocessing.
pub(crate) fn is_numeric_heavy(word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let digits = word.chars().filter(char::is_ascii_digit).count();
    digits as f64 / word.len() as f64 >= 0.3
}

/// Mixed letter/digit/separator tokens such as `user_123` or `id-456`.
fn contains_mixed_patterns(word: &str) -> bool {
    if word.len() < 3 {
        return false;
    }
    if PROTOCOL_NAMES.contains(&word.to_ascii_uppercase().as_str()) {
        return false;
    }

    let mut letters = 0;
    let mut digits = 0;
    let mut has_special = false;
    for ch in word.chars() {
        if ch.is_ascii_alphabetic() {
            letters += 1;
        } else if ch.is_ascii_digit() {
            digits += 1;
        } else if matches!(ch, '_' | '-' | '.' | ':' | '/') {
            has_special = true;
        }
    }

    // A trailing single digit on a word (like SOCKS5) is a constant shape.
    if letters > digits * 2 && digits <= 1 {
        return false;
    }

    let kinds = (letters > 0) as usize + (digits > 0) as usize + has_special as usize;
    kinds >= 2 && digits > 1
}

/// Three or more transitions between letters, digits and separators.
fn has_complex_pattern(word: &str) -> bool {
    if word.len() < 4 {
        return false;
    }
    let mut transitions = 0;
    let mut prev = 0u8;
    for ch in word.chars() {
        let curr = if ch.is_ascii_alphabetic() {
            1
        } else if ch.is_ascii_digit() {
            2
        } else if matches!(ch, '_' | '-' | '.') {
            3
        } else {
            0
        };
        if prev != 0 && curr != 0 && prev != curr {
            transitions += 1;
        }
        prev = curr;
    }
    transitions >= 3
}

/// Long tokens made almost entirely of hex characters.
fn looks_like_hash(word: &str) -> bool {
    if word.len() < 8 {
        return false;
    }
    let hex = word.chars().filter(char::is_ascii_hexdigit).count();
    hex as f64 / word.len() as f64 > 0.8 && word.len() >= 16
}

/// Base64-looking payloads: full base64 charset with `=` padding, or long
/// tokens with unusually diverse characters.
fn looks_like_encoded(word: &str) -> bool {
    if word.len() < 8 {
        return false;
    }
    let valid = word
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
        .count();
    let base64_like = valid as f64 / word.len() as f64 > 0.95 && word.ends_with('=');

    let mut unique: Vec<char> = word.chars().collect();
    unique.sort_unstable();
    unique.dedup();
    let high_diversity = unique.len() as f64 / word.len() as f64 > 0.6;

    base64_like || (word.len() >= 16 && high_diversity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enhanced_detector() -> VariableDetector {
        let config = Config {
            use_enhanced_post_processing: true,
            ..Config::default()
        };
        VariableDetector::from_config(&config)
    }

    #[test]
    fn numeric_heavy_ratio_boundary() {
        assert!(is_numeric_heavy("user123"));
        assert!(is_numeric_heavy("12345"));
        assert!(is_numeric_heavy("v1"));
        assert!(!is_numeric_heavy("log1"));
        assert!(!is_numeric_heavy("username"));
        assert!(!is_numeric_heavy(""));
    }

    #[test]
    fn mixed_patterns_spare_protocol_names() {
        assert!(contains_mixed_patterns("user_123"));
        assert!(contains_mixed_patterns("id-456"));
        assert!(!contains_mixed_patterns("SOCKS5"));
        assert!(!contains_mixed_patterns("https"));
        assert!(!contains_mixed_patterns("ok"));
    }

    #[test]
    fn hash_and_encoded_shapes() {
        assert!(looks_like_hash("a1b2c3d4e5f6789012345678901234567890abcd"));
        assert!(!looks_like_hash("deadbeef"));
        assert!(looks_like_encoded("YXNkZmFzZGZhc2RmYXNkZmFzZGY="));
        assert!(!looks_like_encoded("started"));
    }

    #[test]
    fn entropy_flags_random_identifiers() {
        let detector = enhanced_detector();
        assert!(detector.is_variable("abcdefghijk"));
        assert!(!detector.is_variable("aaaaaaaaaaaa"));
        assert!(!detector.is_variable("short"));
    }

    #[test]
    fn timestamp_shape_respects_tuning() {
        let detector = enhanced_detector();
        assert!(detector.is_variable("2023-01-15-10:30"));
        let relaxed = VariableDetector {
            timestamp_min_digits: 14,
            ..enhanced_detector()
        };
        assert!(!relaxed.looks_like_timestamp("2023-01-15-10:30"));
    }

    #[test]
    fn standard_mode_skips_enhanced_checks() {
        let detector = VariableDetector::from_config(&Config::default());
        assert!(!detector.is_variable("abcdefghijk"));
        assert!(detector.is_variable("user123"));
    }
}
