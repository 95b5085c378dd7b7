use thiserror::Error;

/// Configuration of the Brain mining engine. All regexes are compiled once
/// at `BrainParser::new`; invalid patterns and out-of-range numeric bounds
/// are rejected there.
#[derive(Debug, Clone)]
pub struct Config {
    /// Regex whose matches are replaced by a single space before splitting.
    pub delimiters: String,
    /// Named full-token patterns masked to `<*>` during preprocessing.
    /// Evaluated in order; overlapping matches are resolved by specificity.
    pub common_variables: Vec<(String, String)>,
    /// Static branch threshold for the child direction.
    pub child_branch_threshold: usize,
    /// Frequency-threshold weight for LCP selection, in `[0, 1]`.
    pub weight: f64,
    /// Derive the branch threshold from the distinct-value count instead of
    /// using `child_branch_threshold`.
    pub use_dynamic_threshold: bool,
    pub dynamic_threshold_factor: f64,
    /// Statistical refinement of the dynamic threshold (small/large dataset
    /// adjustments plus sigmoid smoothing).
    pub use_statistical_threshold: bool,
    /// Re-examine generated template tokens with the extended heuristic set
    /// (entropy, hash, base64, timestamp shape) and reparse low-quality
    /// templates under relaxed settings.
    pub use_enhanced_post_processing: bool,
    /// Minimum group size that switches group processing to a thread pool.
    pub parallel_processing_threshold: usize,

    // Enhanced-mode tuning.
    pub entropy_threshold: f64,
    pub min_entropy_length: usize,
    /// Longest allowed run of consecutive `<*>` tokens; 0 disables the check.
    pub max_consecutive_wildcards: usize,
    pub min_content_words_ratio: f64,
    pub timestamp_min_digits: usize,
    pub timestamp_min_separators: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            delimiters: r"[\s,:=]".to_string(),
            common_variables: default_common_variables(),
            child_branch_threshold: 3,
            weight: 0.0,
            use_dynamic_threshold: false,
            dynamic_threshold_factor: 2.0,
            use_statistical_threshold: false,
            use_enhanced_post_processing: false,
            parallel_processing_threshold: 1000,
            entropy_threshold: 0.85,
            min_entropy_length: 10,
            max_consecutive_wildcards: 5,
            min_content_words_ratio: 0.25,
            timestamp_min_digits: 8,
            timestamp_min_separators: 2,
        }
    }
}

impl Config {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.weight) {
            return Err(ConfigError::OutOfRange {
                option: "weight",
                value: self.weight,
            });
        }
        if !(0.0..=1.0).contains(&self.min_content_words_ratio) {
            return Err(ConfigError::OutOfRange {
                option: "min_content_words_ratio",
                value: self.min_content_words_ratio,
            });
        }
        if !(0.0..=1.0).contains(&self.entropy_threshold) {
            return Err(ConfigError::OutOfRange {
                option: "entropy_threshold",
                value: self.entropy_threshold,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid delimiter pattern `{pattern}`: {source}")]
    InvalidDelimiters {
        pattern: String,
        source: regex::Error,
    },
    #[error("invalid pattern for common variable `{name}`: {source}")]
    InvalidCommonVariable {
        name: String,
        source: regex::Error,
    },
    #[error("{option} must lie within [0, 1], got {value}")]
    OutOfRange { option: &'static str, value: f64 },
}

/// Built-in patterns for tokens that are almost always variables. Anchored
/// to the full token; ordered most specific first so the specificity
/// tie-break rarely has to arbitrate.
pub fn default_common_variables() -> Vec<(String, String)> {
    [
        // Full datetime shapes.
        ("iso_datetime_with_ms", r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z?$"),
        ("iso_datetime", r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z?$"),
        ("iso_datetime_space", r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(\.\d{3})?$"),
        ("european_datetime", r"^\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2}$"),
        ("us_datetime", r"^\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2}$"),
        ("syslog_datetime", r"^[A-Z][a-z]{2} \d{1,2} \d{2}:\d{2}:\d{2}$"),
        // Date-only shapes.
        ("iso_date", r"^\d{4}-\d{2}-\d{2}$"),
        ("european_date", r"^\d{2}/\d{2}/\d{4}$"),
        ("us_date", r"^\d{2}/\d{2}/\d{4}$"),
        ("date_with_dots", r"^\d{2}\.\d{2}\.\d{4}$"),
        ("date_with_slashes", r"^\d{4}/\d{2}/\d{2}$"),
        ("date_with_month_name", r"^\d{1,2}-[A-Z][a-z]{2}-\d{4}$"),
        // Time-only shapes.
        ("time_with_seconds", r"^\d{2}:\d{2}:\d{2}$"),
        ("time_with_ms", r"^\d{2}:\d{2}:\d{2}\.\d{3}$"),
        ("time_simple", r"^\d{2}:\d{2}$"),
        // Unix timestamps.
        ("unix_timestamp_ms", r"^\d{13}$"),
        ("unix_timestamp", r"^\d{10}$"),
        // Network shapes.
        ("ipv4_address", r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$"),
        ("ipv4_port", r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}:\d+$"),
        ("ipv6_address", r"^([0-9a-fA-F]{0,4}:){7}[0-9a-fA-F]{0,4}$"),
        ("mac_address", r"^([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})$"),
        ("hostname_port", r"^[a-zA-Z0-9.-]+:\d+$"),
        // Files and sizes.
        ("file_sizes", r"^\d+[KMGT]?B$"),
        ("unix_path", r"^(/[a-zA-Z0-9._-]+)+/?$"),
        ("windows_path", r#"^[A-Za-z]:\\(\\[^\\/:*?"<>|]+)*\\?$"#),
        ("filename_ext", r"^[a-zA-Z0-9._-]+\.[a-zA-Z]{2,4}$"),
        // Web and mail.
        ("url", r"^https?://[^\s]+$"),
        ("email", r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"),
        // Identifiers and special numbers.
        ("hex_numbers", r"^0x[a-fA-F0-9]+$"),
        (
            "uuid",
            r"^[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12}$",
        ),
        ("block_ids", r"^blk_[-]?\d+$"),
        ("session_id", r"^[a-zA-Z0-9]{16,}$"),
        ("version", r"^v?\d+\.\d+(\.\d+)?(-[a-zA-Z0-9._-]+)?$"),
        ("percentages", r"^\d{1,3}%$"),
        ("memory_addr", r"^0x[0-9a-fA-F]+$"),
        // Datetime fragments that survive tokenization.
        (
            "month_names",
            r"^(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)$",
        ),
        ("bracket_date", r"^\[\d{1,2}-[A-Z][a-z]{2}-\d{4}$"),
        ("bracket_time", r"^\d{2}:\d{2}:\d{2}\]$"),
        (
            "bracket_datetime_full",
            r"^\[\d{1,2}-[A-Z][a-z]{2}-\d{4} \d{2}:\d{2}:\d{2}\]$",
        ),
        // Pure numbers last: least specific, catches the rest.
        ("pure_numbers", r"^\d+$"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name.to_string(), pattern.to_string()))
    .collect()
}
